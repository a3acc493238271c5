mod generational_tests;
