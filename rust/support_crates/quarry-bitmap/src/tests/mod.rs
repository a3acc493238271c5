mod int_set_tests;
