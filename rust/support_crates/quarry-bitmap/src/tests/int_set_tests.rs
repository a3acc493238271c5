use std::collections::BTreeSet;

use crate::IntSet;

fn random_keys(count: usize, max: u32) -> Vec<u32> {
    (0..count).map(|_| fastrand::u32(0..max)).collect()
}

#[test]
fn test_empty_is_shared_singleton() {
    let a = IntSet::empty();
    let b = IntSet::default();
    assert!(a.is_empty());
    assert_eq!(a.len(), 0);
    assert!(IntSet::ptr_eq(&a, &b));

    let c = IntSet::singleton(3).intersect(&IntSet::singleton(4));
    assert!(IntSet::ptr_eq(&a, &c));
    let d = IntSet::from_keys(std::iter::empty());
    assert!(IntSet::ptr_eq(&a, &d));
}

#[test]
fn test_from_keys_sorts_and_dedups() {
    let set = IntSet::from_keys([9, 1, 5, 1, 9, 0]);
    assert_eq!(set.to_vec(), vec![0, 1, 5, 9]);
    assert_eq!(set.len(), 4);
    assert_eq!(set.min(), Some(0));
    assert_eq!(set.max(), Some(9));
    assert!(set.contains(5));
    assert!(!set.contains(2));
}

#[test]
fn test_basic_ops() {
    let a: IntSet = [1, 2, 3, 10].into_iter().collect();
    let b: IntSet = [2, 3, 4].into_iter().collect();

    assert_eq!(a.union(&b).to_vec(), vec![1, 2, 3, 4, 10]);
    assert_eq!(a.intersect(&b).to_vec(), vec![2, 3]);
    assert_eq!(a.difference(&b).to_vec(), vec![1, 10]);
    assert_eq!(b.difference(&a).to_vec(), vec![4]);
    assert!(a.intersect(&b).is_subset(&a));

    // inputs untouched
    assert_eq!(a.to_vec(), vec![1, 2, 3, 10]);
    assert_eq!(b.to_vec(), vec![2, 3, 4]);
}

#[test]
fn test_union_with_empty_returns_same_instance() {
    let a = IntSet::from_keys([1, 2]);
    let u = a.union(&IntSet::empty());
    assert!(IntSet::ptr_eq(&a, &u));
    let u = IntSet::empty().union(&a);
    assert!(IntSet::ptr_eq(&a, &u));
    let d = a.difference(&IntSet::empty());
    assert!(IntSet::ptr_eq(&a, &d));
}

#[test]
fn test_union_all_and_intersect_all() {
    let sets = [
        IntSet::from_keys([1, 2, 3]),
        IntSet::empty(),
        IntSet::from_keys([3, 4]),
        IntSet::from_keys([3, 5]),
    ];
    assert_eq!(IntSet::union_all(&sets).to_vec(), vec![1, 2, 3, 4, 5]);
    assert!(IntSet::intersect_all(&sets).is_empty());
    assert_eq!(
        IntSet::intersect_all([&sets[0], &sets[2], &sets[3]]).to_vec(),
        vec![3]
    );
    assert!(IntSet::union_all(std::iter::empty()).is_empty());
    assert!(IntSet::intersect_all(std::iter::empty()).is_empty());

    let single = [IntSet::from_keys([7])];
    assert!(IntSet::ptr_eq(&IntSet::union_all(&single), &single[0]));
    assert!(IntSet::ptr_eq(&IntSet::intersect_all(&single), &single[0]));
}

#[test]
fn test_ops_match_btreeset_model() {
    for _ in 0..50 {
        let a_keys = random_keys(fastrand::usize(0..200), 500);
        let b_keys = random_keys(fastrand::usize(0..200), 500);
        let a = IntSet::from_keys(a_keys.iter().copied());
        let b = IntSet::from_keys(b_keys.iter().copied());
        let a_model: BTreeSet<u32> = a_keys.into_iter().collect();
        let b_model: BTreeSet<u32> = b_keys.into_iter().collect();

        assert_eq!(
            a.union(&b).to_vec(),
            a_model.union(&b_model).copied().collect::<Vec<_>>()
        );
        assert_eq!(
            a.intersect(&b).to_vec(),
            a_model.intersection(&b_model).copied().collect::<Vec<_>>()
        );
        assert_eq!(
            a.difference(&b).to_vec(),
            a_model.difference(&b_model).copied().collect::<Vec<_>>()
        );
        assert_eq!(a.len(), a_model.len() as u64);
    }
}

#[test]
fn test_content_hash_is_content_based() {
    let a = IntSet::from_keys([5, 1, 3]);
    let b = IntSet::from_keys([1, 3]).union(&IntSet::singleton(5));
    assert!(!IntSet::ptr_eq(&a, &b));
    assert_eq!(a, b);
    assert_eq!(a.content_hash(), b.content_hash());
    assert_ne!(a.content_hash(), IntSet::from_keys([1, 3]).content_hash());
    assert_ne!(IntSet::empty().content_hash(), IntSet::singleton(0).content_hash());
}

#[test]
fn test_debug_preview() {
    let small = IntSet::from_keys([1, 2]);
    assert_eq!(format!("{small:?}"), "[1, 2]");
    let large = IntSet::from_keys(0..20);
    assert!(format!("{large:?}").ends_with("... 4 more]"));
}
