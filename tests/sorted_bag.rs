use proptest::prelude::*;
use rank_tree::{Error, Rank, SortedBag};

/// The number of operations to perform in each proptest case.
const TEST_SIZE: usize = 800;

/// A narrow range so duplicates are common.
fn value_strategy() -> impl Strategy<Value = i32> {
    -50i32..50i32
}

/// Reference model: a sorted vector with stable order among equals.
fn model_insert(model: &mut Vec<i32>, key: i32) {
    let at = model.partition_point(|&probe| probe <= key);
    model.insert(at, key);
}

// ─── Operations enum for driving randomized tests ────────────────────────────

#[derive(Debug, Clone)]
enum BagOp {
    Insert(i32),
    InsertMany(i32, usize),
    Remove(i32),
    RemoveMany(i32, usize),
    RemoveAt(usize),
    PopFirst,
    PopLast,
}

fn bag_op_strategy() -> impl Strategy<Value = BagOp> {
    prop_oneof![
        6 => value_strategy().prop_map(BagOp::Insert),
        2 => (value_strategy(), 0usize..5).prop_map(|(key, count)| BagOp::InsertMany(key, count)),
        3 => value_strategy().prop_map(BagOp::Remove),
        2 => (value_strategy(), 0usize..5).prop_map(|(key, limit)| BagOp::RemoveMany(key, limit)),
        2 => any::<usize>().prop_map(BagOp::RemoveAt),
        1 => Just(BagOp::PopFirst),
        1 => Just(BagOp::PopLast),
    ]
}

// ─── Randomized model tests ──────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Replays random multiset operations against a sorted-vector model.
    #[test]
    fn bag_ops_match_sorted_model(
        order in prop_oneof![Just(4usize), Just(5), Just(6), Just(16)],
        ops in proptest::collection::vec(bag_op_strategy(), TEST_SIZE),
    ) {
        let mut bag: SortedBag<i32> = SortedBag::with_order(order).unwrap();
        let mut model: Vec<i32> = Vec::new();

        for op in &ops {
            match op {
                BagOp::Insert(key) => {
                    bag.insert(*key);
                    model_insert(&mut model, *key);
                }
                BagOp::InsertMany(key, count) => {
                    bag.insert_many(key, *count);
                    for _ in 0..*count {
                        model_insert(&mut model, *key);
                    }
                }
                BagOp::Remove(key) => {
                    let expected = model.iter().position(|probe| probe == key);
                    prop_assert_eq!(bag.remove(key), expected.is_some(), "remove({})", key);
                    if let Some(at) = expected {
                        model.remove(at);
                    }
                }
                BagOp::RemoveMany(key, limit) => {
                    let present = model.iter().filter(|probe| *probe == key).count();
                    let expected = present.min(*limit);
                    prop_assert_eq!(bag.remove_many(key, *limit), expected);
                    for _ in 0..expected {
                        let at = model.iter().position(|probe| probe == key).unwrap();
                        model.remove(at);
                    }
                }
                BagOp::RemoveAt(rank) => {
                    if model.is_empty() {
                        prop_assert!(bag.remove_at(0).is_err());
                    } else {
                        let rank = rank % model.len();
                        prop_assert_eq!(bag.remove_at(rank), Ok(model.remove(rank)));
                    }
                }
                BagOp::PopFirst => {
                    let expected = if model.is_empty() { None } else { Some(model.remove(0)) };
                    prop_assert_eq!(bag.pop_first(), expected);
                }
                BagOp::PopLast => {
                    prop_assert_eq!(bag.pop_last(), model.pop());
                }
            }
            prop_assert_eq!(bag.len(), model.len(), "len mismatch after {:?}", op);
        }

        let keys: Vec<i32> = bag.iter().copied().collect();
        prop_assert_eq!(keys, model);
    }

    /// Multiplicity bookkeeping matches the model.
    #[test]
    fn multiplicities_match_the_model(values in proptest::collection::vec(value_strategy(), 1..TEST_SIZE)) {
        let bag: SortedBag<i32> = values.iter().copied().collect();
        let mut model: Vec<i32> = values.clone();
        model.sort_unstable();

        for probe in -60i32..60 {
            let expected = model.iter().filter(|&&key| key == probe).count();
            prop_assert_eq!(bag.occurrences_of(&probe), expected, "occurrences_of({})", probe);
        }

        let mut distinct = model.clone();
        distinct.dedup();
        prop_assert_eq!(bag.distinct_len(), distinct.len());
        let listed: Vec<i32> = bag.distinct().copied().collect();
        prop_assert_eq!(listed, distinct);
    }

    /// Lower and upper ranks bracket every equal run.
    #[test]
    fn index_bounds_bracket_equal_runs(values in proptest::collection::vec(value_strategy(), 1..TEST_SIZE)) {
        let bag: SortedBag<i32> = values.iter().copied().collect();
        let mut model: Vec<i32> = values.clone();
        model.sort_unstable();

        for probe in -60i32..60 {
            let lower = model.partition_point(|&key| key < probe);
            let upper = model.partition_point(|&key| key <= probe);
            if lower == upper {
                prop_assert_eq!(bag.index_of(&probe), !(lower as isize));
                prop_assert_eq!(bag.index_of_upper(&probe), !(upper as isize));
            } else {
                prop_assert_eq!(bag.index_of(&probe), lower as isize);
                prop_assert_eq!(bag.index_of_upper(&probe), upper as isize);
                prop_assert_eq!(bag.element_at(lower), Ok(&probe));
                prop_assert_eq!(bag.element_at(upper - 1), Ok(&probe));
            }
        }
    }

    /// Forward and reverse enumerations are mirror images.
    #[test]
    fn reverse_mirrors_forward(values in proptest::collection::vec(value_strategy(), 0..TEST_SIZE)) {
        let bag: SortedBag<i32> = values.iter().copied().collect();
        let forward: Vec<i32> = bag.iter().copied().collect();
        let mut backward: Vec<i32> = bag.reverse().copied().collect();
        backward.reverse();
        prop_assert_eq!(forward, backward);
    }
}

// ─── Deterministic edge cases ────────────────────────────────────────────────

#[test]
fn stable_order_among_equal_keys() {
    // Two bags that only differ in insertion interleaving still agree on
    // multiset contents, and containment is by multiplicity.
    let mut a: SortedBag<i32> = SortedBag::with_order(4).unwrap();
    for key in [5, 1, 5, 3, 5, 1] {
        a.insert(key);
    }
    assert_eq!(a.occurrences_of(&5), 3);
    assert_eq!(a.occurrences_of(&1), 2);

    let mut b: SortedBag<i32> = SortedBag::with_order(4).unwrap();
    for key in [1, 5, 3] {
        b.insert(key);
    }
    assert!(a.contains_all(&b));
    assert!(!b.contains_all(&a));

    b.insert(7);
    assert!(!a.contains_all(&b));
}

#[test]
fn remove_takes_the_lowest_occurrence() {
    let mut bag: SortedBag<i32> = SortedBag::with_order(4).unwrap();
    bag.insert_many(&4, 3);
    bag.insert(2);
    assert!(bag.remove(&4));
    assert_eq!(bag.occurrences_of(&4), 2);
    assert_eq!(bag.index_of(&4), 1);
    assert_eq!(bag[Rank(0)], 2);
}

#[test]
fn empty_bag_edge_cases() {
    let bag: SortedBag<i32> = SortedBag::new();
    assert_eq!(bag.first(), Err(Error::Empty));
    assert_eq!(bag.last(), Err(Error::Empty));
    assert_eq!(bag.index_of(&1), !0);
    assert_eq!(bag.occurrences_of(&1), 0);
    assert_eq!(bag.distinct_len(), 0);
    assert_eq!(bag.element_at_or_default(0), 0);
}

#[test]
fn bulk_load_then_drain_at_minimum_order() {
    let mut bag: SortedBag<i32> = SortedBag::with_order(4).unwrap();
    for key in 0..1_000 {
        bag.insert(key % 100);
    }
    assert_eq!(bag.len(), 1_000);
    assert_eq!(bag.distinct_len(), 100);
    for key in 0..100 {
        assert_eq!(bag.remove_many(&key, usize::MAX), 10);
    }
    assert!(bag.is_empty());
    assert_eq!(bag.len(), 0);
}

#[test]
fn cursor_survives_a_full_reverse_walk() {
    let bag: SortedBag<i32> = (1..=100).collect();
    let mut cursor = bag.cursor_reversed();
    let mut seen = Vec::new();
    while cursor.move_next(&bag).unwrap() {
        seen.push(*cursor.current(&bag).unwrap());
    }
    let expected: Vec<i32> = (1..=100).rev().collect();
    assert_eq!(seen, expected);
    assert_eq!(cursor.move_next(&bag), Ok(false));
}
