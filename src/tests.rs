use std::ops::Range;

use proptest::prelude::*;
use rand::seq::SliceRandom;

use crate::model;
use crate::node::NodeIdx;

use super::*;

fn insert_find_all(keys: &[u32]) {
    let mut tree: AvlTree<u32, u32> = AvlTree::new();

    for &key in keys {
        tree.insert(key, key * 10);
        tree.assert_invariants();
    }

    assert_eq!(tree.len(), keys.len());

    for &key in keys {
        assert_eq!(tree.get(&key), Ok(&(key * 10)));
        assert!(tree.contains_key(&key));
    }
}

#[test]
fn zero_elems_find() {
    insert_find_all(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all(&[0]);
}

#[test]
fn two_elems_find() {
    insert_find_all(&[0, 1]);
    insert_find_all(&[1, 0]);
}

#[test]
fn three_elems_find() {
    insert_find_all(&[0, 1, 2]);
    insert_find_all(&[0, 2, 1]);
    insert_find_all(&[1, 0, 2]);
    insert_find_all(&[1, 2, 0]);
    insert_find_all(&[2, 0, 1]);
    insert_find_all(&[2, 1, 0]);
}

#[test]
fn four_elems_find() {
    insert_find_all(&[0, 1, 2, 3]);
    insert_find_all(&[0, 1, 3, 2]);
    insert_find_all(&[0, 2, 1, 3]);
    insert_find_all(&[0, 2, 3, 1]);
    insert_find_all(&[0, 3, 1, 2]);
    insert_find_all(&[0, 3, 2, 1]);

    insert_find_all(&[1, 0, 2, 3]);
    insert_find_all(&[1, 0, 3, 2]);
    insert_find_all(&[1, 2, 0, 3]);
    insert_find_all(&[1, 2, 3, 0]);
    insert_find_all(&[1, 3, 0, 2]);
    insert_find_all(&[1, 3, 2, 0]);

    insert_find_all(&[2, 0, 1, 3]);
    insert_find_all(&[2, 0, 3, 1]);
    insert_find_all(&[2, 1, 0, 3]);
    insert_find_all(&[2, 1, 3, 0]);
    insert_find_all(&[2, 3, 0, 1]);
    insert_find_all(&[2, 3, 1, 0]);

    insert_find_all(&[3, 0, 1, 2]);
    insert_find_all(&[3, 0, 2, 1]);
    insert_find_all(&[3, 1, 0, 2]);
    insert_find_all(&[3, 1, 2, 0]);
    insert_find_all(&[3, 2, 0, 1]);
    insert_find_all(&[3, 2, 1, 0]);
}

fn insert_remove_all(keys: &[u32]) {
    let mut tree: AvlTree<u32, u32> = AvlTree::new();

    for &key in keys {
        tree.insert(key, key);
        tree.assert_invariants();
    }

    for &key in keys {
        assert_eq!(tree.remove(&key), Some(key));
        tree.assert_invariants();
    }

    assert!(tree.is_empty());

    for &key in keys {
        tree.insert(key, key);
        tree.assert_invariants();
    }

    for &key in keys.iter().rev() {
        assert_eq!(tree.remove(&key), Some(key));
        tree.assert_invariants();
    }
}

#[test]
fn remove_one() {
    insert_remove_all(&[0]);
}

#[test]
fn remove_two() {
    insert_remove_all(&[0, 1]);
    insert_remove_all(&[1, 0]);
}

#[test]
fn remove_three() {
    insert_remove_all(&[0, 1, 2]);
    insert_remove_all(&[0, 2, 1]);
    insert_remove_all(&[1, 0, 2]);
    insert_remove_all(&[1, 2, 0]);
    insert_remove_all(&[2, 0, 1]);
    insert_remove_all(&[2, 1, 0]);
}

#[test]
fn remove_four() {
    insert_remove_all(&[0, 1, 2, 3]);
    insert_remove_all(&[0, 1, 3, 2]);
    insert_remove_all(&[0, 2, 1, 3]);
    insert_remove_all(&[0, 2, 3, 1]);
    insert_remove_all(&[0, 3, 1, 2]);
    insert_remove_all(&[0, 3, 2, 1]);

    insert_remove_all(&[1, 0, 2, 3]);
    insert_remove_all(&[1, 0, 3, 2]);
    insert_remove_all(&[1, 2, 0, 3]);
    insert_remove_all(&[1, 2, 3, 0]);
    insert_remove_all(&[1, 3, 0, 2]);
    insert_remove_all(&[1, 3, 2, 0]);

    insert_remove_all(&[2, 0, 1, 3]);
    insert_remove_all(&[2, 0, 3, 1]);
    insert_remove_all(&[2, 1, 0, 3]);
    insert_remove_all(&[2, 1, 3, 0]);
    insert_remove_all(&[2, 3, 0, 1]);
    insert_remove_all(&[2, 3, 1, 0]);

    insert_remove_all(&[3, 0, 1, 2]);
    insert_remove_all(&[3, 0, 2, 1]);
    insert_remove_all(&[3, 1, 0, 2]);
    insert_remove_all(&[3, 1, 2, 0]);
    insert_remove_all(&[3, 2, 0, 1]);
    insert_remove_all(&[3, 2, 1, 0]);
}

// Rotation shapes ============================================================

// Returns (key, height, parent key) triples from a pre-order walk, for
// asserting on exact tree shapes.
fn shape(tree: &AvlTree<u32, u32>) -> Vec<(u32, i8, Option<u32>)> {
    fn walk(tree: &AvlTree<u32, u32>, node: NodeIdx, out: &mut Vec<(u32, i8, Option<u32>)>) {
        let n = &tree.nodes[node];
        out.push((n.key, n.height, n.parent.map(|p| tree.nodes[p].key)));

        if let Some(left) = n.left() {
            walk(tree, left, out);
        }
        if let Some(right) = n.right() {
            walk(tree, right, out);
        }
    }

    let mut out = Vec::new();
    if let Some(root) = tree.root {
        walk(tree, root, &mut out);
    }
    out
}

#[test]
fn ascending_insert_single_rotation() {
    let mut tree = AvlTree::new();
    for key in [10, 20, 30] {
        tree.insert(key, key);
        tree.assert_invariants();
    }

    // 20 is rotated up to the root; 10 and 30 are its children.
    assert_eq!(
        shape(&tree),
        vec![(20, 1, None), (10, 0, Some(20)), (30, 0, Some(20))]
    );
}

#[test]
fn inner_insert_double_rotation() {
    let mut tree = AvlTree::new();
    for key in [30, 10, 20] {
        tree.insert(key, key);
        tree.assert_invariants();
    }

    // Right-left case; the final shape matches the single-rotation one.
    assert_eq!(
        shape(&tree),
        vec![(20, 1, None), (10, 0, Some(20)), (30, 0, Some(20))]
    );
}

#[test]
fn descending_insert_stays_balanced() {
    let mut tree = AvlTree::new();
    for key in [5, 4, 3, 2, 1] {
        tree.insert(key, key);
        tree.assert_invariants();
    }

    // A degenerate chain would have height 4.
    assert_eq!(tree.height(), 2);
}

#[test]
fn remove_root_with_two_children() {
    let mut tree = AvlTree::new();
    for key in [20, 10, 30] {
        tree.insert(key, key);
    }

    // The successor (30) moves into the root position; the right subtree
    // loses that node.
    assert_eq!(tree.remove(&20), Some(20));
    tree.assert_invariants();

    assert_eq!(shape(&tree), vec![(30, 1, None), (10, 0, Some(30))]);
}

// Operation semantics ========================================================

#[test]
fn get_on_empty_is_not_found() {
    let tree: AvlTree<u32, u32> = AvlTree::new();

    assert_eq!(tree.get(&42), Err(NotFound));
    assert_eq!(NotFound.to_string(), "key not found");
}

// A key whose ordering ignores `tag`, to make overwrite-on-duplicate
// observable: re-inserting must keep the key already in the map.
#[derive(Debug, Clone, Copy)]
struct TaggedKey {
    n: u32,
    tag: char,
}

impl PartialEq for TaggedKey {
    fn eq(&self, other: &TaggedKey) -> bool {
        self.n == other.n
    }
}

impl Eq for TaggedKey {}

impl PartialOrd for TaggedKey {
    fn partial_cmp(&self, other: &TaggedKey) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TaggedKey {
    fn cmp(&self, other: &TaggedKey) -> core::cmp::Ordering {
        self.n.cmp(&other.n)
    }
}

#[test]
fn insert_duplicate_overwrites_value_only() {
    let mut tree = AvlTree::new();

    for n in [2, 1, 3] {
        tree.insert(TaggedKey { n, tag: 'a' }, "old");
    }

    let cursor = tree.insert(TaggedKey { n: 2, tag: 'b' }, "new");
    assert_eq!(cursor.key().map(|k| k.tag), Some('a'));

    tree.assert_invariants();
    assert_eq!(tree.len(), 3);
    assert_eq!(tree.get(&TaggedKey { n: 2, tag: 'z' }), Ok(&"new"));

    // The stored key keeps its identity; only the value moved.
    let tags: Vec<char> = tree.iter().map(|(k, _)| k.tag).collect();
    assert_eq!(tags, vec!['a', 'a', 'a']);
}

#[test]
fn remove_absent_is_a_no_op() {
    let mut tree = AvlTree::new();
    tree.insert(1u32, 1u32);

    assert_eq!(tree.remove(&7), None);
    assert_eq!(tree.remove(&7), None);
    tree.assert_invariants();
    assert_eq!(tree.len(), 1);

    let mut empty: AvlTree<u32, u32> = AvlTree::new();
    assert_eq!(empty.remove(&7), None);
}

#[test]
fn iteration_round_trip() {
    let keys = [8u32, 3, 11, 1, 6, 9, 14, 0, 2, 5, 7, 10, 12, 15, 4, 13];

    let tree: AvlTree<u32, u32> = keys.iter().map(|&k| (k, k)).collect();
    tree.assert_invariants();

    let forward: Vec<u32> = tree.iter().map(|(&k, _)| k).collect();
    assert!(forward.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(forward.len(), keys.len());

    let backward: Vec<u32> = tree.iter().rev().map(|(&k, _)| k).collect();
    assert!(backward.windows(2).all(|w| w[0] > w[1]));

    let mut reversed = backward.clone();
    reversed.reverse();
    assert_eq!(forward, reversed);
}

#[test]
fn iter_is_double_ended_and_exact() {
    let tree: AvlTree<u32, u32> = (0u32..10).map(|k| (k, k)).collect();

    let mut iter = tree.iter();
    assert_eq!(iter.len(), 10);

    assert_eq!(iter.next().map(|(&k, _)| k), Some(0));
    assert_eq!(iter.next_back().map(|(&k, _)| k), Some(9));
    assert_eq!(iter.len(), 8);

    let middle: Vec<u32> = iter.map(|(&k, _)| k).collect();
    assert_eq!(middle, vec![1, 2, 3, 4, 5, 6, 7, 8]);
}

#[test]
fn first_last_pop() {
    let mut tree: AvlTree<u32, u32> = [(5u32, 50u32), (1, 10), (9, 90)].into_iter().collect();

    assert_eq!(tree.first_key_value(), Some((&1, &10)));
    assert_eq!(tree.last_key_value(), Some((&9, &90)));

    assert_eq!(tree.pop_first(), Some((1, 10)));
    assert_eq!(tree.pop_last(), Some((9, 90)));
    assert_eq!(tree.pop_first(), Some((5, 50)));
    assert_eq!(tree.pop_first(), None);
    tree.assert_invariants();
}

// Cursors ====================================================================

#[test]
fn cursor_wraps_through_ghost() {
    let tree: AvlTree<u32, u32> = (1u32..=3).map(|k| (k, k * 10)).collect();

    let mut cursor = tree.cursor_first();
    assert_eq!(cursor.key_value(), Some((&1, &10)));

    // Off the front: the ghost, then around to the last entry.
    cursor.move_prev();
    assert!(cursor.get().is_none());
    cursor.move_prev();
    assert_eq!(cursor.key(), Some(&3));

    // Off the back: the ghost, then around to the first entry.
    cursor.move_next();
    assert!(cursor.get().is_none());
    cursor.move_next();
    assert_eq!(cursor.key(), Some(&1));

    assert_eq!(cursor.peek_prev(), None);
    assert_eq!(cursor.peek_next(), Some((&2, &20)));
}

#[test]
fn cursor_on_empty_tree_is_ghost() {
    let tree: AvlTree<u32, u32> = AvlTree::new();

    let mut cursor = tree.cursor_first();
    assert!(cursor.get().is_none());
    cursor.move_next();
    assert!(cursor.get().is_none());

    assert!(tree.cursor_last().get().is_none());
}

#[test]
fn cursor_mut_edits_value() {
    let mut tree: AvlTree<u32, u32> = (1u32..=3).map(|k| (k, 0)).collect();

    let mut cursor = tree.find_mut(&2);
    assert_eq!(cursor.key(), Some(&2));
    if let Some(value) = cursor.get_mut() {
        *value = 99;
    }

    assert_eq!(tree.get(&2), Ok(&99));
    tree.assert_invariants();
}

#[test]
fn find_absent_is_ghost() {
    let tree: AvlTree<u32, u32> = (1u32..=3).map(|k| (k, k)).collect();

    assert!(tree.find(&7).get().is_none());
    assert_eq!(tree.find(&2).get(), Some(&2));
}

#[test]
fn cursor_remove_drains_in_order() {
    let mut tree: AvlTree<u32, u32> = [4u32, 2, 6, 1, 3, 5, 7]
        .into_iter()
        .map(|k| (k, k))
        .collect();

    let mut drained = Vec::new();
    let mut cursor = tree.cursor_first_mut();
    while let Some((key, _)) = cursor.remove_current() {
        drained.push(key);
    }

    assert_eq!(drained, vec![1, 2, 3, 4, 5, 6, 7]);
    assert!(tree.is_empty());
    tree.assert_invariants();
}

#[test]
fn cursor_remove_and_move_prev_drains_in_reverse() {
    let mut tree: AvlTree<u32, u32> = (1u32..=7).map(|k| (k, k)).collect();

    let mut drained = Vec::new();
    let mut cursor = tree.cursor_last_mut();
    while let Some((key, _)) = cursor.remove_current_and_move_prev() {
        drained.push(key);
    }

    assert_eq!(drained, vec![7, 6, 5, 4, 3, 2, 1]);
    assert!(tree.is_empty());
}

// Entry API ==================================================================

#[test]
fn entry_or_insert() {
    let mut tree: AvlTree<&str, u32> = AvlTree::new();

    *tree.entry("a").or_insert(1) += 10;
    assert_eq!(tree.get(&"a"), Ok(&11));

    // Occupied: the default is discarded.
    *tree.entry("a").or_insert(100) += 1;
    assert_eq!(tree.get(&"a"), Ok(&12));
    assert_eq!(tree.len(), 1);
    tree.assert_invariants();
}

#[test]
fn entry_or_default_is_indexed_access() {
    let mut tree: AvlTree<&str, Vec<u32>> = AvlTree::new();

    tree.entry("list").or_default().push(1);
    tree.entry("list").or_default().push(2);

    assert_eq!(tree.get(&"list"), Ok(&vec![1, 2]));
    assert_eq!(tree.len(), 1);
}

#[test]
fn entry_and_modify() {
    let mut tree: AvlTree<u32, u32> = AvlTree::new();

    tree.entry(1).and_modify(|v| *v += 1).or_insert(0);
    assert_eq!(tree.get(&1), Ok(&0));

    tree.entry(1).and_modify(|v| *v += 1).or_insert(0);
    assert_eq!(tree.get(&1), Ok(&1));
}

#[test]
fn occupied_entry_replace_and_remove() {
    let mut tree: AvlTree<u32, &str> = (1u32..=3).map(|k| (k, "old")).collect();

    match tree.entry(2) {
        Entry::Occupied(mut entry) => {
            assert_eq!(entry.key(), &2);
            assert_eq!(entry.insert("new"), "old");
        }
        Entry::Vacant(_) => panic!("entry for existing key is vacant"),
    }
    assert_eq!(tree.get(&2), Ok(&"new"));

    match tree.entry(2) {
        Entry::Occupied(entry) => assert_eq!(entry.remove_entry(), (2, "new")),
        Entry::Vacant(_) => panic!("entry for existing key is vacant"),
    }
    assert_eq!(tree.len(), 2);
    tree.assert_invariants();
}

#[test]
fn vacant_entry_keeps_key() {
    let mut tree: AvlTree<u32, u32> = AvlTree::new();

    match tree.entry(5) {
        Entry::Vacant(entry) => {
            assert_eq!(entry.key(), &5);
            assert_eq!(entry.into_key(), 5);
        }
        Entry::Occupied(_) => panic!("entry in empty tree is occupied"),
    }
    assert!(tree.is_empty());
}

// Storage ====================================================================

#[test]
fn clear_and_reuse() {
    let mut tree: AvlTree<u32, u32> = (0u32..100).map(|k| (k, k)).collect();

    tree.clear();
    assert!(tree.is_empty());
    assert_eq!(tree.height(), -1);
    tree.assert_invariants();

    for key in 0u32..10 {
        tree.insert(key, key);
    }
    assert_eq!(tree.len(), 10);
    tree.assert_invariants();
}

#[test]
fn removal_recycles_slots() {
    let mut tree: AvlTree<u32, u32> = (0u32..32).map(|k| (k, k)).collect();
    let slots = tree.nodes.slot_count();

    for key in 0u32..16 {
        tree.remove(&key);
    }
    for key in 100u32..116 {
        tree.insert(key, key);
    }

    // Churn is served from the free list; the arena does not grow.
    assert_eq!(tree.nodes.slot_count(), slots);
    tree.assert_invariants();
}

#[test]
fn clone_is_independent() {
    let mut tree: AvlTree<u32, u32> = (0u32..50).map(|k| (k, k)).collect();

    let snapshot = tree.clone();
    snapshot.assert_invariants();

    for key in 0u32..25 {
        tree.remove(&key);
    }
    tree.insert(1000, 1000);

    assert_eq!(snapshot.len(), 50);
    assert!(snapshot.iter().map(|(&k, _)| k).eq(0u32..50));
    snapshot.assert_invariants();
    tree.assert_invariants();
}

#[test]
fn debug_renders_as_map() {
    let tree: AvlTree<u32, &str> = [(2u32, "b"), (1, "a")].into_iter().collect();

    assert_eq!(format!("{tree:?}"), r#"{1: "a", 2: "b"}"#);
}

#[test]
fn dump_annotates_parents() {
    let mut tree = AvlTree::new();
    for key in [20u32, 10, 30] {
        tree.insert(key, key);
    }

    let mut out = String::new();
    tree.dump(&mut out).unwrap();

    assert_eq!(
        out,
        "    30 h=0 (parent 20)\n20 h=1 (root)\n    10 h=0 (parent 20)\n"
    );

    let empty: AvlTree<u32, u32> = AvlTree::new();
    let mut out = String::new();
    empty.dump(&mut out).unwrap();
    assert_eq!(out, "(empty)\n");
}

// Height bound ===============================================================

// AVL height is at most 1.44 * log2(n + 2) - 0.328 for n nodes.
fn check_height_bound(n: usize) {
    let mut keys: Vec<u32> = (0..n as u32).collect();
    keys.shuffle(&mut rand::rng());

    let mut tree: AvlTree<u32, ()> = AvlTree::new();
    for key in keys {
        tree.insert(key, ());
    }

    let bound = 1.44 * ((n + 2) as f64).log2() - 0.328;
    assert!(
        (tree.height() as f64) <= bound,
        "height {} exceeds AVL bound {:.2} for n={}",
        tree.height(),
        bound,
        n
    );

    tree.assert_invariants();
}

#[test]
fn height_bound_small() {
    check_height_bound(10);
}

#[test]
fn height_bound_medium() {
    check_height_bound(1000);
}

#[test]
#[cfg_attr(miri, ignore)]
fn height_bound_large() {
    check_height_bound(100_000);
}

// Property tests =============================================================

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(ops);
    }

    #[test]
    fn cursor_equivalence(
        keys in proptest::collection::vec(0u32..100, 0..50),
        ops in proptest::collection::vec(model::cursor_op_strategy(), FUZZ_RANGE),
    ) {
        model::run_cursor_equivalence(keys, ops);
    }
}
