//! Reference-model equivalence runners shared by the proptest suite and the
//! fuzz targets.

use std::collections::BTreeMap;

use arbitrary::Arbitrary;
use proptest::strategy::{Just, Strategy};

use crate::AvlTree;

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ItemValue {
    Index(usize),
    Random(u32),
}

proptest::prop_compose! {
    fn index_strategy()(
        index in 0usize..1000,
    ) -> ItemValue {
        ItemValue::Index(index)
    }
}

proptest::prop_compose! {
    fn random_strategy()(
        random in 0u32..1000,
    ) -> ItemValue {
        ItemValue::Random(random)
    }
}

fn value_strategy() -> impl Strategy<Value = ItemValue> {
    proptest::prop_oneof![index_strategy(), random_strategy()]
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Insert(ItemValue),
    Get(ItemValue),
    Remove(ItemValue),
    First,
    PopFirst,
    Last,
    PopLast,
}

impl Op {
    // Resolves `Index` items against the keys currently in the map, so op
    // sequences keep hitting existing keys instead of missing forever.
    fn finalize(self, sorted: &[u32]) -> FinalOp {
        fn get_key(v: &[u32], i: ItemValue) -> u32 {
            match i {
                ItemValue::Index(idx) => {
                    if v.is_empty() {
                        idx as u32
                    } else {
                        v[idx % v.len().max(1)]
                    }
                }
                ItemValue::Random(v) => v,
            }
        }

        match self {
            Op::Insert(item) => FinalOp::Insert(get_key(sorted, item)),
            Op::Get(item) => FinalOp::Get(get_key(sorted, item)),
            Op::Remove(item) => FinalOp::Remove(get_key(sorted, item)),
            Op::First => FinalOp::First,
            Op::PopFirst => FinalOp::PopFirst,
            Op::Last => FinalOp::Last,
            Op::PopLast => FinalOp::PopLast,
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum FinalOp {
    Insert(u32),
    Get(u32),
    Remove(u32),
    First,
    PopFirst,
    Last,
    PopLast,
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        value_strategy().prop_map(Op::Insert),
        value_strategy().prop_map(Op::Get),
        value_strategy().prop_map(Op::Remove),
        Just(Op::First),
        Just(Op::PopFirst),
        Just(Op::Last),
        Just(Op::PopLast),
    ]
}

/// Runs `ops` against both an [`AvlTree`] and a [`BTreeMap`], asserting
/// after every operation that the observable results match, that the tree
/// invariants hold, and that both containers hold identical entries.
///
/// Inserted values are strictly increasing stamps, so overwrite-in-place on
/// a duplicate key is observable in the comparison.
pub fn run_btree_equivalence(ops: Vec<Op>) {
    let mut sorted_keys = Vec::with_capacity(ops.len());
    let mut btree: BTreeMap<u32, u32> = BTreeMap::new();
    let mut avl: AvlTree<u32, u32> = AvlTree::new();
    let mut stamp = 0u32;

    fn insert_sorted(v: &mut Vec<u32>, key: u32) {
        if let Err(idx) = v.binary_search(&key) {
            v.insert(idx, key);
        }
    }

    fn remove_sorted(v: &mut Vec<u32>, key: u32) {
        if let Ok(idx) = v.binary_search(&key) {
            v.remove(idx);
        }
    }

    let mut final_ops = Vec::with_capacity(ops.len());
    for (op_id, op) in ops.into_iter().enumerate() {
        let final_op = op.finalize(&sorted_keys);
        final_ops.push(final_op);

        match final_op {
            FinalOp::Insert(key) => {
                insert_sorted(&mut sorted_keys, key);

                let from_btree = btree.insert(key, stamp);
                let had_key = avl.contains_key(&key);
                let cursor = avl.insert(key, stamp);

                assert_eq!(
                    cursor.key_value(),
                    Some((&key, &stamp)),
                    "FinalOp #{op_id}: {op:?}"
                );
                assert_eq!(from_btree.is_some(), had_key, "FinalOp #{op_id}: {op:?}");

                stamp += 1;
            }

            FinalOp::Get(key) => {
                let from_btree = btree.get(&key);
                let from_avl = avl.get(&key).ok();

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::Remove(key) => {
                remove_sorted(&mut sorted_keys, key);

                let from_btree = btree.remove(&key);
                let from_avl = avl.remove(&key);

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::First => {
                let from_btree = btree.first_key_value();
                let from_avl = avl.first_key_value();

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::PopFirst => {
                let from_btree = btree.pop_first();
                let from_avl = avl.pop_first();

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::Last => {
                let from_btree = btree.last_key_value();
                let from_avl = avl.last_key_value();

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::PopLast => {
                let from_btree = btree.pop_last();
                let from_avl = avl.pop_last();

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {op:?}");
            }
        }

        avl.assert_invariants();
        assert_eq!(btree.len(), avl.len());
        assert!(btree.iter().zip(avl.iter()).all(|(a, b)| a == b));
    }
}

#[derive(Clone, Debug, Arbitrary)]
pub enum CursorOp {
    // Get is not an operation as it's executed on every loop iteration to check equivalence.
    MovePrev,
    MoveNext,
    PeekNext,
    PeekPrev,
    RemoveCurrent,
    RemoveCurrentMovePrev,
}

pub fn cursor_op_strategy() -> impl Strategy<Value = CursorOp> {
    proptest::prop_oneof![
        Just(CursorOp::MovePrev),
        Just(CursorOp::MoveNext),
        Just(CursorOp::PeekNext),
        Just(CursorOp::PeekPrev),
        Just(CursorOp::RemoveCurrent),
        Just(CursorOp::RemoveCurrentMovePrev),
    ]
}

#[derive(Clone, Debug)]
pub struct CursorEquivalenceInput {
    pub keys: Vec<u32>,
    pub ops: Vec<CursorOp>,
}

impl<'a> arbitrary::Arbitrary<'a> for CursorEquivalenceInput {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        fn key(u: &mut arbitrary::Unstructured<'_>) -> u32 {
            u32::arbitrary(u).unwrap_or(0)
        }

        fn op(u: &mut arbitrary::Unstructured<'_>) -> CursorOp {
            CursorOp::arbitrary(u).unwrap_or(CursorOp::MoveNext)
        }

        let num_keys = u8::arbitrary(u)? % 100;
        let num_ops = u16::arbitrary(u)? % 1000;

        let keys = core::iter::repeat_with(|| key(u))
            .take(num_keys.into())
            .collect();

        let ops = core::iter::repeat_with(|| op(u))
            .take(num_ops.into())
            .collect();

        Ok(CursorEquivalenceInput { keys, ops })
    }
}

/// Runs `ops` against both a [`CursorMut`] seeded at the first entry and a
/// cursor simulated over a sorted `Vec`, asserting after every operation
/// that the cursors point to the same entry.
///
/// [`CursorMut`]: crate::CursorMut
pub fn run_cursor_equivalence(mut keys: Vec<u32>, ops: Vec<CursorOp>) {
    keys.sort_unstable();
    keys.dedup();

    // Ideally this would be a BTreeMap cursor, but it isn't stable :(
    let mut vec: Vec<(u32, u32)> = Vec::new();
    let mut avl: AvlTree<u32, u32> = AvlTree::new();

    for (stamp, key) in keys.into_iter().enumerate() {
        vec.push((key, stamp as u32));
        avl.insert(key, stamp as u32);
    }

    // `None` is the ghost position.
    fn vec_curs_prev(v: &[(u32, u32)], curs: Option<usize>) -> Option<usize> {
        match curs {
            Some(i) => i.checked_sub(1),
            None => v.len().checked_sub(1),
        }
    }

    fn vec_curs_next(v: &[(u32, u32)], curs: Option<usize>) -> Option<usize> {
        match curs {
            Some(i) => i.checked_add(1).filter(|&i| i < v.len()),
            None => (!v.is_empty()).then_some(0),
        }
    }

    fn vec_entry(v: &[(u32, u32)], curs: Option<usize>) -> Option<(&u32, &u32)> {
        curs.map(|i| {
            let (key, value) = &v[i];
            (key, value)
        })
    }

    let mut vec_curs = vec_curs_next(&vec, None);
    let mut avl_curs = avl.cursor_first_mut();

    // Check that the initial states are equivalent.
    assert_eq!(vec_entry(&vec, vec_curs), avl_curs.key_value());

    for op in ops {
        match op {
            CursorOp::MoveNext => {
                vec_curs = vec_curs_next(&vec, vec_curs);
                avl_curs.move_next();
            }

            CursorOp::MovePrev => {
                vec_curs = vec_curs_prev(&vec, vec_curs);
                avl_curs.move_prev();
            }

            CursorOp::PeekNext => {
                let v = vec_entry(&vec, vec_curs_next(&vec, vec_curs));
                let w = avl_curs.peek_next();

                assert_eq!(v, w);
            }

            CursorOp::PeekPrev => {
                let v = vec_entry(&vec, vec_curs_prev(&vec, vec_curs));
                let w = avl_curs.peek_prev();

                assert_eq!(v, w);
            }

            CursorOp::RemoveCurrent => {
                let v = vec_curs.map(|i| vec.remove(i));

                if vec_curs == Some(vec.len()) {
                    vec_curs = None;
                }

                let w = avl_curs.remove_current();

                assert_eq!(v, w);
            }

            CursorOp::RemoveCurrentMovePrev => {
                let new_v_curs = vec_curs.is_some().then(|| vec_curs_prev(&vec, vec_curs));
                let v = vec_curs.map(|i| vec.remove(i));

                if let Some(vc) = new_v_curs {
                    vec_curs = vc;
                }

                let w = avl_curs.remove_current_and_move_prev();

                assert_eq!(v, w);
            }
        }

        assert_eq!(vec_entry(&vec, vec_curs), avl_curs.key_value());
    }
}
