use std::collections::BTreeMap;

use proptest::prelude::*;
use rb_tree::RbTree;

/// The number of operations to perform in each proptest case.
const TEST_SIZE: usize = 300;

fn key_strategy() -> impl Strategy<Value = i32> {
    // small range so that inserts collide and removes hit
    -150i32..150i32
}

fn value_strategy() -> impl Strategy<Value = i32> {
    any::<i32>()
}

#[derive(Debug, Clone)]
enum MapOp {
    Insert(i32, i32),
    InsertOrAssign(i32, i32),
    Remove(i32),
    EraseFront,
    EraseBack,
    Get(i32),
    Contains(i32),
    GetOrInsertDefault(i32),
}

fn map_op_strategy() -> impl Strategy<Value = MapOp> {
    prop_oneof![
        4 => (key_strategy(), value_strategy()).prop_map(|(k, v)| MapOp::Insert(k, v)),
        2 => (key_strategy(), value_strategy()).prop_map(|(k, v)| MapOp::InsertOrAssign(k, v)),
        3 => key_strategy().prop_map(MapOp::Remove),
        1 => Just(MapOp::EraseFront),
        1 => Just(MapOp::EraseBack),
        2 => key_strategy().prop_map(MapOp::Get),
        1 => key_strategy().prop_map(MapOp::Contains),
        1 => key_strategy().prop_map(MapOp::GetOrInsertDefault),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Replays a random operation sequence on RbTree and BTreeMap and checks
    /// results and the red-black invariants after every step.
    #[test]
    fn map_ops_match_btreemap(ops in proptest::collection::vec(map_op_strategy(), TEST_SIZE)) {
        let mut tree: RbTree<i32, i32> = RbTree::new();
        let mut bt_map: BTreeMap<i32, i32> = BTreeMap::new();

        for op in &ops {
            match op {
                MapOp::Insert(k, v) => {
                    let (pos, inserted) = tree.insert(*k, *v);
                    prop_assert_eq!(inserted, !bt_map.contains_key(k), "insert({}, {})", k, v);
                    bt_map.entry(*k).or_insert(*v);
                    prop_assert_eq!(tree.key_value_at(pos), bt_map.get_key_value(k));
                }
                MapOp::InsertOrAssign(k, v) => {
                    let (pos, changed) = tree.insert_or_assign(*k, *v);
                    let expected = bt_map.insert(*k, *v) != Some(*v);
                    prop_assert_eq!(changed, expected, "insert_or_assign({}, {})", k, v);
                    prop_assert_eq!(tree.key_value_at(pos), Some((k, v)));
                }
                MapOp::Remove(k) => {
                    prop_assert_eq!(tree.remove(k), bt_map.remove(k), "remove({})", k);
                }
                MapOp::EraseFront => {
                    prop_assert_eq!(tree.erase(tree.begin()), bt_map.pop_first());
                }
                MapOp::EraseBack => {
                    let last = tree.prev(tree.end());
                    prop_assert_eq!(tree.erase(last), bt_map.pop_last());
                }
                MapOp::Get(k) => {
                    prop_assert_eq!(tree.get(k), bt_map.get(k), "get({})", k);
                    prop_assert_eq!(tree.find(k).is_end(), !bt_map.contains_key(k));
                }
                MapOp::Contains(k) => {
                    prop_assert_eq!(tree.contains(k), bt_map.contains_key(k), "contains({})", k);
                }
                MapOp::GetOrInsertDefault(k) => {
                    let ours = *tree.get_or_insert_default(*k);
                    let theirs = *bt_map.entry(*k).or_default();
                    prop_assert_eq!(ours, theirs, "get_or_insert_default({})", k);
                }
            }

            prop_assert!(tree.validate().is_ok(), "{:?} after {:?}", tree.validate(), op);
            prop_assert_eq!(tree.len(), bt_map.len());
        }

        let ours: Vec<_> = tree.iter().map(|(k, v)| (*k, *v)).collect();
        let theirs: Vec<_> = bt_map.into_iter().collect();
        prop_assert_eq!(ours, theirs);
    }

    /// Walking positions forward and backward visits the keys in order.
    #[test]
    fn positions_walk_in_order(keys in proptest::collection::btree_set(key_strategy(), 0..100)) {
        let tree: RbTree<i32, ()> = keys.iter().map(|&k| (k, ())).collect();

        let mut forward = Vec::new();
        let mut pos = tree.begin();
        while pos != tree.end() {
            forward.push(*tree.key_value_at(pos).unwrap().0);
            pos = tree.next(pos);
        }
        prop_assert_eq!(&forward, &keys.iter().copied().collect::<Vec<_>>());

        let mut backward = Vec::new();
        let mut cursor = tree.cursor_back();
        while let Some(key) = cursor.key() {
            backward.push(*key);
            if cursor.position() == tree.begin() {
                break;
            }
            cursor.move_prev();
        }
        forward.reverse();
        prop_assert_eq!(backward, forward);

        let black_height = tree.validate().unwrap();
        // a tree with black height h holds at least 2^h - 1 nodes
        prop_assert!((1usize << black_height) - 1 <= keys.len());
    }

    /// Merging moves exactly the keys the target lacks and leaves the rest
    /// behind in the source.
    #[test]
    fn merge_partitions_entries(
        left in proptest::collection::btree_map(key_strategy(), value_strategy(), 0..80),
        right in proptest::collection::btree_map(key_strategy(), value_strategy(), 0..80),
    ) {
        let mut target: RbTree<i32, i32> = left.iter().map(|(k, v)| (*k, *v)).collect();
        let mut source: RbTree<i32, i32> = right.iter().map(|(k, v)| (*k, *v)).collect();
        target.merge(&mut source);

        prop_assert!(target.validate().is_ok());
        prop_assert!(source.validate().is_ok());
        prop_assert_eq!(target.len() + source.len(), left.len() + right.len());

        for (k, v) in &left {
            prop_assert_eq!(target.get(k), Some(v));
        }
        for (k, v) in &right {
            if left.contains_key(k) {
                prop_assert_eq!(source.get(k), Some(v));
            } else {
                prop_assert_eq!(target.get(k), Some(v));
                prop_assert!(!source.contains(k));
            }
        }
    }

    /// Erasing through positions in arbitrary order keeps the survivors
    /// intact.
    #[test]
    fn erase_by_position(
        keys in proptest::collection::btree_set(key_strategy(), 1..100),
        picks in proptest::collection::vec(any::<prop::sample::Index>(), 1..50),
    ) {
        let mut tree: RbTree<i32, i32> = keys.iter().map(|&k| (k, k * 2)).collect();
        let mut model: BTreeMap<i32, i32> = keys.iter().map(|&k| (k, k * 2)).collect();

        for pick in picks {
            if model.is_empty() {
                break;
            }
            let key = *model.keys().nth(pick.index(model.len())).unwrap();
            let pos = tree.find(&key);
            prop_assert_eq!(tree.erase(pos), model.remove_entry(&key));
            prop_assert!(tree.validate().is_ok());
        }

        let ours: Vec<_> = tree.into_iter().collect();
        let theirs: Vec<_> = model.into_iter().collect();
        prop_assert_eq!(ours, theirs);
    }
}
