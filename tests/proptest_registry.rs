//! Property-based tests for registry lifecycle bookkeeping.
//!
//! These tests drive random open/close sequences against a real registry and
//! compare its observable state to a trivial set model after every step.

mod common;

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use proptest::prelude::*;

use kv_registry::{StoreError, StoreHandle, StoreRegistry};

use common::Scratch;

/// A single registry operation over a small fixed pool of paths.
#[derive(Debug, Clone)]
enum Op {
    Open(usize),
    Close(usize),
    CloseAll,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..3usize).prop_map(Op::Open),
        3 => (0..3usize).prop_map(Op::Close),
        1 => Just(Op::CloseAll),
    ]
}

proptest! {
    // Each case opens real stores on disk, so keep the case count small.
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn registry_state_matches_set_model(ops in proptest::collection::vec(op_strategy(), 1..12)) {
        let scratch = Scratch::new().unwrap();
        let registry = StoreRegistry::new();
        let paths: Vec<String> = (0..3)
            .map(|i| scratch.store_path(&format!("store-{}", i)))
            .collect();

        let mut model: BTreeSet<usize> = BTreeSet::new();
        let mut handles: HashMap<usize, Arc<StoreHandle>> = HashMap::new();

        for op in ops {
            match op {
                Op::Open(i) => {
                    let path = paths.get(i).unwrap();
                    let handle = registry.open(path).unwrap();
                    prop_assert_eq!(handle.path(), Path::new(path));

                    // Reopening must hand back the instance we already hold.
                    if let Some(existing) = handles.get(&i) {
                        prop_assert!(Arc::ptr_eq(existing, &handle));
                    } else {
                        handles.insert(i, handle);
                    }
                    model.insert(i);
                }
                Op::Close(i) => {
                    let path = paths.get(i).unwrap();
                    let result = registry.close(path);
                    if model.remove(&i) {
                        prop_assert!(result.is_ok());
                    } else {
                        prop_assert!(matches!(result, Err(StoreError::NotOpen(_))));
                    }
                    handles.remove(&i);
                }
                Op::CloseAll => {
                    prop_assert_eq!(registry.close_all(), model.len());
                    model.clear();
                    handles.clear();
                }
            }

            prop_assert_eq!(registry.len(), model.len());
            prop_assert_eq!(registry.is_empty(), model.is_empty());
            for (i, path) in paths.iter().enumerate() {
                prop_assert_eq!(registry.is_open(path), model.contains(&i));
                prop_assert_eq!(registry.handle(path).is_ok(), model.contains(&i));
            }
        }
    }

    #[test]
    fn put_get_delete_roundtrip(key in "[a-z]{1,8}", value in proptest::collection::vec(any::<u8>(), 0..64)) {
        let scratch = Scratch::new().unwrap();
        let registry = StoreRegistry::new();

        let store = registry.open(scratch.store_path("prop")).unwrap();
        store.put(&key, &value).unwrap();
        prop_assert_eq!(store.get(&key).unwrap(), Some(value));

        store.delete(&key).unwrap();
        prop_assert_eq!(store.get(&key).unwrap(), None);
    }
}
