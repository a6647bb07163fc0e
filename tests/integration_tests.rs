//! Integration tests for Canister

use std::sync::{Arc, Mutex};

use canister::{create_store, EntryKind, Patch, Runtime, Store, StoreDef, StoreError, Value};

fn counter_store() -> Store {
    create_store(
        StoreDef::new()
            .base("count", 0)
            .derived("double", |view| {
                Value::Int(view.get("count").as_int().unwrap() * 2)
            })
            .action("increment", |txn, args| {
                let n = args.first().and_then(Value::as_int).unwrap_or(1);
                let count = txn.get("count").as_int().unwrap();
                Ok(Patch::new().with("count", count + n))
            }),
    )
}

#[test]
fn base_keys_read_their_initial_values() {
    Runtime::scope(|| {
        let store = create_store(
            StoreDef::new()
                .base("count", 0)
                .base("name", "ada")
                .base("ratio", 0.5),
        );
        assert_eq!(store.get("count"), Value::Int(0));
        assert_eq!(store.get("name"), Value::from("ada"));
        assert_eq!(store.get("ratio"), Value::Float(0.5));
    });
}

#[test]
fn writing_one_base_key_leaves_others_alone() {
    Runtime::scope(|| {
        let store = create_store(StoreDef::new().base("a", 1).base("b", 2));
        store.set("a", 10).unwrap();
        assert_eq!(store.get("a"), Value::Int(10));
        assert_eq!(store.get("b"), Value::Int(2));
    });
}

#[test]
fn derived_values_are_never_stale() {
    Runtime::scope(|| {
        let store = counter_store();
        assert_eq!(store.get("double"), Value::Int(0));
        store.set("count", 21).unwrap();
        assert_eq!(store.get("double"), Value::Int(42));
    });
}

#[test]
fn derived_chains_of_arbitrary_depth() {
    Runtime::scope(|| {
        let store = create_store(
            StoreDef::new()
                .base("n", 1)
                .derived("double", |view| {
                    Value::Int(view.get("n").as_int().unwrap() * 2)
                })
                .derived("quadruple", |view| {
                    Value::Int(view.get("double").as_int().unwrap() * 2)
                })
                .derived("octuple", |view| {
                    Value::Int(view.get("quadruple").as_int().unwrap() * 2)
                }),
        );
        assert_eq!(store.get("octuple"), Value::Int(8));
        store.set("n", 3).unwrap();
        assert_eq!(store.get("octuple"), Value::Int(24));
    });
}

#[test]
fn counter_scenario() {
    Runtime::scope(|| {
        let store = counter_store();
        assert_eq!(store.get("count"), Value::Int(0));
        assert_eq!(store.get("double"), Value::Int(0));

        store.dispatch("increment", &[]).unwrap();
        assert_eq!(store.get("count"), Value::Int(1));
        assert_eq!(store.get("double"), Value::Int(2));

        store.dispatch("increment", &[Value::Int(5)]).unwrap();
        assert_eq!(store.get("count"), Value::Int(6));
        assert_eq!(store.get("double"), Value::Int(12));
    });
}

#[test]
fn direct_write_is_visible_to_the_returned_patch() {
    Runtime::scope(|| {
        let store = create_store(StoreDef::new().base("count", 0).action(
            "reset_and_bump",
            |txn, _args| {
                txn.set("count", 10)?;
                let count = txn.get("count").as_int().unwrap();
                Ok(Patch::new().with("count", count + 1))
            },
        ));
        store.dispatch("reset_and_bump", &[]).unwrap();
        assert_eq!(store.get("count"), Value::Int(11));
    });
}

#[test]
fn assigning_a_derived_key_from_an_action_fails() {
    Runtime::scope(|| {
        let store = create_store(
            StoreDef::new()
                .base("count", 0)
                .derived("double", |view| {
                    Value::Int(view.get("count").as_int().unwrap() * 2)
                })
                .action("corrupt", |txn, _args| {
                    txn.set("double", 99)?;
                    Ok(Patch::new())
                }),
        );
        assert_eq!(
            store.dispatch("corrupt", &[]),
            Err(StoreError::InvalidWrite {
                key: "double".to_string(),
                kind: EntryKind::Derived,
            })
        );
        // The derived value is untouched.
        assert_eq!(store.get("double"), Value::Int(0));
    });
}

#[test]
fn derived_handles_expose_no_write_operation() {
    Runtime::scope(|| {
        let store = counter_store();
        assert_eq!(
            store.set("double", 1),
            Err(StoreError::InvalidWrite {
                key: "double".to_string(),
                kind: EntryKind::Derived,
            })
        );
    });
}

#[test]
fn multi_key_patch_is_one_consistent_update() {
    Runtime::scope(|| {
        let store = create_store(
            StoreDef::new()
                .base("a", 1)
                .base("b", 2)
                .derived("sum", |view| {
                    Value::Int(view.get("a").as_int().unwrap() + view.get("b").as_int().unwrap())
                })
                .action("jump", |_txn, _args| {
                    Ok(Patch::new().with("a", 10).with("b", 20))
                }),
        );

        let seen: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
        let _watch = store.watch("sum", {
            let seen = Arc::clone(&seen);
            move |value| seen.lock().unwrap().push(value)
        });

        store.dispatch("jump", &[]).unwrap();

        // One observation per transition: the initial sum and the settled
        // sum, never an intermediate with only one key applied (4 or 21).
        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![Value::Int(3), Value::Int(30)]);
    });
}

#[test]
fn patch_keys_outside_base_state_are_ignored() {
    Runtime::scope(|| {
        let store = create_store(StoreDef::new().base("kept", 1).action(
            "noise",
            |_txn, _args| Ok(Patch::new().with("kept", 2).with("ghost", 99)),
        ));
        store.dispatch("noise", &[]).unwrap();
        assert_eq!(store.get("kept"), Value::Int(2));
        assert!(!store.contains("ghost"));
    });
}

#[test]
fn declaration_order_is_irrelevant() {
    Runtime::scope(|| {
        // Derived key declared before the base key it reads.
        let forward = create_store(
            StoreDef::new()
                .derived("double", |view| {
                    Value::Int(view.get("count").as_int().unwrap() * 2)
                })
                .base("count", 4),
        );
        let backward = create_store(
            StoreDef::new()
                .base("count", 4)
                .derived("double", |view| {
                    Value::Int(view.get("count").as_int().unwrap() * 2)
                }),
        );
        assert_eq!(forward.get("double"), backward.get("double"));
        forward.set("count", 6).unwrap();
        backward.set("count", 6).unwrap();
        assert_eq!(forward.get("double"), Value::Int(12));
        assert_eq!(backward.get("double"), Value::Int(12));
    });
}

#[test]
fn failed_action_keeps_writes_already_applied() {
    Runtime::scope(|| {
        let store = create_store(
            StoreDef::new()
                .base("a", 0)
                .derived("wall", |_view| Value::Null)
                .action("partial", |txn, _args| {
                    txn.set("a", 1)?;
                    txn.set("wall", 2)?; // fails here
                    Ok(Patch::new().with("a", 3))
                }),
        );
        assert!(store.dispatch("partial", &[]).is_err());
        // No rollback: the write before the failure point stays.
        assert_eq!(store.get("a"), Value::Int(1));
    });
}

#[test]
fn dispatching_a_non_action_key_fails() {
    Runtime::scope(|| {
        let store = counter_store();
        assert_eq!(
            store.dispatch("double", &[]),
            Err(StoreError::NotAnAction {
                key: "double".to_string(),
            })
        );
    });
}

#[test]
#[should_panic(expected = "cyclic dependency")]
fn cyclic_derivation_panics() {
    Runtime::scope(|| {
        let store = create_store(
            StoreDef::new().derived("narcissus", |view| view.get("narcissus")),
        );
        let _ = store.get("narcissus");
    });
}

#[test]
fn watch_fires_immediately_and_per_transition() {
    Runtime::scope(|| {
        let store = counter_store();
        let seen: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));

        let watch = store.watch("count", {
            let seen = Arc::clone(&seen);
            move |value| seen.lock().unwrap().push(value)
        });

        store.set("count", 1).unwrap();
        store.dispatch("increment", &[]).unwrap();
        drop(watch);
        store.set("count", 100).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![Value::Int(0), Value::Int(1), Value::Int(2)]);
    });
}

#[test]
fn stores_hold_mixed_value_types() {
    Runtime::scope(|| {
        let store = create_store(
            StoreDef::new()
                .base("title", "untitled")
                .base("saved", false)
                .derived("label", |view| {
                    let title = view.get("title");
                    let marker = if view.get("saved").as_bool().unwrap() {
                        ""
                    } else {
                        "*"
                    };
                    Value::String(format!("{}{marker}", title.as_str().unwrap()))
                })
                .action("save", |_txn, args| {
                    let mut patch = Patch::new().with("saved", true);
                    if let Some(title) = args.first().and_then(Value::as_str) {
                        patch.set("title", title);
                    }
                    Ok(patch)
                }),
        );

        assert_eq!(store.get("label"), Value::from("untitled*"));
        store
            .dispatch("save", &[Value::from("notes.txt")])
            .unwrap();
        assert_eq!(store.get("label"), Value::from("notes.txt"));
    });
}
