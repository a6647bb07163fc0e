use crate::cell::Cell;
use crate::store::def::Patch;
use crate::value::Value;
use std::collections::{BTreeMap, BTreeSet};

/// The composite base-state record.
pub(crate) type BaseRecord = BTreeMap<String, Value>;

/// Holds every base field in one composite cell.
///
/// The record is only ever replaced wholesale, never mutated in place, so a
/// multi-key update from an action patch is observed by dependents as one
/// transition with no partially-updated intermediate state. The key set is
/// fixed at construction.
pub(crate) struct RootState {
    record: Cell<BaseRecord>,
    keys: BTreeSet<String>,
}

impl RootState {
    pub(crate) fn new(fields: Vec<(String, Value)>) -> Self {
        let record: BaseRecord = fields.into_iter().collect();
        let keys = record.keys().cloned().collect();
        Self {
            record: Cell::new(record),
            keys,
        }
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &String> {
        self.keys.iter()
    }

    /// Read projection for one key; tracks the composite cell.
    pub(crate) fn read(&self, key: &str) -> Value {
        self.record.with(|record| {
            record
                .get(key)
                .cloned()
                .expect("base record is missing a key fixed at construction")
        })
    }

    /// Replace one key's value via a whole-record replacement.
    pub(crate) fn write(&self, key: &str, value: Value) {
        let mut next = self.record.get_untracked();
        next.insert(key.to_string(), value);
        self.record.set(next);
    }

    /// Fold a patch into a single whole-record replacement.
    ///
    /// Patch keys outside the base-key set are silently ignored; if nothing
    /// in the patch applies, no transition happens at all.
    pub(crate) fn write_patch(&self, patch: Patch) {
        let mut next = self.record.get_untracked();
        let mut touched = false;
        for (key, value) in patch.into_entries() {
            if self.keys.contains(&key) {
                next.insert(key, value);
                touched = true;
            }
        }
        if touched {
            self.record.set(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Effect;
    use crate::runtime::Runtime;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn sample() -> RootState {
        RootState::new(vec![
            ("a".to_string(), Value::Int(1)),
            ("b".to_string(), Value::Int(2)),
        ])
    }

    #[test]
    fn reads_initial_values() {
        Runtime::scope(|| {
            let root = sample();
            assert_eq!(root.read("a"), Value::Int(1));
            assert_eq!(root.read("b"), Value::Int(2));
        });
    }

    #[test]
    fn write_replaces_only_the_named_key() {
        Runtime::scope(|| {
            let root = sample();
            root.write("a", Value::Int(10));
            assert_eq!(root.read("a"), Value::Int(10));
            assert_eq!(root.read("b"), Value::Int(2));
        });
    }

    #[test]
    fn patch_is_one_transition() {
        Runtime::scope(|| {
            let root = Arc::new(sample());
            let transitions = Arc::new(AtomicUsize::new(0));

            let _effect = Effect::new({
                let root = Arc::clone(&root);
                let transitions = Arc::clone(&transitions);
                move || {
                    let _ = root.read("a");
                    let _ = root.read("b");
                    transitions.fetch_add(1, Ordering::SeqCst);
                }
            });
            assert_eq!(transitions.load(Ordering::SeqCst), 1);

            root.write_patch(Patch::new().with("a", 5).with("b", 6));
            assert_eq!(transitions.load(Ordering::SeqCst), 2);
            assert_eq!(root.read("a"), Value::Int(5));
            assert_eq!(root.read("b"), Value::Int(6));
        });
    }

    #[test]
    fn patch_ignores_unknown_keys() {
        Runtime::scope(|| {
            let root = sample();
            root.write_patch(Patch::new().with("a", 9).with("ghost", 1));
            assert_eq!(root.read("a"), Value::Int(9));
        });
    }
}
