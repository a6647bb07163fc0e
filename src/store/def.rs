use crate::error::StoreError;
use crate::store::receiver::{StoreTxn, StoreView};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// The kind of handle a store key resolves to.
///
/// Every key in a [`StoreDef`] has exactly one kind, fixed by which builder
/// method declared it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Directly stored, writable value.
    Base,
    /// Read-only value computed from other keys.
    Derived,
    /// Dispatchable operation with no read value.
    Action,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryKind::Base => "base",
            EntryKind::Derived => "derived",
            EntryKind::Action => "action",
        };
        f.write_str(name)
    }
}

pub(crate) type DerivedFn = Arc<dyn Fn(&StoreView) -> Value + Send + Sync>;
pub(crate) type ActionFn =
    Arc<dyn Fn(&mut StoreTxn, &[Value]) -> Result<Patch, StoreError> + Send + Sync>;

enum EntrySpec {
    Base(Value),
    Derived(DerivedFn),
    Action(ActionFn),
}

/// A plain description of state: the input to [`create_store`].
///
/// Each key is declared exactly once as base state, a derived value, or an
/// action; re-declaring a key replaces the earlier entry, last one wins.
/// Declaration order never affects the behavior of the assembled store.
///
/// [`create_store`]: crate::store::create_store
#[derive(Default)]
pub struct StoreDef {
    entries: Vec<(String, EntrySpec)>,
}

impl StoreDef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a base-state key with its initial value.
    pub fn base(mut self, key: impl Into<String>, initial: impl Into<Value>) -> Self {
        self.push(key.into(), EntrySpec::Base(initial.into()));
        self
    }

    /// Declare a derived key computed from other store keys.
    ///
    /// The compute function receives a fresh [`StoreView`] on every
    /// evaluation and may read any key of the store through it.
    pub fn derived<F>(mut self, key: impl Into<String>, compute: F) -> Self
    where
        F: Fn(&StoreView) -> Value + Send + Sync + 'static,
    {
        self.push(key.into(), EntrySpec::Derived(Arc::new(compute)));
        self
    }

    /// Declare an action key.
    ///
    /// The body receives a fresh [`StoreTxn`] on every dispatch plus the
    /// dispatch arguments. Base writes through the receiver apply
    /// immediately; a returned non-empty [`Patch`] is applied afterwards as
    /// one atomic base-state transition.
    pub fn action<F>(mut self, key: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut StoreTxn, &[Value]) -> Result<Patch, StoreError> + Send + Sync + 'static,
    {
        self.push(key.into(), EntrySpec::Action(Arc::new(body)));
        self
    }

    fn push(&mut self, key: String, spec: EntrySpec) {
        if let Some(slot) = self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            slot.1 = spec;
        } else {
            self.entries.push((key, spec));
        }
    }

    /// One-time classification pass: partition the entries into the three
    /// static collections the assembly consumes. Exhaustive and mutually
    /// exclusive by construction.
    pub(crate) fn classify(self) -> Classified {
        let mut classified = Classified::default();
        for (key, spec) in self.entries {
            match spec {
                EntrySpec::Base(initial) => classified.base.push((key, initial)),
                EntrySpec::Derived(compute) => classified.derived.push((key, compute)),
                EntrySpec::Action(body) => classified.actions.push((key, body)),
            }
        }
        classified
    }
}

#[derive(Default)]
pub(crate) struct Classified {
    pub(crate) base: Vec<(String, Value)>,
    pub(crate) derived: Vec<(String, DerivedFn)>,
    pub(crate) actions: Vec<(String, ActionFn)>,
}

/// A partial replacement record for base state.
///
/// Returned from an action body to apply several base-key writes as a single
/// composite transition. Keys that are not base state in the receiving store
/// are silently ignored when the patch is applied.
#[derive(Clone, Default)]
pub struct Patch {
    entries: Vec<(String, Value)>,
}

impl Patch {
    /// An empty patch: applying it changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set`](Patch::set).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Record a replacement value for `key`; a later value for the same key
    /// replaces an earlier one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_entries(self) -> Vec<(String, Value)> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_partitions_by_constructor() {
        let classified = StoreDef::new()
            .base("count", 0)
            .derived("double", |view| view.get("count"))
            .action("bump", |_txn, _args| Ok(Patch::new()))
            .classify();

        assert_eq!(classified.base.len(), 1);
        assert_eq!(classified.derived.len(), 1);
        assert_eq!(classified.actions.len(), 1);
        assert_eq!(classified.base[0].0, "count");
        assert_eq!(classified.base[0].1, Value::Int(0));
    }

    #[test]
    fn redeclaring_a_key_replaces_it() {
        let classified = StoreDef::new()
            .base("flag", false)
            .derived("flag", |_view| Value::Bool(true))
            .classify();

        assert!(classified.base.is_empty());
        assert_eq!(classified.derived.len(), 1);
    }

    #[test]
    fn patch_last_value_wins() {
        let patch = Patch::new().with("a", 1).with("b", 2).with("a", 3);
        let entries = patch.into_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], ("a".to_string(), Value::Int(3)));
    }

    #[test]
    fn entry_kind_display() {
        assert_eq!(EntryKind::Derived.to_string(), "derived");
    }
}
