use crate::cell::{DerivedCell, Effect, WritableCell};
use crate::error::StoreError;
use crate::store::def::{EntryKind, StoreDef};
use crate::store::receiver::{StoreTxn, StoreView};
use crate::store::root::RootState;
use crate::value::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

/// A write-only cell that runs an action body when dispatched.
///
/// Dispatch is fully synchronous: the body runs to completion, any returned
/// patch is applied, and only then does `dispatch` return. There is no
/// rollback; if the body fails partway, base writes it already performed
/// stay applied.
#[derive(Clone)]
pub struct ActionCell {
    dispatch: Arc<dyn Fn(&[Value]) -> Result<(), StoreError> + Send + Sync>,
}

impl ActionCell {
    fn new<F>(dispatch: F) -> Self
    where
        F: Fn(&[Value]) -> Result<(), StoreError> + Send + Sync + 'static,
    {
        Self {
            dispatch: Arc::new(dispatch),
        }
    }

    /// Run the action with the given arguments.
    pub fn dispatch(&self, args: &[Value]) -> Result<(), StoreError> {
        (self.dispatch)(args)
    }
}

/// One reactive handle per original key of the description.
#[derive(Clone)]
pub enum Handle {
    /// Readable/writable base-state handle.
    Base(WritableCell<Value>),
    /// Read-only derived handle.
    Derived(DerivedCell<Value>),
    /// Dispatchable action handle.
    Action(ActionCell),
}

impl Handle {
    pub fn kind(&self) -> EntryKind {
        match self {
            Handle::Base(_) => EntryKind::Base,
            Handle::Derived(_) => EntryKind::Derived,
            Handle::Action(_) => EntryKind::Action,
        }
    }
}

pub(crate) struct StoreInner {
    pub(crate) root: Arc<RootState>,
    handles: BTreeMap<String, Handle>,
}

impl StoreInner {
    pub(crate) fn resolve(&self, key: &str) -> Value {
        match self.handles.get(key) {
            Some(Handle::Base(cell)) => cell.get(),
            Some(Handle::Derived(cell)) => cell.get(),
            Some(Handle::Action(_)) => Value::Null,
            None => panic!("store has no key `{key}`"),
        }
    }

    pub(crate) fn kind_of(&self, key: &str) -> Option<EntryKind> {
        self.handles.get(key).map(Handle::kind)
    }
}

/// The assembled store: an immutable mapping from key to cell handle.
///
/// Built once by [`create_store`]; cloning shares the same cell graph.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

/// Build a [`Store`] from a [`StoreDef`].
///
/// Classifies the description, aggregates all base fields into one composite
/// cell, then installs exactly one handle per key: base keys become writable
/// projections over the aggregate, derived keys become lazy cells that
/// evaluate against a fresh [`StoreView`], action keys become dispatchable
/// cells that run against a fresh [`StoreTxn`].
///
/// # Examples
///
/// ```
/// use canister::{create_store, Patch, StoreDef, Value};
///
/// let store = create_store(
///     StoreDef::new()
///         .base("count", 0)
///         .derived("double", |view| {
///             Value::Int(view.get("count").as_int().unwrap() * 2)
///         })
///         .action("increment", |txn, args| {
///             let n = args.first().and_then(Value::as_int).unwrap_or(1);
///             let count = txn.get("count").as_int().unwrap();
///             Ok(Patch::new().with("count", count + n))
///         }),
/// );
///
/// assert_eq!(store.get("count"), Value::Int(0));
/// assert_eq!(store.get("double"), Value::Int(0));
///
/// store.dispatch("increment", &[]).unwrap();
/// assert_eq!(store.get("double"), Value::Int(2));
///
/// store.dispatch("increment", &[Value::Int(5)]).unwrap();
/// assert_eq!(store.get("count"), Value::Int(6));
/// assert_eq!(store.get("double"), Value::Int(12));
/// ```
pub fn create_store(def: StoreDef) -> Store {
    let classified = def.classify();

    // Derived and action closures hold a Weak back-reference into the store
    // they belong to; Arc::new_cyclic keeps the handle map from leaking
    // through that cycle. The closures only run after assembly, so the
    // upgrade inside them always sees the finished map.
    let inner = Arc::new_cyclic(|weak: &Weak<StoreInner>| {
        let root = Arc::new(RootState::new(classified.base));
        let mut handles = BTreeMap::new();

        for key in root.keys() {
            let read = {
                let root = Arc::clone(&root);
                let key = key.clone();
                move || root.read(&key)
            };
            let write = {
                let root = Arc::clone(&root);
                let key = key.clone();
                move |value| root.write(&key, value)
            };
            handles.insert(key.clone(), Handle::Base(WritableCell::new(read, write)));
        }

        for (key, compute) in classified.derived {
            let weak = weak.clone();
            let cell = DerivedCell::new(move || {
                let inner = weak
                    .upgrade()
                    .expect("store dropped while a derived cell was evaluating");
                let view = StoreView { inner };
                compute(&view)
            });
            handles.insert(key, Handle::Derived(cell));
        }

        for (key, body) in classified.actions {
            let weak = weak.clone();
            let cell = ActionCell::new(move |args: &[Value]| {
                let inner = weak
                    .upgrade()
                    .expect("store dropped while an action was dispatching");
                let root = Arc::clone(&inner.root);
                let mut txn = StoreTxn { inner };
                let patch = body(&mut txn, args)?;
                if !patch.is_empty() {
                    root.write_patch(patch);
                }
                Ok(())
            });
            handles.insert(key, Handle::Action(cell));
        }

        StoreInner { root, handles }
    });

    Store { inner }
}

impl Store {
    /// Current value of a key.
    ///
    /// Base keys read their stored value, derived keys recompute if stale,
    /// action keys read as [`Value::Null`]. Panics if the store has no such
    /// key (programmer error).
    pub fn get(&self, key: &str) -> Value {
        self.inner.resolve(key)
    }

    /// Write a base key.
    ///
    /// Fails with [`StoreError::InvalidWrite`] for derived and action keys.
    /// Panics if the store has no such key.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<(), StoreError> {
        match self.inner.handles.get(key) {
            Some(Handle::Base(cell)) => {
                cell.set(value.into());
                Ok(())
            }
            Some(handle) => Err(StoreError::InvalidWrite {
                key: key.to_string(),
                kind: handle.kind(),
            }),
            None => panic!("store has no key `{key}`"),
        }
    }

    /// Dispatch an action key with the given arguments.
    ///
    /// Fails with [`StoreError::NotAnAction`] for base and derived keys.
    /// Panics if the store has no such key.
    pub fn dispatch(&self, key: &str, args: &[Value]) -> Result<(), StoreError> {
        match self.inner.handles.get(key) {
            Some(Handle::Action(cell)) => cell.dispatch(args),
            Some(_) => Err(StoreError::NotAnAction {
                key: key.to_string(),
            }),
            None => panic!("store has no key `{key}`"),
        }
    }

    /// The kind of handle installed for a key, if any.
    pub fn kind(&self, key: &str) -> Option<EntryKind> {
        self.inner.kind_of(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.handles.contains_key(key)
    }

    /// All keys of the store, in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner.handles.keys().map(String::as_str)
    }

    /// Borrow the handle installed for a key.
    pub fn handle(&self, key: &str) -> Option<&Handle> {
        self.inner.handles.get(key)
    }

    /// Subscribe to one key: the callback runs immediately with the current
    /// value and again whenever the key's cell is invalidated.
    ///
    /// The subscription lives as long as the returned [`Effect`].
    pub fn watch<F>(&self, key: &str, callback: F) -> Effect
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        let store = self.clone();
        let key = key.to_string();
        Effect::new(move || callback(store.get(&key)))
    }
}
