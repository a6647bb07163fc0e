//! Synthetic receivers: the explicit context objects handed to derived
//! computations and action bodies in place of an implicit subject.
//!
//! A receiver is built fresh for each derived evaluation or action dispatch
//! and discarded when it returns; it is never stored. Through it, user logic
//! can resolve any key of the store regardless of declaration order, because
//! the full handle map exists before any receiver can run.

use crate::error::StoreError;
use crate::store::def::EntryKind;
use crate::store::store::StoreInner;
use crate::value::Value;
use std::sync::Arc;

/// Read-only receiver handed to derived compute functions.
///
/// Reads resolve through each key's own cell, so the dependencies a
/// computation records are exactly the cells it actually read.
pub struct StoreView {
    pub(crate) inner: Arc<StoreInner>,
}

impl StoreView {
    /// Resolve a key to its current value.
    ///
    /// Action keys read as [`Value::Null`]; they have no meaningful read
    /// value. Panics if the store has no such key (programmer error).
    pub fn get(&self, key: &str) -> Value {
        self.inner.resolve(key)
    }
}

/// Read/write receiver handed to action bodies.
pub struct StoreTxn {
    pub(crate) inner: Arc<StoreInner>,
}

impl StoreTxn {
    /// Resolve a key to its current value, as [`StoreView::get`].
    ///
    /// A read observes any write this same dispatch already performed.
    pub fn get(&self, key: &str) -> Value {
        self.inner.resolve(key)
    }

    /// Write a base key immediately and synchronously.
    ///
    /// Writing a derived or action key fails with
    /// [`StoreError::InvalidWrite`] naming the key; derived and action
    /// values are never assignable. Panics if the store has no such key.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), StoreError> {
        match self.inner.kind_of(key) {
            Some(EntryKind::Base) => {
                self.inner.root.write(key, value.into());
                Ok(())
            }
            Some(kind) => Err(StoreError::InvalidWrite {
                key: key.to_string(),
                kind,
            }),
            None => panic!("store has no key `{key}`"),
        }
    }
}
