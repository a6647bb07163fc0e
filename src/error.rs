//! Error types for store operations.

use crate::store::EntryKind;
use thiserror::Error;

/// Errors surfaced by store writes and dispatches.
///
/// These cover misuse that a well-typed caller can hit at runtime because
/// store keys are resolved dynamically. Reading a key that does not exist at
/// all is a programmer error and panics instead of returning an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Attempted to assign to a key that is not base state. Derived and
    /// action values are never assignable.
    #[error("cannot assign to {kind} key `{key}`")]
    InvalidWrite { key: String, kind: EntryKind },

    /// Attempted to dispatch a key that is not an action.
    #[error("`{key}` is not an action")]
    NotAnAction { key: String },
}
