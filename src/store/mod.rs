//! The store factory: one plain state definition in, one cell per key out.
//!
//! [`create_store`] classifies a [`StoreDef`] into base fields, derived
//! values, and actions, aggregates base state into one composite cell, and
//! installs exactly one handle per original key. Consumers read, write, and
//! dispatch individual keys without re-evaluating the rest of the store.

mod def;
mod receiver;
mod root;
mod store;

pub use def::{EntryKind, Patch, StoreDef};
pub use receiver::{StoreTxn, StoreView};
pub use store::{create_store, ActionCell, Handle, Store};
