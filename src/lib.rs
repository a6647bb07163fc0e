//! # Canister
//!
//! A reactive store factory for Rust.
//!
//! Canister turns a single plain description of state into a set of
//! independently addressable reactive cells, so consumers can subscribe to,
//! derive from, or mutate individual pieces of state without touching the
//! rest of the store.
//!
//! ## Cells (low-level primitives)
//!
//! Fine-grained reactive building blocks:
//! - [`Cell<T>`] - reactive values that invalidate dependents when changed
//! - [`DerivedCell<T>`] - cached computations that track what they read
//! - [`WritableCell<T>`] - a paired read function and write function
//! - [`Effect`] - side effects that re-run when dependencies change
//!
//! ## Store (the factory)
//!
//! A [`StoreDef`] declares each key as exactly one of base state, derived
//! value, or action; [`create_store`] builds the cell graph:
//!
//! ```
//! use canister::{create_store, Patch, StoreDef, Value};
//!
//! let store = create_store(
//!     StoreDef::new()
//!         .base("count", 0)
//!         .derived("double", |view| {
//!             Value::Int(view.get("count").as_int().unwrap() * 2)
//!         })
//!         .action("increment", |txn, args| {
//!             let n = args.first().and_then(Value::as_int).unwrap_or(1);
//!             let count = txn.get("count").as_int().unwrap();
//!             Ok(Patch::new().with("count", count + n))
//!         }),
//! );
//!
//! store.dispatch("increment", &[]).unwrap();
//! assert_eq!(store.get("double"), Value::Int(2));
//! ```
//!
//! All base fields live in one composite cell, replaced wholesale on every
//! write, so a multi-key patch returned from an action is observed by
//! dependents as a single consistent transition.

pub mod cell;
pub mod error;
pub mod runtime;
pub mod store;
pub mod value;

// Re-export the main types for convenience.
pub use cell::{Cell, DerivedCell, Effect, WritableCell};
pub use error::StoreError;
pub use runtime::Runtime;
pub use store::{create_store, EntryKind, Handle, Patch, Store, StoreDef, StoreTxn, StoreView};
pub use value::Value;
