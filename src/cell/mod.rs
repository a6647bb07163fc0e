//! Fine-grained reactive primitives.
//!
//! The building blocks the store factory assembles its cell graph from:
//! - [`Cell`]: a reactive value container
//! - [`DerivedCell`]: a lazy, cached computation over other cells
//! - [`WritableCell`]: a paired read function and write function
//! - [`Effect`]: a side effect that re-runs when its dependencies change

mod cell;
mod derived;
mod effect;
mod writable;

pub use cell::Cell;
pub use derived::DerivedCell;
pub use effect::Effect;
pub use writable::WritableCell;
