//! Runtime support for the reactive primitives.
//!
//! This module owns the explicit tracking scope: a currently-active
//! computation token that every cell read registers against, and the
//! dependency graph used to decide what goes stale when a cell changes.

mod context;

pub use context::Runtime;
pub(crate) use context::DepGraph;
