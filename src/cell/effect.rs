use crate::runtime::{DepGraph, Runtime};
use std::sync::{Arc, Mutex, Weak};

/// A side effect that re-runs when a cell it read changes.
///
/// The callback runs once immediately to record its dependencies, then again
/// whenever one of them is invalidated. Dropping the effect unregisters it.
pub struct Effect {
    id: usize,
    graph: Weak<Mutex<DepGraph>>,
}

impl Effect {
    /// Create an effect; runs the callback immediately.
    pub fn new<F>(run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let runtime = Runtime::current();
        let id = runtime.next_id();
        let run = Arc::new(run);

        runtime.register_watcher(id, Arc::clone(&run) as Arc<dyn Fn() + Send + Sync>);
        runtime.with_computation(id, || run());

        Self {
            id,
            graph: runtime.graph_handle(),
        }
    }
}

impl Drop for Effect {
    fn drop(&mut self) {
        if let Some(graph) = self.graph.upgrade() {
            if let Ok(mut graph) = graph.lock() {
                graph.remove_computation(self.id);
            }
        }
    }
}
