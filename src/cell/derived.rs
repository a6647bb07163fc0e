use crate::runtime::{DepGraph, Runtime};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

/// A read-only cell computed from other cells.
///
/// The compute function runs lazily: creation records nothing, the first
/// read evaluates it inside a tracked computation, and later reads return the
/// cached value until a cell it actually read has changed.
///
/// A computation that (transitively) reads its own cell is a caller error
/// and panics rather than recursing unboundedly.
#[derive(Clone)]
pub struct DerivedCell<T> {
    compute: Arc<dyn Fn() -> T + Send + Sync>,
    cached: Arc<RwLock<Option<T>>>,
    computing: Arc<AtomicBool>,
    id: usize,
    // Shared by every clone; the last one to drop unregisters the cell.
    _registration: Arc<Registration>,
}

/// Removes the cell's runtime entries when the last clone is dropped.
struct Registration {
    id: usize,
    graph: Weak<Mutex<DepGraph>>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some(graph) = self.graph.upgrade() {
            if let Ok(mut graph) = graph.lock() {
                graph.remove_derived(self.id);
            }
        }
    }
}

/// Clears the in-evaluation flag even if the compute function panics.
struct ComputeGuard<'a>(&'a AtomicBool);

impl Drop for ComputeGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<T: Clone + Send + Sync + 'static> DerivedCell<T> {
    /// Create a derived cell from a compute function.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let runtime = Runtime::current();
        let id = runtime.next_id();
        // Registered stale so the first read computes.
        runtime.register_derived(id);

        Self {
            compute: Arc::new(compute),
            cached: Arc::new(RwLock::new(None)),
            computing: Arc::new(AtomicBool::new(false)),
            id,
            _registration: Arc::new(Registration {
                id,
                graph: runtime.graph_handle(),
            }),
        }
    }

    /// Current value, recomputing first if a tracked dependency changed.
    pub fn get(&self) -> T {
        let runtime = Runtime::current();
        runtime.track_read(self.id);

        if runtime.is_stale(self.id) {
            if self.computing.swap(true, Ordering::SeqCst) {
                panic!(
                    "cyclic dependency: derived cell {} read during its own evaluation",
                    self.id
                );
            }
            let guard = ComputeGuard(&self.computing);
            let value = runtime.with_computation(self.id, || (self.compute)());
            drop(guard);

            *self.cached.write().unwrap() = Some(value.clone());
            runtime.mark_fresh(self.id);
            value
        } else {
            self.cached.read().unwrap().as_ref().unwrap().clone()
        }
    }

    /// Read the computed value with a function, without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let value = self.get();
        f(&value)
    }

    /// The cell's unique id within its runtime.
    pub fn id(&self) -> usize {
        self.id
    }
}
