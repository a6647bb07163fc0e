use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Dependency graph shared by every cell created under one runtime.
///
/// Reads are recorded against the currently active computation token; the
/// recorded set is compared-by-reset on each re-run: a computation's previous
/// reads are cleared before it runs again, so only the cells it actually read
/// last time can invalidate it.
pub(crate) struct DepGraph {
    /// Token of the computation currently evaluating, if any.
    active: Option<usize>,
    /// Cell id -> computations that read it during their last run.
    dependents: HashMap<usize, HashSet<usize>>,
    /// Computation id -> cell ids it read during its last run.
    reads: HashMap<usize, HashSet<usize>>,
    /// Watcher id -> callback to re-run when a read cell changes.
    watchers: HashMap<usize, Arc<dyn Fn() + Send + Sync>>,
    /// Derived cell id -> whether it must recompute on next read.
    stale: HashMap<usize, bool>,
}

impl DepGraph {
    fn new() -> Self {
        Self {
            active: None,
            dependents: HashMap::new(),
            reads: HashMap::new(),
            watchers: HashMap::new(),
            stale: HashMap::new(),
        }
    }

    fn clear_reads(&mut self, id: usize) {
        if let Some(read) = self.reads.remove(&id) {
            for cell_id in read {
                if let Some(deps) = self.dependents.get_mut(&cell_id) {
                    deps.remove(&id);
                }
            }
        }
    }

    pub(crate) fn remove_computation(&mut self, id: usize) {
        self.watchers.remove(&id);
        self.clear_reads(id);
    }

    /// Remove a derived cell entirely: its staleness entry, the reads it
    /// recorded, and the edges of anything that read it.
    pub(crate) fn remove_derived(&mut self, id: usize) {
        self.stale.remove(&id);
        self.clear_reads(id);
        if let Some(dependents) = self.dependents.remove(&id) {
            for dependent in dependents {
                if let Some(reads) = self.reads.get_mut(&dependent) {
                    reads.remove(&id);
                }
            }
        }
    }
}

/// Restores the active computation token when a tracked run ends, including
/// by panic. On unwind the partial read set recorded so far is discarded,
/// so a dead token cannot keep attracting edges or re-runs.
struct ActiveGuard<'a> {
    graph: &'a Mutex<DepGraph>,
    id: usize,
    prev: Option<usize>,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut graph) = self.graph.lock() {
            graph.active = self.prev;
            if std::thread::panicking() {
                graph.clear_reads(self.id);
            }
        }
    }
}

enum Invalidation {
    /// Derived cell that was fresh: marked stale, cascade to its dependents.
    MarkedStale,
    /// Already stale, or no longer registered: nothing to do.
    Settled,
    /// Watcher callback to re-run.
    Watcher(Arc<dyn Fn() + Send + Sync>),
}

/// A reactive runtime: id allocation plus one [`DepGraph`].
///
/// There is a process-wide global runtime by default; [`Runtime::scope`]
/// pushes a fresh isolated runtime onto a thread-local stack for the duration
/// of a closure, which keeps tests and embedded reactive islands from sharing
/// tracking state.
///
/// # Examples
///
/// ```
/// use canister::{Cell, Runtime};
///
/// Runtime::scope(|| {
///     let cell = Cell::new(0);
///     cell.set(42);
///     assert_eq!(cell.get(), 42);
/// });
/// // Runtime and all of its tracking state is dropped here.
/// ```
pub struct Runtime {
    next_id: AtomicUsize,
    graph: Arc<Mutex<DepGraph>>,
}

thread_local! {
    static RUNTIME_STACK: RefCell<Vec<Arc<Runtime>>> = const { RefCell::new(Vec::new()) };
}

impl Runtime {
    fn new() -> Arc<Self> {
        Arc::new(Runtime {
            next_id: AtomicUsize::new(0),
            graph: Arc::new(Mutex::new(DepGraph::new())),
        })
    }

    /// Run a function with a fresh isolated runtime as the current one.
    pub fn scope<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        Self::with_runtime(Self::new(), f)
    }

    /// The process-wide fallback runtime.
    pub fn global() -> Arc<Self> {
        use std::sync::OnceLock;
        static RUNTIME: OnceLock<Arc<Runtime>> = OnceLock::new();
        Arc::clone(RUNTIME.get_or_init(Self::new))
    }

    /// The current runtime: top of the thread-local stack, or the global one.
    pub fn current() -> Arc<Self> {
        RUNTIME_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .cloned()
                .unwrap_or_else(Self::global)
        })
    }

    /// Run a function with a specific runtime as the current one.
    pub fn with_runtime<F, R>(runtime: Arc<Self>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        RUNTIME_STACK.with(|stack| {
            stack.borrow_mut().push(runtime);
        });

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

        RUNTIME_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });

        match result {
            Ok(r) => r,
            Err(e) => std::panic::resume_unwind(e),
        }
    }

    /// Allocate the next unique id for a cell or computation.
    pub(crate) fn next_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Weak handle to the graph, for drop-time computation removal.
    pub(crate) fn graph_handle(&self) -> Weak<Mutex<DepGraph>> {
        Arc::downgrade(&self.graph)
    }

    /// Record that the active computation, if any, read `cell_id`.
    pub(crate) fn track_read(&self, cell_id: usize) {
        let mut graph = self.graph.lock().unwrap();
        if let Some(active) = graph.active {
            graph
                .dependents
                .entry(cell_id)
                .or_default()
                .insert(active);
            graph.reads.entry(active).or_default().insert(cell_id);
        }
    }

    /// Invalidate everything that read `cell_id`: derived cells are marked
    /// stale (transitively), watchers re-run immediately.
    pub(crate) fn notify(&self, cell_id: usize) {
        let dependents: Vec<usize> = {
            let graph = self.graph.lock().unwrap();
            graph
                .dependents
                .get(&cell_id)
                .map(|deps| deps.iter().copied().collect())
                .unwrap_or_default()
        };

        for id in dependents {
            self.invalidate(id);
        }
    }

    fn invalidate(&self, id: usize) {
        // Hold the lock only long enough to decide; cascading and watcher
        // callbacks re-enter the runtime.
        let step = {
            let mut graph = self.graph.lock().unwrap();
            if let Some(flag) = graph.stale.get_mut(&id) {
                if *flag {
                    Invalidation::Settled
                } else {
                    *flag = true;
                    Invalidation::MarkedStale
                }
            } else if let Some(run) = graph.watchers.get(&id) {
                Invalidation::Watcher(Arc::clone(run))
            } else {
                Invalidation::Settled
            }
        };

        match step {
            Invalidation::MarkedStale => {
                let dependents: Vec<usize> = {
                    let graph = self.graph.lock().unwrap();
                    graph
                        .dependents
                        .get(&id)
                        .map(|deps| deps.iter().copied().collect())
                        .unwrap_or_default()
                };
                for dependent in dependents {
                    self.invalidate(dependent);
                }
            }
            Invalidation::Watcher(run) => {
                self.with_computation(id, || run());
            }
            Invalidation::Settled => {}
        }
    }

    /// Run `f` with `id` as the active computation token.
    ///
    /// The computation's previous read set is cleared first, so each run
    /// records exactly the cells it actually read this time.
    pub(crate) fn with_computation<F, R>(&self, id: usize, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let prev = {
            let mut graph = self.graph.lock().unwrap();
            graph.clear_reads(id);
            graph.active.replace(id)
        };
        let _guard = ActiveGuard {
            graph: &self.graph,
            id,
            prev,
        };

        f()
    }

    /// Register a watcher callback under `id`.
    pub(crate) fn register_watcher(&self, id: usize, run: Arc<dyn Fn() + Send + Sync>) {
        let mut graph = self.graph.lock().unwrap();
        graph.watchers.insert(id, run);
    }

    /// Register a derived cell; it starts stale so the first read computes.
    pub(crate) fn register_derived(&self, id: usize) {
        let mut graph = self.graph.lock().unwrap();
        graph.stale.insert(id, true);
    }

    /// Whether a derived cell must recompute before its value is current.
    pub(crate) fn is_stale(&self, id: usize) -> bool {
        let graph = self.graph.lock().unwrap();
        graph.stale.get(&id).copied().unwrap_or(true)
    }

    /// Mark a derived cell's cache as current.
    pub(crate) fn mark_fresh(&self, id: usize) {
        let mut graph = self.graph.lock().unwrap();
        graph.stale.insert(id, false);
    }
}
