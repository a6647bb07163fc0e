use crate::runtime::Runtime;
use std::sync::{Arc, RwLock};

/// A reactive value cell.
///
/// Reading a cell inside a tracked computation records the dependency;
/// writing a cell invalidates everything that read it.
#[derive(Clone)]
pub struct Cell<T> {
    value: Arc<RwLock<T>>,
    id: usize,
}

impl<T: Clone + Send + Sync + 'static> Cell<T> {
    /// Create a new cell with the given initial value.
    pub fn new(initial: T) -> Self {
        let runtime = Runtime::current();
        Self {
            value: Arc::new(RwLock::new(initial)),
            id: runtime.next_id(),
        }
    }

    /// Current value, recorded as a dependency of the active computation.
    pub fn get(&self) -> T {
        let runtime = Runtime::current();
        runtime.track_read(self.id);
        self.value.read().unwrap().clone()
    }

    /// Current value without recording a dependency.
    pub fn get_untracked(&self) -> T {
        self.value.read().unwrap().clone()
    }

    /// Read the value with a function, without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let runtime = Runtime::current();
        runtime.track_read(self.id);
        let value = self.value.read().unwrap();
        f(&value)
    }

    /// Replace the value and invalidate dependents.
    pub fn set(&self, new_value: T) {
        *self.value.write().unwrap() = new_value;
        let runtime = Runtime::current();
        runtime.notify(self.id);
    }

    /// Update the value in place and invalidate dependents.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        {
            let mut value = self.value.write().unwrap();
            f(&mut value);
        }
        let runtime = Runtime::current();
        runtime.notify(self.id);
    }

    /// The cell's unique id within its runtime.
    pub fn id(&self) -> usize {
        self.id
    }
}
