use std::sync::Arc;

/// A cell built from a paired read function and write function.
///
/// The pair has no tracking state of its own: reads and writes flow through
/// whatever cells the two functions touch, which is where dependencies are
/// recorded and invalidations originate.
pub struct WritableCell<T> {
    read: Arc<dyn Fn() -> T + Send + Sync>,
    write: Arc<dyn Fn(T) + Send + Sync>,
}

impl<T: 'static> WritableCell<T> {
    /// Create a writable cell from a read function and a write function.
    pub fn new<R, W>(read: R, write: W) -> Self
    where
        R: Fn() -> T + Send + Sync + 'static,
        W: Fn(T) + Send + Sync + 'static,
    {
        Self {
            read: Arc::new(read),
            write: Arc::new(write),
        }
    }

    /// Invoke the read function.
    pub fn get(&self) -> T {
        (self.read)()
    }

    /// Invoke the write function with a new value.
    pub fn set(&self, value: T) {
        (self.write)(value)
    }
}

impl<T> Clone for WritableCell<T> {
    fn clone(&self) -> Self {
        Self {
            read: Arc::clone(&self.read),
            write: Arc::clone(&self.write),
        }
    }
}
