//! Mutex-guarded handle for sharing one store between threads.

use crate::store::Datalink;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// Cloneable handle to a [`Datalink`] behind a mutex.
///
/// Every call goes through the lock, so operations from different threads
/// are serialized. Holding the guard across several calls makes them appear
/// as one step to other handles.
///
/// ```rust,no_run
/// use datalink::{Datalink, SharedDatalink};
///
/// let shared = SharedDatalink::new(Datalink::open("db.xml").unwrap());
/// let other = shared.clone();
/// std::thread::spawn(move || other.with(|db| db.set("hits", 1)).unwrap())
///     .join()
///     .unwrap();
/// assert!(shared.lock().contains("hits"));
/// ```
#[derive(Clone)]
pub struct SharedDatalink {
    inner: Arc<Mutex<Datalink>>,
}

impl SharedDatalink {
    /// Wrap an open store.
    pub fn new(store: Datalink) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Lock the store. The guard derefs to [`Datalink`].
    pub fn lock(&self) -> MutexGuard<'_, Datalink> {
        self.inner.lock()
    }

    /// Run `f` with the store locked.
    pub fn with<R>(&self, f: impl FnOnce(&mut Datalink) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Take the store back out if this is the last handle; otherwise hand the
    /// handle back.
    pub fn try_unwrap(self) -> Result<Datalink, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl From<Datalink> for SharedDatalink {
    fn from(store: Datalink) -> Self {
        Self::new(store)
    }
}

impl std::fmt::Debug for SharedDatalink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_lock() {
            Some(store) => std::fmt::Debug::fmt(&*store, f),
            None => f.write_str("SharedDatalink { <locked> }"),
        }
    }
}
