//! Guarded lazy initialization for expensive process-wide resources.
//!
//! A [`CachedResource`] holds a handle that is constructed at most once per
//! process lifetime — model clients, prompt templates, embedding providers.
//! Construction runs on first access; every later access returns the same
//! `Arc`. Concurrent first-calls are serialized so the underlying
//! construction happens at most once, and a failed construction leaves the
//! cell empty so a later call may retry.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::error::Result;

/// A lazily-constructed, process-wide shared handle.
///
/// `T: ?Sized` so cells can hold trait objects (`CachedResource<dyn Foo>`).
pub struct CachedResource<T: ?Sized> {
    cell: OnceCell<Arc<T>>,
}

impl<T: ?Sized> CachedResource<T> {
    /// Create an empty cell; the first `get_or_try_init` constructs the value.
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Create a cell preseeded with an already-constructed handle.
    ///
    /// Used to inject test doubles or per-process overrides; the factory
    /// passed to `get_or_try_init` is then never invoked.
    pub fn preset(value: Arc<T>) -> Self {
        Self {
            cell: OnceCell::new_with(Some(value)),
        }
    }

    /// Return the cached handle, constructing it on first access.
    ///
    /// Construction failure propagates to the caller and is not cached:
    /// the next call runs the factory again. Under concurrent first access
    /// only one factory invocation runs; the others wait for its outcome.
    pub async fn get_or_try_init<F, Fut>(&self, factory: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<T>>>,
    {
        self.cell.get_or_try_init(factory).await.cloned()
    }

    /// Return the handle if it has already been constructed.
    pub fn get(&self) -> Option<Arc<T>> {
        self.cell.get().cloned()
    }
}

impl<T: ?Sized> Default for CachedResource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> std::fmt::Debug for CachedResource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedResource")
            .field("initialized", &self.cell.initialized())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
