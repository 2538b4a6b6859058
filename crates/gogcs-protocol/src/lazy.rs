//! Load-once fields with single-flight fetching
//!
//! A [`LazyField`] is either unloaded or holds a fully loaded, immutable
//! value behind an `Arc`. Concurrent first accesses are funneled through one
//! loader; every caller observes the same value or the loader's error. A
//! failed load leaves the field untouched, so a previously loaded value
//! survives a failed reload.

use parking_lot::RwLock;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

enum LoadState<T> {
    Unloaded,
    Loaded(Arc<T>),
}

/// Field populated on first access by an async loader
pub struct LazyField<T> {
    state: RwLock<LoadState<T>>,
    gate: Mutex<()>,
}

impl<T> LazyField<T> {
    /// Create an unloaded field
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LoadState::Unloaded),
            gate: Mutex::new(()),
        }
    }

    /// Create a field that is already loaded
    pub fn loaded(value: T) -> Self {
        Self {
            state: RwLock::new(LoadState::Loaded(Arc::new(value))),
            gate: Mutex::new(()),
        }
    }

    /// Current value, without loading
    pub fn get(&self) -> Option<Arc<T>> {
        match &*self.state.read() {
            LoadState::Unloaded => None,
            LoadState::Loaded(value) => Some(Arc::clone(value)),
        }
    }

    /// Check whether a value is present
    pub fn is_loaded(&self) -> bool {
        matches!(&*self.state.read(), LoadState::Loaded(_))
    }

    /// Return the value, running `load` if the field is unloaded
    ///
    /// At most one loader runs at a time. Callers that queued behind a
    /// successful loader receive its value without loading again.
    pub async fn get_or_load<F, Fut, E>(&self, load: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get() {
            return Ok(value);
        }

        let _guard = self.gate.lock().await;
        if let Some(value) = self.get() {
            return Ok(value);
        }

        let value = Arc::new(load().await?);
        *self.state.write() = LoadState::Loaded(Arc::clone(&value));
        Ok(value)
    }

    /// Run `load` and replace the value with its result
    ///
    /// Readers keep seeing the previous value until the new one is complete.
    pub async fn reload<F, Fut, E>(&self, load: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let _guard = self.gate.lock().await;

        let value = Arc::new(load().await?);
        *self.state.write() = LoadState::Loaded(Arc::clone(&value));
        Ok(value)
    }

    /// Drop the loaded value
    pub fn clear(&self) {
        *self.state.write() = LoadState::Unloaded;
    }
}

impl<T> Default for LazyField<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for LazyField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.state.read() {
            LoadState::Unloaded => f.write_str("Unloaded"),
            LoadState::Loaded(value) => f.debug_tuple("Loaded").field(value).finish(),
        }
    }
}
