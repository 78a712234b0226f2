//! RefStore: non-owning store wrapper
//!
//! Lets several decorators stack over one base without moving it: two
//! transactions over the same store, or a sandwich and a transaction over the
//! same bottom layer. The wrapper borrows the base, so it cannot outlive it.

use lamina_core::batch::WriteBatch;
use lamina_core::error::Result;
use lamina_core::types::Value;
use lamina_core::Store;

/// Borrowing wrapper that forwards the full store contract to `base`.
#[derive(Debug)]
pub struct RefStore<'a, S: Store> {
    base: &'a S,
}

impl<'a, S: Store> RefStore<'a, S> {
    /// Wrap a borrowed base store
    pub fn new(base: &'a S) -> Self {
        Self { base }
    }
}

impl<S: Store> Clone for RefStore<'_, S> {
    fn clone(&self) -> Self {
        Self { base: self.base }
    }
}

impl<S: Store> Store for RefStore<'_, S> {
    type Walker = S::Walker;

    fn get(&self, key: &[u8]) -> Result<Option<Value>> {
        self.base.get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.base.put(key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.base.delete(key)
    }

    fn walker(&self) -> Self::Walker {
        self.base.walker()
    }

    fn write(&self, batch: &WriteBatch) -> Result<()> {
        self.base.write(batch)
    }
}
