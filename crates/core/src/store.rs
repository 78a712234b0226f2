//! Store: the ordered key-value contract
//!
//! An ordered mapping from byte keys to byte values with point operations,
//! batched writes, and walker creation. Layers implement `Store` over other
//! `Store`s, so a transaction over a sandwich part over a durable bottom store
//! is just a type.
//!
//! Two dispatch forms are provided, mirroring how the concrete layers are
//! meant to be used:
//! - the generic [`Store`] trait with an associated walker type, the primary
//!   path;
//! - the object-safe [`AnyStore`] erasure for clients that want uniform
//!   `dyn` dispatch over heterogeneous stores.

use std::sync::Arc;

use crate::batch::{BatchOp, WriteBatch};
use crate::error::Result;
use crate::types::Value;
use crate::walker::Walker;

/// Ordered key-value store.
///
/// Methods take `&self`: implementations guard their interior state so that
/// store handles stay cheap to clone and walkers can hold one.
pub trait Store {
    /// The walker type this store produces.
    type Walker: Walker;

    /// Look up a key. Absence is `Ok(None)`, not an error.
    fn get(&self, key: &[u8]) -> Result<Option<Value>>;

    /// Insert or replace a key.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Remove a key. Removing a missing key is `Ok`.
    fn delete(&self, key: &[u8]) -> Result<()>;

    /// Create a walker over this store's current key space.
    fn walker(&self) -> Self::Walker;

    /// Apply a batch of writes in submission order.
    ///
    /// The default replays the batch through `put`/`delete`; concrete backing
    /// stores override this to apply the batch atomically.
    fn write(&self, batch: &WriteBatch) -> Result<()> {
        for op in batch {
            match op {
                BatchOp::Put { key, value } => self.put(key, value)?,
                BatchOp::Delete { key } => self.delete(key)?,
            }
        }
        Ok(())
    }
}

impl<S: Store> Store for Arc<S> {
    type Walker = S::Walker;

    fn get(&self, key: &[u8]) -> Result<Option<Value>> {
        (**self).get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        (**self).delete(key)
    }

    fn walker(&self) -> Self::Walker {
        (**self).walker()
    }

    fn write(&self, batch: &WriteBatch) -> Result<()> {
        (**self).write(batch)
    }
}

/// Object-safe form of [`Store`].
///
/// Blanket-implemented for every store whose walker is `'static` (all walkers
/// in this workspace hold shared handles, not borrows). `Box<dyn AnyStore>`
/// implements [`Store`] again, so erased stores slot back into the generic
/// layers.
pub trait AnyStore {
    /// See [`Store::get`].
    fn get(&self, key: &[u8]) -> Result<Option<Value>>;

    /// See [`Store::put`].
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// See [`Store::delete`].
    fn delete(&self, key: &[u8]) -> Result<()>;

    /// See [`Store::walker`]; the walker type is erased.
    fn boxed_walker(&self) -> Box<dyn Walker>;

    /// See [`Store::write`].
    fn write(&self, batch: &WriteBatch) -> Result<()>;
}

impl<S> AnyStore for S
where
    S: Store,
    S::Walker: 'static,
{
    fn get(&self, key: &[u8]) -> Result<Option<Value>> {
        Store::get(self, key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        Store::put(self, key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        Store::delete(self, key)
    }

    fn boxed_walker(&self) -> Box<dyn Walker> {
        Box::new(self.walker())
    }

    fn write(&self, batch: &WriteBatch) -> Result<()> {
        Store::write(self, batch)
    }
}

impl Store for Box<dyn AnyStore> {
    type Walker = Box<dyn Walker>;

    fn get(&self, key: &[u8]) -> Result<Option<Value>> {
        (**self).get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        (**self).delete(key)
    }

    fn walker(&self) -> Self::Walker {
        (**self).boxed_walker()
    }

    fn write(&self, batch: &WriteBatch) -> Result<()> {
        (**self).write(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `AnyStore` must stay object-safe: it exists for `dyn` dispatch.
    #[test]
    fn test_any_store_is_object_safe() {
        fn accepts(_store: &dyn AnyStore) {}
        let _ = accepts as fn(&dyn AnyStore);
    }

    /// `Walker` must stay object-safe so erased stores can hand out walkers.
    #[test]
    fn test_walker_is_object_safe() {
        fn accepts(_walker: &dyn Walker) {}
        let _ = accepts as fn(&dyn Walker);
    }
}
