//! MemoryDb: ordered in-memory store with a mutation-resilient walker
//!
//! The container is a `BTreeMap` of byte keys behind a shared handle; clones
//! of a `MemoryDb` see the same data, which is how walkers and the transaction
//! layer keep access to the map without borrowing it.
//!
//! ## Revisions and savepoints
//!
//! The map carries a revision counter bumped by every mutation that *removes*
//! entries (deleting a present key, clearing a non-empty map). Insertion and
//! replacement do not bump it: they cannot strand a walker, because a walker's
//! position is a key, not a container node.
//!
//! A walker holds the last entry it observed (its savepoint) plus the revision
//! at observation time. Movement operations compare revisions first: when the
//! map has changed, the walker re-establishes itself at the lower bound of the
//! savepoint before stepping. The net effect:
//!
//! - deleting the walker's current key makes the next `next()` land on the
//!   deleted key's successor, and the next `prev()` on its predecessor;
//! - insertions before the current position do not disturb forward traversal;
//! - `valid()`/`key()` never re-sync — a walker parked on a deleted key keeps
//!   reporting the last observation until it moves; `value()` reports the
//!   key's current value while the key exists.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use parking_lot::RwLock;

use lamina_core::error::{Error, Result};
use lamina_core::types::{Key, Value};
use lamina_core::{Store, Walker};

#[derive(Debug, Default)]
struct MemoryInner {
    rows: BTreeMap<Key, Value>,
    rev: u64,
}

impl MemoryInner {
    fn lower_bound(&self, target: &[u8]) -> Option<(&Key, &Value)> {
        self.rows
            .range::<[u8], _>((Bound::Included(target), Bound::Unbounded))
            .next()
    }

    fn after(&self, target: &[u8]) -> Option<(&Key, &Value)> {
        self.rows
            .range::<[u8], _>((Bound::Excluded(target), Bound::Unbounded))
            .next()
    }

    fn before(&self, target: &[u8]) -> Option<(&Key, &Value)> {
        self.rows
            .range::<[u8], _>((Bound::Unbounded, Bound::Excluded(target)))
            .next_back()
    }
}

fn cloned(entry: Option<(&Key, &Value)>) -> Option<(Key, Value)> {
    entry.map(|(k, v)| (k.clone(), v.clone()))
}

/// Ordered in-memory key-value store.
///
/// Cloning produces another handle to the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryDb {
    inner: Arc<RwLock<MemoryInner>>,
}

impl MemoryDb {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.inner.read().rows.len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.inner.read().rows.is_empty()
    }

    /// Remove every entry. Counts as a removal for walker resilience.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        if !inner.rows.is_empty() {
            inner.rev += 1;
            inner.rows.clear();
        }
    }

    /// Copy out all entries in key order.
    ///
    /// Used by the transaction layer to stage its overlay into a commit batch.
    pub fn entries(&self) -> Vec<(Key, Value)> {
        self.inner
            .read()
            .rows
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl<K: Into<Key>, V: Into<Value>> FromIterator<(K, V)> for MemoryDb {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let rows: BTreeMap<Key, Value> = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            inner: Arc::new(RwLock::new(MemoryInner { rows, rev: 0 })),
        }
    }
}

impl Store for MemoryDb {
    type Walker = MemoryWalker;

    fn get(&self, key: &[u8]) -> Result<Option<Value>> {
        Ok(self.inner.read().rows.get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.inner.write().rows.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.rows.remove(key).is_some() {
            inner.rev += 1;
        }
        Ok(())
    }

    fn walker(&self) -> MemoryWalker {
        MemoryWalker {
            rev: self.inner.read().rev,
            inner: Arc::clone(&self.inner),
            row: None,
        }
    }
}

/// Mutation-resilient walker over a [`MemoryDb`].
#[derive(Debug, Clone)]
pub struct MemoryWalker {
    inner: Arc<RwLock<MemoryInner>>,
    rev: u64,
    /// Savepoint: the entry observed at the last positioning operation.
    row: Option<(Key, Value)>,
}

impl Walker for MemoryWalker {
    fn valid(&self) -> bool {
        self.row.is_some()
    }

    fn seek_to_first(&mut self) {
        let (row, rev) = {
            let inner = self.inner.read();
            (cloned(inner.rows.iter().next()), inner.rev)
        };
        self.row = row;
        self.rev = rev;
    }

    fn seek_to_last(&mut self) {
        let (row, rev) = {
            let inner = self.inner.read();
            (cloned(inner.rows.iter().next_back()), inner.rev)
        };
        self.row = row;
        self.rev = rev;
    }

    fn seek(&mut self, target: &[u8]) {
        let (row, rev) = {
            let inner = self.inner.read();
            (cloned(inner.lower_bound(target)), inner.rev)
        };
        self.row = row;
        self.rev = rev;
    }

    fn next(&mut self) {
        // exhausted forward stays invalid
        let Some(save) = self.row.as_ref().map(|(k, _)| k.clone()) else {
            return;
        };
        let (row, rev) = {
            let inner = self.inner.read();
            let row = if self.rev != inner.rev {
                // the map changed: re-establish at the savepoint's lower bound
                match inner.lower_bound(&save) {
                    // the savepoint entry is gone; its successor is already
                    // the next record
                    Some((k, v)) if *k != save => Some((k.clone(), v.clone())),
                    Some(_) => cloned(inner.after(&save)),
                    None => None,
                }
            } else {
                cloned(inner.after(&save))
            };
            (row, inner.rev)
        };
        self.row = row;
        self.rev = rev;
    }

    fn prev(&mut self) {
        let save = self.row.as_ref().map(|(k, _)| k.clone());
        let (row, rev) = {
            let inner = self.inner.read();
            let row = match &save {
                // walking back from an exhausted walker re-enters at the last
                // entry
                None => cloned(inner.rows.iter().next_back()),
                // the strict predecessor of the savepoint is correct whether
                // or not the savepoint entry itself survived
                Some(save) => cloned(inner.before(save)),
            };
            (row, inner.rev)
        };
        self.row = row;
        self.rev = rev;
    }

    fn key(&self) -> Option<Key> {
        self.row.as_ref().map(|(k, _)| k.clone())
    }

    fn value(&self) -> Option<Value> {
        let (key, cached) = self.row.as_ref()?;
        // report the key's current value; a ghost entry keeps its last
        // observed value until the walker moves
        let inner = self.inner.read();
        Some(inner.rows.get(key).cloned().unwrap_or_else(|| cached.clone()))
    }

    fn status(&self) -> Result<()> {
        if self.valid() {
            Ok(())
        } else {
            Err(Error::not_found("invalid walker"))
        }
    }
}
