//! Whiteout: ordered tombstone set
//!
//! Records keys that are logically absent from a lower layer. Same shape as
//! [`MemoryDb`](crate::MemoryDb) minus the values: a shared ordered set with a
//! revision counter bumped on removals, walked by the same savepoint-resilient
//! cursor.
//!
//! Insertion does not bump the revision: the membership change is observed by
//! walkers through the container itself on their next movement, and a new
//! member cannot strand an existing walker position.

use std::collections::BTreeSet;
use std::ops::Bound;
use std::sync::Arc;

use parking_lot::RwLock;

use lamina_core::error::{Error, Result};
use lamina_core::types::{Key, Value};
use lamina_core::Walker;

#[derive(Debug, Default)]
struct WhiteoutInner {
    rows: BTreeSet<Key>,
    rev: u64,
}

impl WhiteoutInner {
    fn lower_bound(&self, target: &[u8]) -> Option<&Key> {
        self.rows
            .range::<[u8], _>((Bound::Included(target), Bound::Unbounded))
            .next()
    }

    fn after(&self, target: &[u8]) -> Option<&Key> {
        self.rows
            .range::<[u8], _>((Bound::Excluded(target), Bound::Unbounded))
            .next()
    }

    fn before(&self, target: &[u8]) -> Option<&Key> {
        self.rows
            .range::<[u8], _>((Bound::Unbounded, Bound::Excluded(target)))
            .next_back()
    }
}

/// Ordered set of tombstoned keys.
///
/// Cloning produces another handle to the same set.
#[derive(Debug, Clone, Default)]
pub struct Whiteout {
    inner: Arc<RwLock<WhiteoutInner>>,
}

impl Whiteout {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` is tombstoned
    pub fn check(&self, key: &[u8]) -> bool {
        self.inner.read().rows.contains(key)
    }

    /// Add a tombstone. Returns `true` when the key was newly added.
    pub fn insert(&self, key: &[u8]) -> bool {
        self.inner.write().rows.insert(key.to_vec())
    }

    /// Drop a tombstone. Dropping a missing key is fine.
    pub fn delete(&self, key: &[u8]) {
        let mut inner = self.inner.write();
        if inner.rows.remove(key) {
            inner.rev += 1;
        }
    }

    /// Drop every tombstone.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        if !inner.rows.is_empty() {
            inner.rev += 1;
            inner.rows.clear();
        }
    }

    /// Number of tombstones
    pub fn len(&self) -> usize {
        self.inner.read().rows.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.inner.read().rows.is_empty()
    }

    /// Copy out all tombstoned keys in order.
    pub fn keys(&self) -> Vec<Key> {
        self.inner.read().rows.iter().cloned().collect()
    }

    /// Create a walker over the set.
    pub fn walker(&self) -> WhiteoutWalker {
        WhiteoutWalker {
            rev: self.inner.read().rev,
            inner: Arc::clone(&self.inner),
            row: None,
        }
    }
}

impl<K: Into<Key>> FromIterator<K> for Whiteout {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let rows: BTreeSet<Key> = iter.into_iter().map(Into::into).collect();
        Self {
            inner: Arc::new(RwLock::new(WhiteoutInner { rows, rev: 0 })),
        }
    }
}

/// Mutation-resilient walker over a [`Whiteout`].
///
/// Carries keys only; `value()` is always `None`.
///
/// Unlike the map walker, validity here goes stale the moment the set
/// shrinks: the observed member itself may be the one that was dropped, and a
/// tombstone that no longer exists must not keep masking a key. Consumers
/// (the difference walker) treat a stale walker as unpositioned and re-seek
/// it; any movement operation freshens it again.
#[derive(Debug, Clone)]
pub struct WhiteoutWalker {
    inner: Arc<RwLock<WhiteoutInner>>,
    rev: u64,
    /// Savepoint: the key observed at the last positioning operation.
    row: Option<Key>,
}

impl Walker for WhiteoutWalker {
    fn valid(&self) -> bool {
        self.row.is_some() && self.rev == self.inner.read().rev
    }

    fn seek_to_first(&mut self) {
        let (row, rev) = {
            let inner = self.inner.read();
            (inner.rows.iter().next().cloned(), inner.rev)
        };
        self.row = row;
        self.rev = rev;
    }

    fn seek_to_last(&mut self) {
        let (row, rev) = {
            let inner = self.inner.read();
            (inner.rows.iter().next_back().cloned(), inner.rev)
        };
        self.row = row;
        self.rev = rev;
    }

    fn seek(&mut self, target: &[u8]) {
        let (row, rev) = {
            let inner = self.inner.read();
            (inner.lower_bound(target).cloned(), inner.rev)
        };
        self.row = row;
        self.rev = rev;
    }

    fn next(&mut self) {
        let Some(save) = self.row.clone() else {
            return;
        };
        let (row, rev) = {
            let inner = self.inner.read();
            let row = if self.rev != inner.rev {
                match inner.lower_bound(&save) {
                    // savepoint gone; already re-established on the successor
                    Some(k) if *k != save => Some(k.clone()),
                    Some(_) => inner.after(&save).cloned(),
                    None => None,
                }
            } else {
                inner.after(&save).cloned()
            };
            (row, inner.rev)
        };
        self.row = row;
        self.rev = rev;
    }

    fn prev(&mut self) {
        let save = self.row.clone();
        let (row, rev) = {
            let inner = self.inner.read();
            let row = match &save {
                None => inner.rows.iter().next_back().cloned(),
                Some(save) => inner.before(save).cloned(),
            };
            (row, inner.rev)
        };
        self.row = row;
        self.rev = rev;
    }

    fn key(&self) -> Option<Key> {
        self.row.clone()
    }

    fn value(&self) -> Option<Value> {
        None
    }

    fn status(&self) -> Result<()> {
        if self.valid() {
            Ok(())
        } else {
            Err(Error::not_found("invalid walker"))
        }
    }
}
