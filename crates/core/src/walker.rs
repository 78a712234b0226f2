//! Walker: the bidirectional seekable cursor contract
//!
//! A walker is a logical position in the ordered key space of some store:
//! either *invalid* (past-the-end, before-begin, lost) or at a present key.
//! All layered stores in the workspace expose their merged view through this
//! one contract, which is what lets walkers stack: a transaction walker is an
//! overlay-merge walker over a difference walker over a base walker.
//!
//! ## Positioning vs observation
//!
//! Movement operations (`seek*`, `next`, `prev`) take `&mut self` and are the
//! only points where a walker re-establishes its position. The observers
//! (`valid`, `key`, `value`, `status`) never move or resynchronize the walker:
//! `key` reports the position observed by the last movement, and `value` the
//! current value under that key where the backing store can answer cheaply. A
//! caller traversing a container that is mutated mid-walk must therefore move
//! the walker between observations.

use crate::error::Result;
use crate::types::{Key, Value};

/// Bidirectional seekable cursor over an ordered key space.
pub trait Walker {
    /// Whether the walker currently points at an entry.
    ///
    /// Cheap, and never moves the walker.
    fn valid(&self) -> bool;

    /// Position at the first entry; invalid if the store is empty.
    fn seek_to_first(&mut self);

    /// Position at the last entry; invalid if the store is empty.
    fn seek_to_last(&mut self);

    /// Position at the smallest key ≥ `target` (lower bound); invalid if no
    /// such key exists.
    fn seek(&mut self, target: &[u8]);

    /// Advance to the next entry. From the last entry the walker becomes
    /// invalid; from an invalid position it stays invalid.
    fn next(&mut self);

    /// Step back to the previous entry. From the first entry the walker
    /// becomes invalid; from an invalid position it re-enters at the last
    /// entry, so reverse traversal can resume after walking off either end.
    fn prev(&mut self);

    /// The key at the current position, or `None` when invalid.
    fn key(&self) -> Option<Key>;

    /// The value at the current position, or `None` when invalid or when the
    /// walked container carries keys only.
    fn value(&self) -> Option<Value>;

    /// `Ok` when valid, `NotFound` when invalid by position, otherwise the
    /// backing store's error.
    fn status(&self) -> Result<()>;
}

impl<W: Walker + ?Sized> Walker for Box<W> {
    fn valid(&self) -> bool {
        (**self).valid()
    }

    fn seek_to_first(&mut self) {
        (**self).seek_to_first()
    }

    fn seek_to_last(&mut self) {
        (**self).seek_to_last()
    }

    fn seek(&mut self, target: &[u8]) {
        (**self).seek(target)
    }

    fn next(&mut self) {
        (**self).next()
    }

    fn prev(&mut self) {
        (**self).prev()
    }

    fn key(&self) -> Option<Key> {
        (**self).key()
    }

    fn value(&self) -> Option<Value> {
        (**self).value()
    }

    fn status(&self) -> Result<()> {
        (**self).status()
    }
}
