//! TxnDb: staged transaction over any store
//!
//! Writes land in an in-memory overlay, deletes in a tombstone set; the base
//! store is untouched until `commit`. Reads and walkers see the staged view:
//! `Cover(Subtract(base, tombstones), overlay)`.
//!
//! ## Live walkers
//!
//! A walker opened on a transaction stays correct while the transaction keeps
//! mutating. The transaction keeps a registry of weak handles to the shared
//! state of every live walker and pushes `overlay_put`/`overlay_delete`
//! notifications into them; the cover walker uses those to re-sync its overlay
//! side (see [`CoverWalker`]). Dropped walkers leave dead handles that are
//! pruned on the next notification.
//!
//! The base side of the view is assumed immutable for the lifetime of the
//! transaction.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

use lamina_core::batch::WriteBatch;
use lamina_core::error::Result;
use lamina_core::types::{Key, Value};
use lamina_core::{Store, Walker};
use lamina_storage::memory::{MemoryDb, MemoryWalker};
use lamina_storage::whiteout::Whiteout;

use crate::cover::CoverWalker;
use crate::subtract::SubtractWalker;

type TxnView<S> = CoverWalker<SubtractWalker<<S as Store>::Walker>, MemoryWalker>;
type Registry<S> = Arc<Mutex<Vec<Weak<Mutex<TxnView<S>>>>>>;

/// Staged transaction layer over a base store.
///
/// Implements the full store contract itself, so transactions nest and stack
/// under the other adapters.
pub struct TxnDb<S: Store> {
    base: S,
    overlay: MemoryDb,
    whiteout: Whiteout,
    walkers: Registry<S>,
}

impl<S: Store> TxnDb<S> {
    /// Start an empty transaction over `base`.
    pub fn new(base: S) -> Self {
        Self {
            base,
            overlay: MemoryDb::new(),
            whiteout: Whiteout::new(),
            walkers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The wrapped base store.
    pub fn base(&self) -> &S {
        &self.base
    }

    /// Whether the transaction has no staged writes or deletes.
    pub fn is_clean(&self) -> bool {
        self.overlay.is_empty() && self.whiteout.is_empty()
    }

    /// Apply all staged operations to the base store as one atomic batch and
    /// clear the transaction.
    ///
    /// Tombstone deletes go into the batch before overlay puts, so a key that
    /// was deleted and then rewritten inside the transaction ends up written.
    pub fn commit(&self) -> Result<()> {
        let deletes = self.whiteout.keys();
        let puts = self.overlay.entries();
        let mut batch = WriteBatch::with_capacity(deletes.len() + puts.len());
        for key in deletes {
            batch.delete(key);
        }
        for (key, value) in puts {
            batch.put(key, value);
        }
        debug!(ops = batch.len(), "committing staged transaction");
        self.base.write(&batch)?;
        self.overlay.clear();
        self.whiteout.clear();
        Ok(())
    }

    /// Discard all staged operations without touching the base store.
    pub fn reset(&self) {
        debug!("resetting staged transaction");
        self.overlay.clear();
        self.whiteout.clear();
    }

    fn notify_put(&self, key: &[u8]) {
        self.walkers.lock().retain(|slot| match slot.upgrade() {
            Some(view) => {
                view.lock().overlay_put(key);
                true
            }
            None => false,
        });
    }

    fn notify_delete(&self, key: &[u8]) {
        self.walkers.lock().retain(|slot| match slot.upgrade() {
            Some(view) => {
                view.lock().overlay_delete(key);
                true
            }
            None => false,
        });
    }
}

impl<S: Store> Store for TxnDb<S> {
    type Walker = TxnWalker<S>;

    fn get(&self, key: &[u8]) -> Result<Option<Value>> {
        if self.whiteout.check(key) {
            return Ok(None);
        }
        if let Some(value) = self.overlay.get(key)? {
            return Ok(Some(value));
        }
        self.base.get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.whiteout.delete(key);
        self.overlay.put(key, value)?;
        self.notify_put(key);
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        if !self.whiteout.insert(key) {
            // already tombstoned; nothing changes, walkers hear nothing
            return Ok(());
        }
        self.notify_delete(key);
        self.overlay.delete(key)
    }

    fn walker(&self) -> TxnWalker<S> {
        let view = CoverWalker::new(
            SubtractWalker::new(self.base.walker(), &self.whiteout),
            self.overlay.walker(),
        );
        let view = Arc::new(Mutex::new(view));
        self.walkers.lock().push(Arc::downgrade(&view));
        TxnWalker {
            view,
            registry: Arc::clone(&self.walkers),
        }
    }
}

/// Walker over a transaction's staged view.
///
/// Registered with its transaction for live notifications; unregisters itself
/// on drop. Clones register independently and continue from the same
/// position.
pub struct TxnWalker<S: Store> {
    view: Arc<Mutex<TxnView<S>>>,
    registry: Registry<S>,
}

impl<S: Store> Walker for TxnWalker<S> {
    fn valid(&self) -> bool {
        self.view.lock().valid()
    }

    fn seek_to_first(&mut self) {
        self.view.lock().seek_to_first()
    }

    fn seek_to_last(&mut self) {
        self.view.lock().seek_to_last()
    }

    fn seek(&mut self, target: &[u8]) {
        self.view.lock().seek(target)
    }

    fn next(&mut self) {
        self.view.lock().next()
    }

    fn prev(&mut self) {
        self.view.lock().prev()
    }

    fn key(&self) -> Option<Key> {
        self.view.lock().key()
    }

    fn value(&self) -> Option<Value> {
        self.view.lock().value()
    }

    fn status(&self) -> Result<()> {
        self.view.lock().status()
    }
}

impl<S: Store> Clone for TxnWalker<S>
where
    S::Walker: Clone,
{
    fn clone(&self) -> Self {
        let view = Arc::new(Mutex::new(self.view.lock().clone()));
        self.registry.lock().push(Arc::downgrade(&view));
        Self {
            view,
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<S: Store> Drop for TxnWalker<S> {
    fn drop(&mut self) {
        let own = Arc::downgrade(&self.view);
        self.registry
            .lock()
            .retain(|slot| !slot.ptr_eq(&own) && slot.strong_count() > 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> MemoryDb {
        [("b", "1"), ("a", "2"), ("c", "3")].into_iter().collect()
    }

    #[test]
    fn test_staged_reads_and_base_isolation() {
        let db = base();
        let txn = TxnDb::new(db.clone());

        assert_eq!(txn.get(b"a").unwrap(), Some(b"2".to_vec()));

        txn.put(b"a", b"4").unwrap();
        assert_eq!(txn.get(b"a").unwrap(), Some(b"4".to_vec()));
        assert_eq!(db.get(b"a").unwrap(), Some(b"2".to_vec()));

        txn.delete(b"b").unwrap();
        assert_eq!(txn.get(b"b").unwrap(), None);
        assert_eq!(db.get(b"b").unwrap(), Some(b"1".to_vec()));
        assert!(!txn.is_clean());
    }

    #[test]
    fn test_walker_sees_staged_view() {
        let db = base();
        let txn = TxnDb::new(db.clone());
        txn.put(b"a", b"4").unwrap();
        txn.delete(b"b").unwrap();

        let mut w = txn.walker();
        w.seek_to_first();
        assert_eq!(w.key().unwrap(), b"a");
        assert_eq!(w.value().unwrap(), b"4");
        w.next();
        assert_eq!(w.key().unwrap(), b"c");
        assert_eq!(w.value().unwrap(), b"3");
        w.next();
        assert!(!w.valid());
    }

    #[test]
    fn test_commit_applies_atomically_and_clears() {
        let db = base();
        let txn = TxnDb::new(db.clone());
        txn.put(b"a", b"4").unwrap();
        txn.delete(b"b").unwrap();

        txn.commit().unwrap();

        assert_eq!(db.get(b"a").unwrap(), Some(b"4".to_vec()));
        assert_eq!(db.get(b"b").unwrap(), None);
        assert!(txn.is_clean());

        // a committed transaction no longer shadows the base
        db.put(b"a", b"5").unwrap();
        assert_eq!(txn.get(b"a").unwrap(), Some(b"5".to_vec()));
    }

    #[test]
    fn test_delete_then_put_commits_the_put() {
        let db = base();
        let txn = TxnDb::new(db.clone());
        txn.delete(b"a").unwrap();
        txn.put(b"a", b"9").unwrap();

        txn.commit().unwrap();
        assert_eq!(db.get(b"a").unwrap(), Some(b"9".to_vec()));
    }

    #[test]
    fn test_reset_discards_staged_state() {
        let db = base();
        let txn = TxnDb::new(db.clone());
        txn.put(b"z", b"9").unwrap();
        txn.delete(b"a").unwrap();

        txn.reset();
        assert!(txn.is_clean());
        assert_eq!(txn.get(b"z").unwrap(), None);
        assert_eq!(txn.get(b"a").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn test_insert_between_live_walker_positions() {
        let db: MemoryDb = [("a", "2"), ("d", "4")].into_iter().collect();
        let txn = TxnDb::new(db);
        txn.put(b"c", b"3").unwrap();

        let mut w = txn.walker();
        w.seek_to_first();
        assert_eq!(w.key().unwrap(), b"a");

        txn.put(b"b", b"1").unwrap();
        assert_eq!(w.key().unwrap(), b"a");

        w.next();
        assert_eq!(w.key().unwrap(), b"b");
        w.next();
        assert_eq!(w.key().unwrap(), b"c");
        w.next();
        assert_eq!(w.key().unwrap(), b"d");
        w.next();
        assert!(!w.valid());
    }

    #[test]
    fn test_delete_current_key_under_live_walker() {
        let db = base();
        let txn = TxnDb::new(db.clone());

        let mut w = txn.walker();
        w.seek_to_first();
        assert_eq!(w.key().unwrap(), b"a");

        txn.delete(b"a").unwrap();
        assert_eq!(txn.get(b"a").unwrap(), None);
        assert_eq!(db.get(b"a").unwrap(), Some(b"2".to_vec()));

        w.next();
        assert!(w.valid());
        assert_eq!(w.key().unwrap(), b"b");
    }

    #[test]
    fn test_delete_then_put_under_live_walker() {
        let db = base();
        let txn = TxnDb::new(db);

        let mut w = txn.walker();
        w.seek_to_first();
        assert_eq!(w.key().unwrap(), b"a");

        txn.delete(b"b").unwrap();
        w.seek_to_first();
        assert_eq!(w.key().unwrap(), b"a");

        txn.put(b"b", b"4").unwrap();
        assert_eq!(w.key().unwrap(), b"a");

        w.next();
        assert_eq!(w.key().unwrap(), b"b");
        assert_eq!(w.value().unwrap(), b"4");
        w.next();
        assert_eq!(w.key().unwrap(), b"c");
        w.next();
        assert!(!w.valid());
    }

    #[test]
    fn test_staged_put_then_delete_under_live_walker() {
        let db: MemoryDb = [("b", "1"), ("c", "3")].into_iter().collect();
        let txn = TxnDb::new(db.clone());

        let mut w = txn.walker();
        txn.put(b"a", b"2").unwrap();
        assert_eq!(txn.get(b"a").unwrap(), Some(b"2".to_vec()));
        assert_eq!(db.get(b"a").unwrap(), None);

        w.seek_to_first();
        assert_eq!(w.key().unwrap(), b"a");

        txn.delete(b"a").unwrap();
        w.next();
        assert!(w.valid());
        assert_eq!(w.key().unwrap(), b"b");
    }

    #[test]
    fn test_dropped_walker_unregisters() {
        let db = base();
        let txn = TxnDb::new(db);

        let w1 = txn.walker();
        let w2 = txn.walker();
        assert_eq!(txn.walkers.lock().len(), 2);

        drop(w1);
        assert_eq!(txn.walkers.lock().len(), 1);

        // notifications keep flowing to the survivor
        txn.put(b"z", b"1").unwrap();
        drop(w2);
        assert!(txn.walkers.lock().is_empty());
    }

    #[test]
    fn test_cloned_walker_registers_and_diverges() {
        let db = base();
        let txn = TxnDb::new(db);

        let mut w1 = txn.walker();
        w1.seek_to_first();
        let mut w2 = w1.clone();
        assert_eq!(txn.walkers.lock().len(), 2);

        w2.next();
        assert_eq!(w1.key().unwrap(), b"a");
        assert_eq!(w2.key().unwrap(), b"b");
    }

    #[test]
    fn test_txn_nests_over_txn() {
        let db = base();
        let outer = Arc::new(TxnDb::new(db.clone()));
        outer.put(b"d", b"4").unwrap();

        let inner = TxnDb::new(Arc::clone(&outer));
        inner.put(b"e", b"5").unwrap();
        inner.delete(b"a").unwrap();

        // inner stages over the outer's staged view
        assert_eq!(inner.get(b"d").unwrap(), Some(b"4".to_vec()));
        assert_eq!(outer.get(b"e").unwrap(), None);

        inner.commit().unwrap();
        assert_eq!(outer.get(b"e").unwrap(), Some(b"5".to_vec()));
        assert_eq!(outer.get(b"a").unwrap(), None);
        // the real base is untouched until the outer commit
        assert_eq!(db.get(b"e").unwrap(), None);
        assert_eq!(db.get(b"a").unwrap(), Some(b"2".to_vec()));

        outer.commit().unwrap();
        assert_eq!(db.get(b"e").unwrap(), Some(b"5".to_vec()));
        assert_eq!(db.get(b"a").unwrap(), None);
    }
}
