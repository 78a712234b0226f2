//! BottomDb: the durable bottom of a lamina stack
//!
//! Binds the store/walker contract to an on-disk ordered key-value engine
//! (`redb`). Everything above this layer is byte-ordered adapters; this crate
//! is where durability and write atomicity actually live:
//!
//! - `write` applies a whole batch inside one `redb` write transaction, which
//!   is what makes a transaction commit above it atomic;
//! - the walker runs its positioning queries against a fresh read snapshot
//!   per operation, keyed by the last observed key, so it tolerates mutation
//!   between operations the same way the in-memory walkers do.

use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadOnlyTable, TableDefinition, TableError};

use lamina_core::batch::{BatchOp, WriteBatch};
use lamina_core::error::{Error, Result};
use lamina_core::types::{Key, Value};
use lamina_core::{Store, Walker};

const TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("lamina");

fn store_err(err: impl std::fmt::Display) -> Error {
    Error::io(err.to_string())
}

/// Durable ordered store backed by a `redb` database file.
///
/// Cloning produces another handle to the same database.
#[derive(Clone, Debug)]
pub struct BottomDb {
    db: Arc<Database>,
}

impl BottomDb {
    /// Open `path`, creating the database file if it does not exist.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::create(path).map_err(store_err)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Create a fresh database at `path`; fails if the path already exists.
    pub fn create_new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Err(Error::io(format!(
                "database already exists: {}",
                path.display()
            )));
        }
        Self::create(path)
    }

    /// Open an existing database at `path`; fails if it does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::open(path).map_err(store_err)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Run `query` against a read snapshot of the table.
    ///
    /// A database that has never been written to has no table yet; that reads
    /// as empty, not as an error.
    fn snapshot<R>(
        &self,
        query: impl FnOnce(&ReadOnlyTable<&'static [u8], &'static [u8]>) -> Result<Option<R>>,
    ) -> Result<Option<R>> {
        let rtx = self.db.begin_read().map_err(store_err)?;
        let table = match rtx.open_table(TABLE) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(err) => return Err(store_err(err)),
        };
        query(&table)
    }
}

type Entry = Option<(Key, Value)>;

fn entry(
    item: Option<
        std::result::Result<
            (
                redb::AccessGuard<'_, &'static [u8]>,
                redb::AccessGuard<'_, &'static [u8]>,
            ),
            redb::StorageError,
        >,
    >,
) -> Result<Entry> {
    match item {
        Some(Ok((key, value))) => Ok(Some((key.value().to_vec(), value.value().to_vec()))),
        Some(Err(err)) => Err(store_err(err)),
        None => Ok(None),
    }
}

impl Store for BottomDb {
    type Walker = BottomWalker;

    fn get(&self, key: &[u8]) -> Result<Option<Value>> {
        let found = self.snapshot(|table| match table.get(key) {
            Ok(Some(guard)) => Ok(Some(guard.value().to_vec())),
            Ok(None) => Ok(None),
            Err(err) => Err(store_err(err)),
        })?;
        Ok(found)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let wtx = self.db.begin_write().map_err(store_err)?;
        {
            let mut table = wtx.open_table(TABLE).map_err(store_err)?;
            table.insert(key, value).map_err(store_err)?;
        }
        wtx.commit().map_err(store_err)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        let wtx = self.db.begin_write().map_err(store_err)?;
        {
            let mut table = wtx.open_table(TABLE).map_err(store_err)?;
            table.remove(key).map_err(store_err)?;
        }
        wtx.commit().map_err(store_err)
    }

    /// Apply the whole batch in one write transaction.
    fn write(&self, batch: &WriteBatch) -> Result<()> {
        let wtx = self.db.begin_write().map_err(store_err)?;
        {
            let mut table = wtx.open_table(TABLE).map_err(store_err)?;
            for op in batch {
                match op {
                    BatchOp::Put { key, value } => {
                        table
                            .insert(key.as_slice(), value.as_slice())
                            .map_err(store_err)?;
                    }
                    BatchOp::Delete { key } => {
                        table.remove(key.as_slice()).map_err(store_err)?;
                    }
                }
            }
        }
        wtx.commit().map_err(store_err)
    }

    fn walker(&self) -> BottomWalker {
        BottomWalker {
            store: self.clone(),
            row: None,
            failure: None,
        }
    }
}

/// Walker over a [`BottomDb`].
///
/// Each positioning operation queries a fresh read snapshot relative to the
/// last observed key, so deletions and insertions between operations resolve
/// exactly like the in-memory savepoint walkers. A failed query parks the
/// walker invalid and surfaces through `status`.
#[derive(Clone)]
pub struct BottomWalker {
    store: BottomDb,
    row: Option<(Key, Value)>,
    failure: Option<String>,
}

impl BottomWalker {
    fn apply(&mut self, outcome: Result<Entry>) {
        match outcome {
            Ok(row) => {
                self.row = row;
                self.failure = None;
            }
            Err(err) => {
                self.row = None;
                self.failure = Some(err.to_string());
            }
        }
    }
}

impl Walker for BottomWalker {
    fn valid(&self) -> bool {
        self.row.is_some()
    }

    fn seek_to_first(&mut self) {
        let outcome = self.store.snapshot(|table| {
            let mut range = table.range::<&[u8]>(..).map_err(store_err)?;
            entry(range.next())
        });
        self.apply(outcome);
    }

    fn seek_to_last(&mut self) {
        let outcome = self.store.snapshot(|table| {
            let range = table.range::<&[u8]>(..).map_err(store_err)?;
            entry(range.rev().next())
        });
        self.apply(outcome);
    }

    fn seek(&mut self, target: &[u8]) {
        let outcome = self.store.snapshot(|table| {
            let mut range = table
                .range::<&[u8]>((Bound::Included(target), Bound::Unbounded))
                .map_err(store_err)?;
            entry(range.next())
        });
        self.apply(outcome);
    }

    fn next(&mut self) {
        let Some(save) = self.row.as_ref().map(|(key, _)| key.clone()) else {
            return;
        };
        let outcome = self.store.snapshot(|table| {
            let mut range = table
                .range::<&[u8]>((Bound::Excluded(save.as_slice()), Bound::Unbounded))
                .map_err(store_err)?;
            entry(range.next())
        });
        self.apply(outcome);
    }

    fn prev(&mut self) {
        let save = self.row.as_ref().map(|(key, _)| key.clone());
        let outcome = self.store.snapshot(|table| match &save {
            None => {
                let range = table.range::<&[u8]>(..).map_err(store_err)?;
                entry(range.rev().next())
            }
            Some(save) => {
                let range = table.range::<&[u8]>(..save.as_slice()).map_err(store_err)?;
                entry(range.rev().next())
            }
        });
        self.apply(outcome);
    }

    fn key(&self) -> Option<Key> {
        self.row.as_ref().map(|(key, _)| key.clone())
    }

    fn value(&self) -> Option<Value> {
        self.row.as_ref().map(|(_, value)| value.clone())
    }

    fn status(&self) -> Result<()> {
        if let Some(failure) = &self.failure {
            return Err(Error::io(failure.clone()));
        }
        if self.valid() {
            Ok(())
        } else {
            Err(Error::not_found("invalid walker"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fresh() -> (TempDir, BottomDb) {
        let dir = TempDir::new().unwrap();
        let db = BottomDb::create(dir.path().join("store.redb")).unwrap();
        (dir, db)
    }

    #[test]
    fn test_point_operations_roundtrip() {
        let (_dir, db) = fresh();
        assert_eq!(db.get(b"a").unwrap(), None);

        db.put(b"a", b"1").unwrap();
        assert_eq!(db.get(b"a").unwrap(), Some(b"1".to_vec()));

        db.put(b"a", b"2").unwrap();
        assert_eq!(db.get(b"a").unwrap(), Some(b"2".to_vec()));

        db.delete(b"a").unwrap();
        assert_eq!(db.get(b"a").unwrap(), None);
        db.delete(b"a").unwrap();
    }

    #[test]
    fn test_batch_applies_in_order() {
        let (_dir, db) = fresh();
        let mut batch = WriteBatch::new();
        batch.put(b"a".to_vec(), b"1".to_vec());
        batch.put(b"b".to_vec(), b"2".to_vec());
        batch.delete(b"a".to_vec());
        batch.put(b"a".to_vec(), b"3".to_vec());
        db.write(&batch).unwrap();

        assert_eq!(db.get(b"a").unwrap(), Some(b"3".to_vec()));
        assert_eq!(db.get(b"b").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn test_walker_traversal_and_seek() {
        let (_dir, db) = fresh();
        for (key, value) in [("b", "1"), ("a", "2"), ("c", "3")] {
            db.put(key.as_bytes(), value.as_bytes()).unwrap();
        }

        let mut w = db.walker();
        w.seek_to_first();
        for (key, value) in [("a", "2"), ("b", "1"), ("c", "3")] {
            assert!(w.valid());
            assert_eq!(w.key().unwrap(), key.as_bytes());
            assert_eq!(w.value().unwrap(), value.as_bytes());
            w.next();
        }
        assert!(!w.valid());
        assert!(w.status().unwrap_err().is_not_found());

        w.seek_to_last();
        assert_eq!(w.key().unwrap(), b"c");
        w.prev();
        assert_eq!(w.key().unwrap(), b"b");

        w.seek(b"bb");
        assert_eq!(w.key().unwrap(), b"c");
        w.seek(b"zzz");
        assert!(!w.valid());
    }

    #[test]
    fn test_walker_on_empty_database() {
        let (_dir, db) = fresh();
        let mut w = db.walker();
        w.seek_to_first();
        assert!(!w.valid());
        w.seek_to_last();
        assert!(!w.valid());
    }

    #[test]
    fn test_walker_tolerates_mutation_between_ops() {
        let (_dir, db) = fresh();
        for key in ["a", "b", "c"] {
            db.put(key.as_bytes(), b"-").unwrap();
        }

        let mut w = db.walker();
        w.seek_to_first();
        assert_eq!(w.key().unwrap(), b"a");

        db.delete(b"b").unwrap();
        w.next();
        assert_eq!(w.key().unwrap(), b"c");

        db.put(b"d", b"-").unwrap();
        w.next();
        assert_eq!(w.key().unwrap(), b"d");
    }

    #[test]
    fn test_reopen_preserves_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.redb");
        {
            let db = BottomDb::create(&path).unwrap();
            db.put(b"k", b"v").unwrap();
        }
        let db = BottomDb::open(&path).unwrap();
        assert_eq!(db.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn test_create_new_refuses_existing_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.redb");
        let _db = BottomDb::create(&path).unwrap();

        let err = BottomDb::create_new(&path).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_open_refuses_missing_path() {
        let dir = TempDir::new().unwrap();
        let err = BottomDb::open(dir.path().join("absent.redb")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
