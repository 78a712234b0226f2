//! Sequence: paged monotonic allocator backed by one store record
//!
//! Hands out strictly increasing integers starting at zero, persisting only a
//! high-water mark: values are pre-allocated in pages so the backing record is
//! rewritten once per page instead of once per value. `sync` returns the
//! unused tail of the current page by lowering the persisted mark back to the
//! actual next value.
//!
//! ## Overflow
//!
//! Every value in `[0, T::MAX]` is emitted exactly once. When the page
//! arithmetic cannot advance the mark any further the allocator persists a
//! zero *sentinel* and reports `NotFound("sequence overflow")`; the sentinel
//! is re-read as "overflowed" on every later load, so exhaustion is permanent
//! for that record.
//!
//! ## Sharing
//!
//! The record belongs to exactly one live `Sequence` at a time. A concurrent
//! writer is detected by comparing the persisted mark against the last value
//! this allocator wrote, and reported as `Corruption`.

use std::cmp::min;
use std::marker::PhantomData;

use tracing::{debug, warn};

use lamina_core::endian::{decode, encode, NetInt};
use lamina_core::error::{Error, Result};
use lamina_core::types::Key;
use lamina_core::Store;

/// Default number of values pre-allocated per persisted mark update.
pub const DEFAULT_PAGE: u64 = 10;

/// Paged monotonic allocator over a single `(store, key)` record.
///
/// The record holds the allocated high-water mark as a fixed-width big-endian
/// integer of `T`'s width.
pub struct Sequence<S: Store, T: NetInt> {
    store: S,
    key: Key,
    /// Next value to emit, in raw integer space.
    next: u64,
    /// High-water mark persisted to the store; zero means "nothing loaded
    /// yet" before first use and "overflowed" once the sentinel is written.
    allocated: u64,
    page: u64,
    _tag: PhantomData<T>,
}

impl<S: Store, T: NetInt> Sequence<S, T> {
    /// Bind an allocator to the record under `key` with the default page.
    pub fn new(store: S, key: impl Into<Key>) -> Self {
        Self::with_page(store, key, DEFAULT_PAGE)
    }

    /// Bind an allocator with an explicit page size.
    pub fn with_page(store: S, key: impl Into<Key>, page: u64) -> Self {
        Self {
            store,
            key: key.into(),
            next: 0,
            allocated: 0,
            page: page.clamp(1, T::MAX_RAW),
            _tag: PhantomData,
        }
    }

    /// Emit the next value.
    ///
    /// `NotFound("sequence overflow")` once the counter is spent; the error
    /// repeats on every later call and across reopens.
    pub fn next(&mut self) -> Result<T> {
        if self.allocated == 0 {
            self.alloc_page()?;
        }
        let value = self.next;
        self.next = self.next.wrapping_add(1);
        if self.next > self.allocated || self.next == 0 {
            // the emitted value was the page boundary: pre-allocate for the
            // next request; a failure here surfaces on the following call
            if let Err(err) = self.alloc_page() {
                debug!(error = %err, "sequence pre-allocation failed");
            }
        }
        Ok(T::from_raw(value))
    }

    /// Read or advance the persisted mark by one page.
    ///
    /// On the first call this also adopts the persisted mark as the starting
    /// value, so a reopened sequence resumes past everything it may have
    /// handed out before.
    fn alloc_page(&mut self) -> Result<()> {
        match self.store.get(&self.key)? {
            Some(raw) => {
                let persisted: T = decode(&raw)
                    .map_err(|_| Error::corruption("sequence entry size mismatch"))?;
                if self.allocated == 0 {
                    self.allocated = persisted.as_raw();
                    if self.allocated == 0 {
                        return Err(Error::not_found("sequence overflow"));
                    }
                    self.next = self.allocated;
                } else if persisted.as_raw() != self.allocated {
                    return Err(Error::corruption("concurrent sequence change (entry mismatch)"));
                }
            }
            None => {
                if self.allocated != 0 {
                    return Err(Error::corruption("concurrent sequence change (missing entry)"));
                }
            }
        }

        // min(max, x + p) computed as min(max - p, x) + p to stay in range
        let next_mark = min(T::MAX_RAW - self.page, self.allocated) + self.page;
        if next_mark == self.allocated {
            // counter spent: persist the sentinel; the record is already
            // unusable, so the write itself is best-effort
            let _ = self.store.put(&self.key, &encode(T::from_raw(0)));
            self.allocated = 0;
            return Err(Error::not_found("sequence overflow"));
        }
        self.store.put(&self.key, &encode(T::from_raw(next_mark)))?;
        self.allocated = next_mark;
        Ok(())
    }

    /// Return the unused tail of the current page to the store.
    ///
    /// Lowers the persisted mark to the actual next value, after verifying
    /// nobody else advanced the record in the meantime.
    pub fn sync(&mut self) -> Result<()> {
        if self.next < self.allocated {
            let raw = self
                .store
                .get(&self.key)?
                .ok_or_else(|| Error::corruption("concurrent sequence change (missing entry)"))?;
            let persisted: T =
                decode(&raw).map_err(|_| Error::corruption("sequence entry size mismatch"))?;
            if persisted.as_raw() != self.allocated {
                return Err(Error::corruption("concurrent sequence change (entry mismatch)"));
            }
            self.store.put(&self.key, &encode(T::from_raw(self.next)))?;
            self.allocated = self.next;
        }
        Ok(())
    }
}

impl<S: Store, T: NetInt> Drop for Sequence<S, T> {
    fn drop(&mut self) {
        if let Err(err) = self.sync() {
            warn!(error = %err, "sequence sync on drop failed");
        }
    }
}
