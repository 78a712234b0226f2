//! SandwichDb: the namespaced multiplexer
//!
//! Binds names to prefix tags and hands out [`Part`]s. The mapping lives in
//! the store itself, under the reserved meta part (prefix zero): one record
//! per name (name → big-endian prefix) plus the [`Sequence`] state under the
//! empty key. Prefixes are allocated once and never reused, so a name keeps
//! its slice for the lifetime of the physical store.

use std::sync::Arc;

use parking_lot::Mutex;

use lamina_core::endian::{decode, encode, NetInt};
use lamina_core::error::{Error, Result};
use lamina_core::types::Value;
use lamina_core::Store;

use crate::part::Part;
use crate::sequence::Sequence;

/// Multiplexer slicing one physical store into named logical parts.
pub struct SandwichDb<S: Store, P: NetInt = u16> {
    base: Arc<S>,
    seq: Mutex<Sequence<Part<S, P>, P>>,
}

impl<S: Store, P: NetInt> SandwichDb<S, P> {
    /// Build a sandwich over `base`.
    ///
    /// An existing store keeps its mapping: names cooked in an earlier
    /// session resolve to their original prefixes.
    pub fn new(base: S) -> Self {
        let base = Arc::new(base);
        let meta = Part::new(Arc::clone(&base), P::from_raw(0));
        Self {
            base,
            seq: Mutex::new(Sequence::new(meta, Vec::new())),
        }
    }

    fn meta(&self) -> Part<S, P> {
        Part::new(Arc::clone(&self.base), P::from_raw(0))
    }

    /// The physical store underneath.
    pub fn base(&self) -> &S {
        &self.base
    }

    /// Resolve `name` to its prefix cookie, allocating one on first use.
    ///
    /// Errors: `InvalidArgument` for an empty name, `Corruption` for a
    /// malformed mapping record, `NotFound("sequence overflow")` once every
    /// prefix has been handed out — the name stays unbound in that case.
    pub fn cook(&self, name: &[u8]) -> Result<P> {
        if name.is_empty() {
            return Err(Error::invalid_argument("part name must not be empty"));
        }
        let meta = self.meta();
        match meta.get(name)? {
            Some(raw) => {
                decode(&raw).map_err(|_| Error::corruption("sandwich mapping entry size mismatch"))
            }
            None => {
                let mut seq = self.seq.lock();
                let mut cookie: P = seq.next()?;
                if cookie.as_raw() == 0 {
                    // zero is the meta part; skip it
                    cookie = seq.next()?;
                }
                meta.put(name, &encode(cookie))?;
                Ok(cookie)
            }
        }
    }

    /// Bind a part directly by cookie.
    ///
    /// Prefix zero names the meta part; everything under it belongs to the
    /// sandwich itself.
    pub fn part(&self, cookie: P) -> Part<S, P> {
        Part::new(Arc::clone(&self.base), cookie)
    }

    /// Resolve `name` and bind its part: `cook` plus [`SandwichDb::part`].
    pub fn open(&self, name: &[u8]) -> Result<Part<S, P>> {
        Ok(self.part(self.cook(name)?))
    }

    /// Flush the prefix allocator's unused tail back to the store.
    pub fn sync(&self) -> Result<()> {
        self.seq.lock().sync()
    }

    /// Derive a sandwich with the same name→prefix mapping over a store
    /// stacked on this sandwich's base (e.g. a transaction).
    ///
    /// The mapping is shared through the data itself; the prefix allocator is
    /// not, so only one of the stacked sandwiches should cook new names
    /// before the other is synced away.
    pub fn stack<T, F>(&self, wrap: F) -> SandwichDb<T, P>
    where
        T: Store,
        F: FnOnce(Arc<S>) -> T,
    {
        SandwichDb::new(wrap(Arc::clone(&self.base)))
    }

    /// Read a raw meta record. Exposed for repair tooling and tests.
    pub fn meta_record(&self, name: &[u8]) -> Result<Option<Value>> {
        self.meta().get(name)
    }
}
