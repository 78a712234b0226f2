//! Part: one logical store inside a sandwich
//!
//! A part is a store bound to a fixed-width big-endian prefix. Point
//! operations prepend the prefix before delegating to the physical store; the
//! walker runs a physical walker clamped to the prefix's contiguous key
//! slice, stripping the prefix from observed keys.

use std::sync::Arc;

use smallvec::SmallVec;

use lamina_core::endian::{encode, next_net, NetInt};
use lamina_core::error::{Error, Result};
use lamina_core::types::{Key, Value};
use lamina_core::{Store, Walker};

/// Stack buffer for `prefix ∥ key` concatenations.
type PhysicalKey = SmallVec<[u8; 64]>;

/// A prefix-bound logical store inside a sandwich.
///
/// Cloning produces another handle to the same part.
#[derive(Debug)]
pub struct Part<S: Store, P: NetInt = u16> {
    base: Arc<S>,
    prefix: P,
}

impl<S: Store, P: NetInt> Clone for Part<S, P> {
    fn clone(&self) -> Self {
        Self {
            base: Arc::clone(&self.base),
            prefix: self.prefix,
        }
    }
}

impl<S: Store, P: NetInt> Part<S, P> {
    pub(crate) fn new(base: Arc<S>, prefix: P) -> Self {
        Self { base, prefix }
    }

    /// The prefix tag identifying this part.
    ///
    /// A cookie obtained from one sandwich names the same part in any store
    /// stacked over the same physical data.
    pub fn cookie(&self) -> P {
        self.prefix
    }

    fn physical(&self, key: &[u8]) -> PhysicalKey {
        let mut buf = PhysicalKey::with_capacity(P::WIDTH + key.len());
        buf.extend_from_slice(&encode(self.prefix));
        buf.extend_from_slice(key);
        buf
    }
}

impl<S: Store, P: NetInt> Store for Part<S, P> {
    type Walker = PartWalker<S::Walker>;

    fn get(&self, key: &[u8]) -> Result<Option<Value>> {
        self.base.get(&self.physical(key))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.base.put(&self.physical(key), value)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.base.delete(&self.physical(key))
    }

    fn walker(&self) -> PartWalker<S::Walker> {
        PartWalker {
            prefix: encode(self.prefix),
            base: self.base.walker(),
        }
    }
}

/// Walker over one part's slice of the physical key space.
///
/// Valid only while the physical walker sits on a key carrying the part's
/// prefix; walking past either edge of the slice turns the walker invalid
/// with an "out of part slice" status.
#[derive(Debug, Clone)]
pub struct PartWalker<W: Walker> {
    prefix: Vec<u8>,
    base: W,
}

impl<W: Walker> PartWalker<W> {
    fn in_slice(&self) -> bool {
        self.base
            .key()
            .map_or(false, |key| key.starts_with(&self.prefix))
    }
}

impl<W: Walker> Walker for PartWalker<W> {
    fn valid(&self) -> bool {
        self.base.valid() && self.in_slice()
    }

    fn seek_to_first(&mut self) {
        // the bare prefix is ≤ every key in the slice
        self.base.seek(&self.prefix);
    }

    fn seek_to_last(&mut self) {
        let mut bound = self.prefix.clone();
        if next_net(&mut bound) {
            // position at the next slice's lower bound and step back
            self.base.seek(&bound);
            if self.base.valid() {
                self.base.prev();
            } else {
                // already past the last physical key
                self.base.seek_to_last();
            }
        } else {
            // saturated prefix: the slice is the tail of the key space
            self.base.seek_to_last();
        }
    }

    fn seek(&mut self, target: &[u8]) {
        let mut physical = Vec::with_capacity(self.prefix.len() + target.len());
        physical.extend_from_slice(&self.prefix);
        physical.extend_from_slice(target);
        self.base.seek(&physical);
    }

    fn next(&mut self) {
        self.base.next();
    }

    fn prev(&mut self) {
        self.base.prev();
    }

    fn key(&self) -> Option<Key> {
        self.base
            .key()
            .filter(|key| key.starts_with(&self.prefix))
            .map(|key| key[self.prefix.len()..].to_vec())
    }

    fn value(&self) -> Option<Value> {
        if self.in_slice() {
            self.base.value()
        } else {
            None
        }
    }

    fn status(&self) -> Result<()> {
        self.base.status()?;
        if self.valid() {
            Ok(())
        } else {
            Err(Error::not_found("out of part slice"))
        }
    }
}
