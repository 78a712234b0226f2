//! SubtractWalker: ordered difference of a base walker and a tombstone set
//!
//! Presents the keys of the base that are *not* tombstoned, in order, in both
//! directions. The tombstone walker trails the base walker lazily: it is only
//! (re)positioned when the base lands on or passes a tombstoned key, so a walk
//! over a base with few tombstones barely touches the set.

use std::cmp::Ordering;

use lamina_core::error::Result;
use lamina_core::types::{Key, Value};
use lamina_core::Walker;
use lamina_storage::whiteout::{Whiteout, WhiteoutWalker};

/// Ordered difference walker: `base` minus the keys of a [`Whiteout`].
///
/// While valid, the current key is in the base and not tombstoned; `value` and
/// `status` are the base walker's.
#[derive(Debug, Clone)]
pub struct SubtractWalker<B: Walker> {
    base: B,
    whiteout: WhiteoutWalker,
}

impl<B: Walker> SubtractWalker<B> {
    /// Build the difference of `base` and `tombstones`.
    pub fn new(base: B, tombstones: &Whiteout) -> Self {
        Self {
            base,
            whiteout: tombstones.walker(),
        }
    }

    /// Move the base forward off tombstoned keys.
    ///
    /// Entered with a valid base walker. The whiteout walker is brought to the
    /// base key on demand; equal keys advance both sides.
    fn skip_fwd(&mut self) {
        if !self.whiteout.valid() {
            let Some(key) = self.base.key() else { return };
            self.whiteout.seek(&key);
            if !self.whiteout.valid() {
                return;
            }
        }
        loop {
            let (Some(base_key), Some(white_key)) = (self.base.key(), self.whiteout.key()) else {
                return;
            };
            match base_key.cmp(&white_key) {
                Ordering::Less => return,
                Ordering::Greater => {
                    self.whiteout.next();
                    if !self.whiteout.valid() {
                        return;
                    }
                }
                Ordering::Equal => {
                    self.base.next();
                    self.whiteout.next();
                    if !self.whiteout.valid() || !self.base.valid() {
                        return;
                    }
                }
            }
        }
    }

    /// Mirror of `skip_fwd` for reverse traversal.
    fn skip_rev(&mut self) {
        if !self.whiteout.valid() {
            let Some(key) = self.base.key() else { return };
            self.whiteout.seek(&key);
            if !self.whiteout.valid() {
                return;
            }
        }
        loop {
            let (Some(base_key), Some(white_key)) = (self.base.key(), self.whiteout.key()) else {
                return;
            };
            match base_key.cmp(&white_key) {
                Ordering::Greater => return,
                Ordering::Less => {
                    self.whiteout.prev();
                    if !self.whiteout.valid() {
                        return;
                    }
                }
                Ordering::Equal => {
                    self.base.prev();
                    self.whiteout.prev();
                    if !self.whiteout.valid() || !self.base.valid() {
                        return;
                    }
                }
            }
        }
    }
}

impl<B: Walker> Walker for SubtractWalker<B> {
    fn valid(&self) -> bool {
        self.base.valid()
    }

    fn seek_to_first(&mut self) {
        self.base.seek_to_first();
        if !self.valid() {
            return;
        }
        self.whiteout.seek_to_first();
        self.skip_fwd();
    }

    fn seek_to_last(&mut self) {
        self.base.seek_to_last();
        if !self.valid() {
            return;
        }
        self.whiteout.seek_to_last();
        self.skip_rev();
    }

    fn seek(&mut self, target: &[u8]) {
        self.base.seek(target);
        if !self.valid() {
            return;
        }
        self.whiteout.seek(target);
        self.skip_fwd();
    }

    fn next(&mut self) {
        self.base.next();
        if self.valid() {
            self.skip_fwd();
        }
    }

    fn prev(&mut self) {
        self.base.prev();
        if self.valid() {
            self.skip_rev();
        }
    }

    fn key(&self) -> Option<Key> {
        self.base.key()
    }

    fn value(&self) -> Option<Value> {
        self.base.value()
    }

    fn status(&self) -> Result<()> {
        self.base.status()
    }
}
