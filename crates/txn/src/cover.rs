//! CoverWalker: ordered overlay merge
//!
//! Merges a base walker and a higher-priority overlay walker into one ordered
//! view of the union of their key spaces; on duplicate keys the overlay wins.
//!
//! ## State machine
//!
//! The walker tracks which side carries the current entry and which direction
//! it last moved:
//!
//! | state      | meaning                                   | active side |
//! |------------|-------------------------------------------|-------------|
//! | `Both`     | base and overlay sit on the same key      | overlay     |
//! | `FwdLeft`  | forward, base < overlay or overlay spent  | base        |
//! | `FwdRight` | forward, base > overlay or base spent     | overlay     |
//! | `RevLeft`  | reverse, base > overlay or overlay spent  | base        |
//! | `RevRight` | reverse, base < overlay or base spent     | overlay     |
//!
//! Moving with the grain advances the active side (both in `Both`); reversing
//! direction first brings the lagging side back alongside the current key,
//! re-seeking it if it was spent.
//!
//! ## Live-overlay notifications
//!
//! The transaction layer calls [`CoverWalker::overlay_put`] /
//! [`CoverWalker::overlay_delete`] while this walker is live. They only matter
//! in the base-active states: an insertion landing between the current base
//! position and the overlay's next position must pull the overlay cursor back,
//! or the walker would step over it. Overlay-active states need no help — the
//! overlay walker observes its own container.

use std::cmp::Ordering;

use lamina_core::error::Result;
use lamina_core::types::{Key, Value};
use lamina_core::Walker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Both,
    FwdLeft,
    FwdRight,
    RevLeft,
    RevRight,
}

/// Ordered union walker with overlay-wins shadowing.
#[derive(Debug, Clone)]
pub struct CoverWalker<B: Walker, O: Walker> {
    base: B,
    overlay: O,
    state: State,
}

impl<B: Walker, O: Walker> CoverWalker<B, O> {
    /// Merge `base` under `overlay`.
    ///
    /// The walker starts positioned at the first entry so that both sides are
    /// initialized before any notification can arrive.
    pub fn new(base: B, overlay: O) -> Self {
        let mut walker = Self {
            base,
            overlay,
            state: State::FwdLeft,
        };
        walker.seek_to_first();
        walker
    }

    fn overlay_active(&self) -> bool {
        matches!(self.state, State::Both | State::FwdRight | State::RevRight)
    }

    /// Recompute the state from both sides' validity and key order.
    fn activate(&mut self, fwd: bool) {
        if !self.overlay.valid() {
            self.state = if fwd { State::FwdLeft } else { State::RevLeft };
            return;
        }
        if !self.base.valid() {
            self.state = if fwd { State::FwdRight } else { State::RevRight };
            return;
        }
        match (self.base.key(), self.overlay.key()) {
            (Some(base_key), Some(overlay_key)) => {
                self.state = match base_key.cmp(&overlay_key) {
                    Ordering::Equal => State::Both,
                    Ordering::Less => {
                        if fwd {
                            State::FwdLeft
                        } else {
                            State::RevRight
                        }
                    }
                    Ordering::Greater => {
                        if fwd {
                            State::FwdRight
                        } else {
                            State::RevLeft
                        }
                    }
                }
            }
            // both sides answered valid above
            _ => self.state = if fwd { State::FwdLeft } else { State::RevLeft },
        }
    }

    /// Notification: `key` was inserted into the overlay.
    pub fn overlay_put(&mut self, key: &[u8]) {
        if !self.valid() {
            return;
        }
        match self.state {
            State::FwdLeft => {
                let Some(base_key) = self.base.key() else { return };
                match base_key.as_slice().cmp(key) {
                    Ordering::Equal => {
                        self.overlay.seek(key);
                        self.state = State::Both;
                    }
                    // inserted behind the current position
                    Ordering::Greater => {}
                    Ordering::Less => {
                        // the overlay cursor observes insertions beyond its
                        // own position by itself
                        if let Some(overlay_key) = self.overlay.key() {
                            if overlay_key.as_slice() < key {
                                return;
                            }
                        }
                        // inserted between current base and current overlay
                        self.overlay.seek(key);
                    }
                }
            }
            State::RevLeft => {
                let Some(base_key) = self.base.key() else { return };
                match base_key.as_slice().cmp(key) {
                    Ordering::Equal => {
                        self.overlay.seek(key);
                        self.state = State::Both;
                    }
                    Ordering::Less => {}
                    Ordering::Greater => {
                        if let Some(overlay_key) = self.overlay.key() {
                            if overlay_key.as_slice() > key {
                                return;
                            }
                        }
                        // exact match, so no step back needed after the seek
                        self.overlay.seek(key);
                    }
                }
            }
            // current entry comes from the overlay; nothing to re-sync
            State::Both | State::FwdRight | State::RevRight => {}
        }
    }

    /// Notification: `key` is about to be removed from the overlay.
    ///
    /// Delivered before the removal, so seeking the overlay at `key` still
    /// lands on the doomed record and a single step moves past it.
    pub fn overlay_delete(&mut self, key: &[u8]) {
        if !self.valid() {
            return;
        }
        match self.state {
            State::FwdLeft => {
                if self.overlay.key().as_deref() == Some(key) {
                    self.overlay.seek(key);
                    self.overlay.next();
                }
            }
            State::RevLeft => {
                if self.overlay.key().as_deref() == Some(key) {
                    self.overlay.seek(key);
                    self.overlay.prev();
                }
            }
            // the overlay walker handles its own ghost records; callers step
            // away before reading
            State::Both | State::FwdRight | State::RevRight => {}
        }
    }
}

impl<B: Walker, O: Walker> Walker for CoverWalker<B, O> {
    fn valid(&self) -> bool {
        if self.overlay_active() {
            self.overlay.valid()
        } else {
            self.base.valid()
        }
    }

    fn seek_to_first(&mut self) {
        self.base.seek_to_first();
        self.overlay.seek_to_first();
        self.activate(true);
    }

    fn seek_to_last(&mut self) {
        self.base.seek_to_last();
        self.overlay.seek_to_last();
        self.activate(false);
    }

    fn seek(&mut self, target: &[u8]) {
        self.base.seek(target);
        self.overlay.seek(target);
        self.activate(true);
    }

    fn next(&mut self) {
        match self.state {
            State::FwdLeft => self.base.next(),
            State::FwdRight => self.overlay.next(),
            State::Both => {
                self.base.next();
                self.overlay.next();
            }
            // reversing direction: bring the overlay back alongside before
            // stepping forward
            State::RevLeft => {
                let Some(base_key) = self.base.key() else {
                    // both sides spent; nothing ahead
                    return;
                };
                if !self.overlay.valid() {
                    self.overlay.seek(&base_key);
                    if !self.overlay.valid() {
                        self.base.next();
                        self.state = State::FwdLeft;
                        return;
                    }
                }
                if let Some(overlay_key) = self.overlay.key() {
                    if base_key >= overlay_key {
                        self.overlay.next();
                    }
                }
                self.base.next();
            }
            State::RevRight => {
                let Some(overlay_key) = self.overlay.key() else {
                    return;
                };
                if !self.base.valid() {
                    self.base.seek(&overlay_key);
                    if !self.base.valid() {
                        self.overlay.next();
                        self.state = State::FwdRight;
                        return;
                    }
                }
                if let Some(base_key) = self.base.key() {
                    if base_key <= overlay_key {
                        self.base.next();
                    }
                }
                self.overlay.next();
            }
        }
        self.activate(true);
    }

    fn prev(&mut self) {
        match self.state {
            State::RevLeft => self.base.prev(),
            State::RevRight => self.overlay.prev(),
            State::Both => {
                self.base.prev();
                self.overlay.prev();
            }
            // reversing direction: bring the overlay back alongside before
            // stepping backward
            State::FwdLeft => match self.base.key() {
                None => {
                    // both sides spent going forward: re-enter from the end
                    self.base.seek_to_last();
                    self.overlay.seek_to_last();
                }
                Some(base_key) => {
                    if !self.overlay.valid() {
                        self.overlay.seek(&base_key);
                        if !self.overlay.valid() {
                            self.base.prev();
                            self.overlay.seek_to_last();
                            self.activate(false);
                            return;
                        }
                    }
                    self.base.prev();
                    self.overlay.prev();
                }
            },
            State::FwdRight => {
                let Some(overlay_key) = self.overlay.key() else {
                    return;
                };
                if !self.base.valid() {
                    self.base.seek(&overlay_key);
                    if !self.base.valid() {
                        self.overlay.prev();
                        self.base.seek_to_last();
                        self.activate(false);
                        return;
                    }
                }
                self.base.prev();
                self.overlay.prev();
            }
        }
        self.activate(false);
    }

    fn key(&self) -> Option<Key> {
        if self.overlay_active() {
            self.overlay.key()
        } else {
            self.base.key()
        }
    }

    fn value(&self) -> Option<Value> {
        if self.overlay_active() {
            self.overlay.value()
        } else {
            self.base.value()
        }
    }

    fn status(&self) -> Result<()> {
        if self.overlay_active() {
            self.overlay.status()
        } else {
            self.base.status()
        }
    }
}
