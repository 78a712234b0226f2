//! laminadb — composable layered adapters over ordered key-value stores
//!
//! A lamina stack is built from small adapters that all speak one contract
//! ([`Store`] + [`Walker`]): an in-memory ordered store, a tombstone set,
//! difference and overlay-merge walkers, a staged transaction layer, a
//! prefix-multiplexed "sandwich" store, and a durable bottom store. Every
//! layer both consumes and provides the contract, so the layers compose
//! freely — a transactional sandwich over a durable bottom is just
//! `SandwichDb<TxnDb<BottomDb>>`.
//!
//! This crate re-exports the workspace members.

pub use lamina_core::{
    batch::{BatchOp, WriteBatch},
    endian,
    error::{Error, Result},
    types::{Key, Value},
    AnyStore, Store, Walker,
};

pub use lamina_bottom::{BottomDb, BottomWalker};
pub use lamina_sandwich::{Part, PartWalker, SandwichDb, Sequence};
pub use lamina_storage::{MemoryDb, MemoryWalker, RefStore, Whiteout, WhiteoutWalker};
pub use lamina_txn::{CoverWalker, SubtractWalker, TxnDb, TxnWalker};
