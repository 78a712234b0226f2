//! Core contract for lamina layered stores
//!
//! This crate defines the vocabulary every layer speaks:
//! - `Key`/`Value` byte aliases and the error taxonomy
//! - the `Store` trait (point operations + batched writes)
//! - the `Walker` trait (bidirectional seekable cursor)
//! - the fixed-width big-endian tag codec shared by the sequence allocator
//!   and the sandwich multiplexer
//!
//! Every adapter in the workspace both consumes and provides this contract,
//! which is what lets the layers compose.

pub mod batch;
pub mod endian;
pub mod error;
pub mod store;
pub mod types;
pub mod walker;

pub use batch::{BatchOp, WriteBatch};
pub use error::{Error, Result};
pub use store::{AnyStore, Store};
pub use types::{Key, Value};
pub use walker::Walker;
