//! Sandwich: many logical stores multiplexed into one physical store
//!
//! A sandwich slices a single ordered store into named *parts* by a
//! fixed-width big-endian key prefix. Part zero is reserved for the
//! sandwich's own metadata: the name→prefix mapping, and the state of the
//! [`Sequence`] allocator that hands out fresh prefixes.
//!
//! Because prefixes are compared as big-endian bytes, each part occupies one
//! contiguous slice of the physical key space and a part walker is just a
//! base walker clamped to that slice.

pub mod part;
pub mod sandwich;
pub mod sequence;

pub use part::{Part, PartWalker};
pub use sandwich::SandwichDb;
pub use sequence::Sequence;
