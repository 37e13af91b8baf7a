//! Storage layer for Tempora
//!
//! This crate implements the in-memory TemporalStore backend:
//! - MemoryStore: BTreeMap of version chains guarded by a RwLock
//! - Chain: the append-only row set of one business key
//! - IdIndex: secondary index for O(1) technical-id lookups
//!
//! All mutation flows through `write_atomic`, which validates the
//! optimistic close guard before touching anything and applies close +
//! insert under one write lock. Readers are snapshot-consistent by
//! construction: they can never observe a chain with zero or two current
//! rows mid-transition.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chain;
pub mod index;
pub mod memory;

pub use chain::Chain;
pub use index::IdIndex;
pub use memory::MemoryStore;
