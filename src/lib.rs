//! Tempora: temporal entity versioning and query engine
//!
//! Business records live as append-only version chains keyed by a stable
//! `BusinessKey`. Each chain holds immutable rows with half-open validity
//! intervals; at most one row per key is current at any instant. Updates
//! never mutate history: they atomically close the current row and insert
//! its successor at one shared clock instant, guarded by an optimistic
//! version check. Past states stay reconstructible forever.
//!
//! # Quick start
//!
//! ```
//! use std::sync::Arc;
//! use tempora::{
//!     MemoryStore, SaveRequest, SystemClock, TemporalStore, VersionNumber,
//!     VersionTransitionCoordinator,
//! };
//!
//! let store = Arc::new(MemoryStore::new());
//! let clock = Arc::new(SystemClock);
//! let coordinator = VersionTransitionCoordinator::new(store.clone(), clock);
//!
//! // Create the chain, then transition it from the version we read.
//! let v1 = coordinator
//!     .save(SaveRequest::create("C-100", "first draft", "alice"))
//!     .unwrap();
//! let v2 = coordinator
//!     .save(SaveRequest::update("C-100", "revised", v1.version, "bob"))
//!     .unwrap();
//!
//! assert_eq!(v2.version, VersionNumber::new(2));
//! assert_eq!(
//!     store.read_history(&"C-100".into()).unwrap().len(),
//!     2
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use tempora_core::{
    Audit, BusinessKey, ClockSource, CloseOp, EnvelopeMapper, Error, ManualClock, Result,
    SystemClock, TechnicalId, TemporalStore, Timestamp, ValidityInterval, VersionNumber,
    VersionedRecord,
};
pub use tempora_engine::{
    PointInTimeQueryEngine, SaveRequest, TemporalRepository, VersionTransitionCoordinator,
};
pub use tempora_storage::MemoryStore;
