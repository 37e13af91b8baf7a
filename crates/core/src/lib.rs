//! Core types and traits for Tempora
//!
//! This crate defines the foundational types used throughout the engine:
//! - BusinessKey / TechnicalId: the two identities of every stored row
//! - VersionNumber: gapless 1..N chain positions
//! - Timestamp / ValidityInterval: microsecond time and half-open validity
//! - ClockSource: injected clock so one captured instant bounds both
//!   halves of a transition
//! - VersionedRecord: the canonical envelope every entity embeds
//! - Error: error type hierarchy
//! - Traits: TemporalStore and EnvelopeMapper seams

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod envelope;
pub mod error;
pub mod key;
pub mod timestamp;
pub mod traits;
pub mod version;

// Re-export commonly used types and traits
pub use clock::{ClockSource, ManualClock, SystemClock};
pub use envelope::{Audit, VersionedRecord};
pub use error::{Error, Result};
pub use key::{BusinessKey, TechnicalId};
pub use timestamp::{Timestamp, ValidityInterval};
pub use traits::{CloseOp, EnvelopeMapper, TemporalStore};
pub use version::VersionNumber;
