//! Engine layer for Tempora
//!
//! Orchestrates the temporal store into the API applications use:
//! - VersionTransitionCoordinator: atomic close-and-insert transitions
//!   with optimistic concurrency
//! - TemporalRepository: entity-facing facade through an EnvelopeMapper
//! - PointInTimeQueryEngine: read-only historical reconstruction
//!
//! The engine holds no state of its own beyond shared store and clock
//! handles; every component is safe to clone across threads.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coordinator;
pub mod query;
pub mod repository;

pub use coordinator::{SaveRequest, VersionTransitionCoordinator};
pub use query::PointInTimeQueryEngine;
pub use repository::TemporalRepository;
