//! Core traits for store and mapping abstraction
//!
//! `TemporalStore` is defined here rather than in the storage crate so
//! upper layers (coordinator, repository, query engine) can swap the
//! in-memory backend for a database-backed one without breaking.

use crate::envelope::VersionedRecord;
use crate::error::Result;
use crate::key::{BusinessKey, TechnicalId};
use crate::timestamp::Timestamp;
use crate::version::VersionNumber;

/// The guarded close half of an atomic transition
///
/// The guard is the optimistic-concurrency check: the close applies only
/// to a row that is still current at `expected_version`. If no such row
/// exists (another writer already transitioned past it), the whole atomic
/// write aborts with `Conflict` and nothing is inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseOp {
    /// The chain being transitioned
    pub business_key: BusinessKey,
    /// The version the caller believes is current
    pub expected_version: VersionNumber,
    /// The captured instant closing the interval; a paired insert opens
    /// its interval at this same instant
    pub at: Timestamp,
}

/// Transactional wrapper over the persistence medium
///
/// Provides atomic multi-row writes and interval-filtered reads. Readers
/// must never observe zero or two current rows for a key mid-transition
/// (snapshot isolation is the minimum acceptable level).
///
/// Thread safety: all methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync).
pub trait TemporalStore<T>: Send + Sync {
    /// Read the current version of a business key
    ///
    /// Returns None if the key is unknown or its chain has been ended by
    /// a soft delete.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage medium fails.
    fn read_current(&self, key: &BusinessKey) -> Result<Option<VersionedRecord<T>>>;

    /// Read the version valid at `as_of`
    ///
    /// Returns the row where `valid_from <= as_of < valid_to-or-open`, or
    /// None if the key is unknown or `as_of` precedes the chain's birth.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage medium fails.
    fn read_at(&self, key: &BusinessKey, as_of: Timestamp) -> Result<Option<VersionedRecord<T>>>;

    /// Read the full chain for a business key, ascending by version
    ///
    /// The returned sequence is a snapshot at call time; later writes do
    /// not mutate it. Empty if the key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage medium fails.
    fn read_history(&self, key: &BusinessKey) -> Result<Vec<VersionedRecord<T>>>;

    /// Read one row by its per-version technical id
    ///
    /// Backed by the `technicalId` index; O(1) in the in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage medium fails.
    fn read_by_id(&self, id: &TechnicalId) -> Result<Option<VersionedRecord<T>>>;

    /// Apply an optional guarded close plus an optional insert as one unit
    ///
    /// At least one operation must be present: a transition carries both,
    /// a first insert only `insert`, a soft delete only `close`. The write
    /// is all-or-nothing; a failure between close and insert cannot leave
    /// the prior current row half-modified.
    ///
    /// # Errors
    ///
    /// - `Conflict` when the close guard matches no row
    /// - `DuplicateKey` when inserting version 1 over a live chain
    /// - `Deleted` when inserting over a soft-deleted chain
    /// - `CorruptChain` when the insert would break chain contiguity
    /// - `Store` for medium failures, surfaced without internal retry
    fn write_atomic(
        &self,
        close: Option<CloseOp>,
        insert: Option<VersionedRecord<T>>,
    ) -> Result<()>;
}

/// Mapping between a domain entity and its stored envelope
///
/// Entity-specific repositories supply this pair; the engine never looks
/// inside the payload. Implementations must satisfy the round-trip law
/// `from_envelope(to_envelope(x)) == x`.
pub trait EnvelopeMapper {
    /// The domain-facing entity type
    type Entity;
    /// The payload type persisted inside the envelope
    type Payload;

    /// Project a domain entity onto its envelope
    fn to_envelope(&self, entity: &Self::Entity) -> VersionedRecord<Self::Payload>;

    /// Materialize a domain entity from a stored envelope
    fn from_envelope(&self, record: VersionedRecord<Self::Payload>) -> Self::Entity;
}
