//! The canonical versioned-record envelope
//!
//! Every stored entity embeds this shape: business key, version number,
//! validity interval, current flag, audit fields, and the entity-specific
//! payload (opaque to the engine). The envelope is immutable once written;
//! transitions produce new envelopes rather than mutating old ones.
//!
//! ## Invariants
//!
//! - I1: exactly one row per business key has `is_current == true`,
//!   except deleted keys, which have zero
//! - I2: intervals within a chain are contiguous and non-overlapping
//! - I3: version numbers form the sequence 1..N with no gaps
//! - I4: `technical_id` is never reassigned; history rows are never
//!   physically deleted
//! - I5: `created_at` is identical across all versions of a business key

use serde::{Deserialize, Serialize};

use crate::key::{BusinessKey, TechnicalId};
use crate::timestamp::{Timestamp, ValidityInterval};
use crate::version::VersionNumber;

/// Audit metadata carried on every row version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audit {
    /// Principal that created the business key's first version
    pub created_by: String,
    /// Principal that produced this particular version
    pub updated_by: String,
    /// Free-form reason for this version ("price correction", ...)
    pub reason: Option<String>,
}

impl Audit {
    /// Audit info for a chain-creating save: creator and updater coincide
    pub fn created(by: impl Into<String>) -> Self {
        let by = by.into();
        Self {
            created_by: by.clone(),
            updated_by: by,
            reason: None,
        }
    }

    /// Audit info for a transition, preserving the original creator
    pub fn updated(&self, by: impl Into<String>, reason: Option<String>) -> Self {
        Self {
            created_by: self.created_by.clone(),
            updated_by: by.into(),
            reason,
        }
    }

    /// Attach a reason to this audit entry
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// One immutable row-version of a logical entity
///
/// The payload type `T` is entity-specific and opaque to the engine; the
/// envelope fields are the engine's bookkeeping. `is_current` is kept as
/// an indexable fast-path flag, redundant with `validity.is_open()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedRecord<T> {
    /// Opaque per-version identifier, globally unique, never reused
    pub technical_id: TechnicalId,
    /// Stable logical identifier shared by every version in the chain
    pub business_key: BusinessKey,
    /// Position in the chain: 1 at creation, +1 per transition
    pub version: VersionNumber,
    /// Half-open validity interval; open while current
    pub validity: ValidityInterval,
    /// Fast-path flag, true iff `validity` is open
    pub is_current: bool,
    /// Entity-specific fields, opaque to the engine
    pub payload: T,
    /// Timestamp of the chain's first version, copied to every successor
    pub created_at: Timestamp,
    /// Audit metadata
    pub audit: Audit,
}

impl<T> VersionedRecord<T> {
    /// Create the first version of a new chain
    ///
    /// Version 1, open interval starting at `at`, fresh technical id,
    /// `created_at` pinned to `at` for the lifetime of the chain.
    pub fn first(business_key: BusinessKey, payload: T, at: Timestamp, audit: Audit) -> Self {
        Self {
            technical_id: TechnicalId::new(),
            business_key,
            version: VersionNumber::FIRST,
            validity: ValidityInterval::open_from(at),
            is_current: true,
            payload,
            created_at: at,
            audit,
        }
    }

    /// Build the successor version carrying this chain's identity forward
    ///
    /// Fresh technical id, version + 1, open interval starting at `at`,
    /// same business key and `created_at` (I5). The caller is responsible
    /// for closing `self` at the same `at` in the same atomic write.
    pub fn successor(&self, payload: T, at: Timestamp, audit: Audit) -> Self {
        Self {
            technical_id: TechnicalId::new(),
            business_key: self.business_key.clone(),
            version: self.version.next(),
            validity: ValidityInterval::open_from(at),
            is_current: true,
            payload,
            created_at: self.created_at,
            audit,
        }
    }

    /// Whether this row's flag agrees with its interval
    ///
    /// The flag is redundant by design; disagreement indicates a corrupt
    /// chain and is checked by the store's verifier.
    pub fn flag_consistent(&self) -> bool {
        self.is_current == self.validity.is_open()
    }

    /// Map the payload to a new type, preserving all envelope fields
    pub fn map<U, F>(self, f: F) -> VersionedRecord<U>
    where
        F: FnOnce(T) -> U,
    {
        VersionedRecord {
            technical_id: self.technical_id,
            business_key: self.business_key,
            version: self.version,
            validity: self.validity,
            is_current: self.is_current,
            payload: f(self.payload),
            created_at: self.created_at,
            audit: self.audit,
        }
    }

    /// Reference to the payload
    #[inline]
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Consume the record and return the payload
    #[inline]
    pub fn into_payload(self) -> T {
        self.payload
    }
}

impl<T: Clone> VersionedRecord<T> {
    /// Copy of this row with its interval closed at `at`
    ///
    /// Used for the close half of a transition and for soft deletes. The
    /// original row value is untouched; the store swaps rows atomically.
    pub fn closed(&self, at: Timestamp) -> crate::error::Result<Self> {
        let validity = self.validity.close(at, &self.business_key)?;
        Ok(Self {
            technical_id: self.technical_id,
            business_key: self.business_key.clone(),
            version: self.version,
            validity,
            is_current: false,
            payload: self.payload.clone(),
            created_at: self.created_at,
            audit: self.audit.clone(),
        })
    }
}
