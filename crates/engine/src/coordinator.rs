//! VersionTransitionCoordinator: insert-vs-transition dispatch
//!
//! Turns a "save this record" call into the correct store operations and
//! protects the chain invariants under concurrent writers:
//!
//! - version 1: plain insert, no close op. An existing current row is a
//!   `DuplicateKey` programmer error, never silently reinterpreted as a
//!   transition.
//! - version N > 1: one captured instant bounds both halves — a guarded
//!   close of version N-1 and the insert of version N. If the guard
//!   matches no row (another writer transitioned past N-1 first), the
//!   whole write aborts with `Conflict` and nothing is inserted.
//! - soft delete: the close half alone, same guard.
//!
//! The coordinator performs no automatic retry or merge; conflict
//! resolution is domain-specific and belongs to the caller.
//!
//! ## The shared instant
//!
//! The close and the insert of one transition must use the *same* clock
//! capture. Two independent reads would leave a microscopic gap or
//! overlap between row N-1's `valid_to` and row N's `valid_from`,
//! silently degrading invariant I2.

use std::sync::Arc;

use tracing::{debug, warn};

use tempora_core::{
    Audit, BusinessKey, ClockSource, CloseOp, Error, Result, TemporalStore, VersionNumber,
    VersionedRecord,
};

/// A save request: the payload to persist plus the caller's claim about
/// where in the chain it lands
///
/// `base_version` is the version the caller last read, or None for a
/// chain-creating save. The distinction is explicit so a failed lookup
/// can never be misread as an instruction to create.
#[derive(Debug, Clone)]
pub struct SaveRequest<T> {
    /// The chain to write to
    pub business_key: BusinessKey,
    /// Entity payload for the new version
    pub payload: T,
    /// The version the caller read, None to create the chain
    pub base_version: Option<VersionNumber>,
    /// Principal performing the save
    pub actor: String,
    /// Optional reason recorded in the audit trail
    pub reason: Option<String>,
}

impl<T> SaveRequest<T> {
    /// A chain-creating save (version 1)
    pub fn create(
        business_key: impl Into<BusinessKey>,
        payload: T,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            business_key: business_key.into(),
            payload,
            base_version: None,
            actor: actor.into(),
            reason: None,
        }
    }

    /// An updating save built from the version the caller last read
    pub fn update(
        business_key: impl Into<BusinessKey>,
        payload: T,
        base_version: VersionNumber,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            business_key: business_key.into(),
            payload,
            base_version: Some(base_version),
            actor: actor.into(),
            reason: None,
        }
    }

    /// Attach an audit reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Drives atomic version transitions against a TemporalStore
///
/// Generic over the store and the clock so tests can pin time and swap
/// backends. Stateless apart from the two shared handles; safe to clone
/// and share across request handlers.
pub struct VersionTransitionCoordinator<T, S, C>
where
    S: TemporalStore<T>,
    C: ClockSource,
{
    store: Arc<S>,
    clock: Arc<C>,
    _payload: std::marker::PhantomData<fn() -> T>,
}

impl<T, S, C> Clone for VersionTransitionCoordinator<T, S, C>
where
    S: TemporalStore<T>,
    C: ClockSource,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            _payload: std::marker::PhantomData,
        }
    }
}

impl<T, S, C> VersionTransitionCoordinator<T, S, C>
where
    T: Clone + Send + Sync,
    S: TemporalStore<T>,
    C: ClockSource,
{
    /// Create a coordinator over a store and a clock
    pub fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self {
            store,
            clock,
            _payload: std::marker::PhantomData,
        }
    }

    /// The underlying store handle
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Persist a save request, returning the row version it produced
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` for an empty business key or a zero base version
    /// - `DuplicateKey` for a create against a key with a current row
    /// - `Deleted` for any save against a soft-deleted chain
    /// - `Conflict` when the base version is no longer current
    /// - `Store` for medium failures
    pub fn save(&self, request: SaveRequest<T>) -> Result<VersionedRecord<T>> {
        self.validate(&request)?;

        match request.base_version {
            None => self.insert_first(request),
            Some(base) => self.transition(request, base),
        }
    }

    /// Soft-delete: close the current row without a successor
    ///
    /// The chain ends but is never erased; the key becomes terminal.
    ///
    /// # Errors
    ///
    /// - `NotFound` when the key has no current row (unknown or already
    ///   deleted)
    /// - `Conflict` when another writer transitions between the re-read
    ///   and the guarded close
    pub fn soft_delete(&self, key: &BusinessKey) -> Result<()> {
        let current = self
            .store
            .read_current(key)?
            .ok_or_else(|| Error::NotFound { key: key.clone() })?;

        let at = self.clock.now();
        let close = CloseOp {
            business_key: key.clone(),
            expected_version: current.version,
            at,
        };

        match self.store.write_atomic(Some(close), None) {
            Ok(()) => {
                debug!(key = %key, version = %current.version, "soft-deleted chain");
                Ok(())
            }
            Err(err) => {
                if err.is_conflict() {
                    warn!(key = %key, "soft delete lost an optimistic race");
                }
                Err(err)
            }
        }
    }

    fn validate(&self, request: &SaveRequest<T>) -> Result<()> {
        if request.business_key.is_empty() {
            return Err(Error::InvalidRequest(
                "business key must not be empty".to_string(),
            ));
        }
        if let Some(base) = request.base_version {
            if !base.is_valid() {
                return Err(Error::InvalidRequest(format!(
                    "base version {} is not a valid version number",
                    base
                )));
            }
        }
        Ok(())
    }

    fn insert_first(&self, request: SaveRequest<T>) -> Result<VersionedRecord<T>> {
        let at = self.clock.now();
        let mut audit = Audit::created(request.actor);
        audit.reason = request.reason;

        let row = VersionedRecord::first(request.business_key, request.payload, at, audit);

        self.store.write_atomic(None, Some(row.clone()))?;
        debug!(key = %row.business_key, "created chain at version 1");
        Ok(row)
    }

    fn transition(
        &self,
        request: SaveRequest<T>,
        base: VersionNumber,
    ) -> Result<VersionedRecord<T>> {
        let key = request.business_key;
        let current = match self.store.read_current(&key)? {
            Some(row) => row,
            None => {
                // Distinguish "never existed" from "deleted": a deleted
                // chain still has history.
                return if self.store.read_history(&key)?.is_empty() {
                    Err(Error::NotFound { key })
                } else {
                    Err(Error::Deleted { key })
                };
            }
        };

        // Fail fast on an obviously stale base before attempting the
        // write; the store's guard re-checks under the write lock, so
        // this early exit is an optimization, not the protection.
        if current.version != base {
            warn!(
                key = %key,
                base = %base,
                current = %current.version,
                "save rejected: base version is stale"
            );
            return Err(Error::Conflict {
                key,
                expected_version: base,
            });
        }

        // One captured instant for both halves of the transition (I2).
        let at = self.clock.now();
        let close = CloseOp {
            business_key: key.clone(),
            expected_version: base,
            at,
        };
        let audit = current.audit.updated(request.actor, request.reason);
        let next = current.successor(request.payload, at, audit);

        match self.store.write_atomic(Some(close), Some(next.clone())) {
            Ok(()) => {
                debug!(key = %key, version = %next.version, "transitioned chain");
                Ok(next)
            }
            Err(err) => {
                if err.is_conflict() {
                    warn!(key = %key, base = %base, "transition lost an optimistic race");
                }
                Err(err)
            }
        }
    }
}
