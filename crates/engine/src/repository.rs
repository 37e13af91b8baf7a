//! TemporalRepository: the entity-facing facade
//!
//! Bundles the coordinator, the query engine, and an `EnvelopeMapper`
//! into one surface that speaks the domain entity type. Callers never
//! construct envelopes or touch validity bookkeeping; they hand in
//! entities and get entities back.
//!
//! Routing follows the version the mapper projects onto the envelope:
//! version 1 creates the chain, version N transitions from base N-1.

use std::sync::Arc;

use tracing::debug;

use tempora_core::{
    BusinessKey, ClockSource, EnvelopeMapper, Error, Result, TechnicalId, TemporalStore,
    Timestamp, VersionNumber,
};

use crate::coordinator::{SaveRequest, VersionTransitionCoordinator};
use crate::query::PointInTimeQueryEngine;

/// Entity-facing repository over a temporal store
///
/// Generic over the mapper, the store, and the clock, so one repository
/// type serves every entity and every backend. Cheap to clone when the
/// mapper is.
pub struct TemporalRepository<M, S, C>
where
    M: EnvelopeMapper,
    S: TemporalStore<M::Payload>,
    C: ClockSource,
{
    mapper: M,
    coordinator: VersionTransitionCoordinator<M::Payload, S, C>,
    query: PointInTimeQueryEngine<M::Payload, S>,
}

impl<M, S, C> TemporalRepository<M, S, C>
where
    M: EnvelopeMapper,
    M::Payload: Clone + Send + Sync,
    S: TemporalStore<M::Payload>,
    C: ClockSource,
{
    /// Create a repository over a store and a clock
    pub fn new(mapper: M, store: Arc<S>, clock: Arc<C>) -> Self {
        let coordinator = VersionTransitionCoordinator::new(Arc::clone(&store), clock);
        let query = PointInTimeQueryEngine::new(store);
        Self {
            mapper,
            coordinator,
            query,
        }
    }

    /// Persist an entity as the next version of its chain
    ///
    /// The envelope the mapper projects decides the routing: version 1
    /// creates the chain, version N closes N-1 and inserts N under one
    /// captured instant. Returns the entity re-materialized from the row
    /// actually written (with its validity and audit fields populated).
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` when the entity declares version 0
    /// - `DuplicateKey` for a version-1 save over a live chain
    /// - `Conflict` when version N-1 is no longer current
    /// - `Deleted` when the chain was soft-deleted
    /// - `NotFound` when updating a key that never existed
    pub fn save(&self, entity: &M::Entity, actor: impl Into<String>) -> Result<M::Entity> {
        self.save_inner(entity, actor.into(), None)
    }

    /// Like [`save`](Self::save), recording a reason in the audit trail
    pub fn save_with_reason(
        &self,
        entity: &M::Entity,
        actor: impl Into<String>,
        reason: impl Into<String>,
    ) -> Result<M::Entity> {
        self.save_inner(entity, actor.into(), Some(reason.into()))
    }

    fn save_inner(
        &self,
        entity: &M::Entity,
        actor: String,
        reason: Option<String>,
    ) -> Result<M::Entity> {
        let envelope = self.mapper.to_envelope(entity);
        // Version 0 must fail loudly, never be reinterpreted as a create.
        if !envelope.version.is_valid() {
            return Err(Error::InvalidRequest(format!(
                "entity declares version {}, which is not a valid version number",
                envelope.version
            )));
        }
        let mut request = match envelope.version.prev() {
            None => SaveRequest::create(envelope.business_key, envelope.payload, actor),
            Some(base) => {
                SaveRequest::update(envelope.business_key, envelope.payload, base, actor)
            }
        };
        request.reason = reason;

        let row = self.coordinator.save(request)?;
        Ok(self.mapper.from_envelope(row))
    }

    /// Soft-delete the chain for `key`
    ///
    /// # Errors
    ///
    /// `NotFound` when the key has no current row (unknown or already
    /// deleted).
    pub fn delete(&self, key: &BusinessKey) -> Result<()> {
        self.coordinator.soft_delete(key)
    }

    /// The current entity for `key`, if the chain is live
    ///
    /// None for unknown keys and soft-deleted chains.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage medium fails.
    pub fn find_current_by_business_key(&self, key: &BusinessKey) -> Result<Option<M::Entity>> {
        Ok(self
            .coordinator
            .store()
            .read_current(key)?
            .map(|row| self.mapper.from_envelope(row)))
    }

    /// Navigate from any row's technical id to the chain's current entity
    ///
    /// The id may belong to a historical row; the lookup resolves its
    /// business key and returns the version that is current today.
    ///
    /// # Errors
    ///
    /// - `IdNotFound` when no row carries this id
    /// - `Deleted` when the id resolves to a soft-deleted chain
    pub fn find_current_by_id(&self, id: &TechnicalId) -> Result<M::Entity> {
        let store = self.coordinator.store();
        let row = store
            .read_by_id(id)?
            .ok_or_else(|| Error::IdNotFound { id: *id })?;

        match store.read_current(&row.business_key)? {
            Some(current) => Ok(self.mapper.from_envelope(current)),
            None => Err(Error::Deleted {
                key: row.business_key,
            }),
        }
    }

    /// The full chain for `key`, ascending by version
    ///
    /// Deleted chains keep their history and are returned in full.
    ///
    /// # Errors
    ///
    /// `NotFound` when the key never existed.
    pub fn find_history(&self, key: &BusinessKey) -> Result<Vec<M::Entity>> {
        let history = self.coordinator.store().read_history(key)?;
        if history.is_empty() {
            return Err(Error::NotFound { key: key.clone() });
        }
        Ok(history
            .into_iter()
            .map(|row| self.mapper.from_envelope(row))
            .collect())
    }

    /// The entity as it was at `as_of`
    ///
    /// # Errors
    ///
    /// `NotFound` when no version was valid at that instant (unknown key,
    /// before the chain's birth, or after its soft delete).
    pub fn find_at_time(&self, key: &BusinessKey, as_of: Timestamp) -> Result<M::Entity> {
        match self.query.at_time(key, as_of)? {
            Some(row) => Ok(self.mapper.from_envelope(row)),
            None => {
                debug!(key = %key, as_of = %as_of, "no version valid at requested instant");
                Err(Error::NotFound { key: key.clone() })
            }
        }
    }

    /// Versions of `key` that became valid in the inclusive `[from, to]`
    /// window, ascending; empty for unknown keys and empty windows
    ///
    /// # Errors
    ///
    /// Returns an error if the storage medium fails.
    pub fn find_changes_between(
        &self,
        key: &BusinessKey,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<M::Entity>> {
        Ok(self
            .query
            .changes_between(key, from, to)?
            .into_iter()
            .map(|row| self.mapper.from_envelope(row))
            .collect())
    }

    /// The current version number of `key`, without materializing the
    /// entity
    ///
    /// None for unknown keys and soft-deleted chains. Callers use this to
    /// learn the version to project onto their next save.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage medium fails.
    pub fn current_version(&self, key: &BusinessKey) -> Result<Option<VersionNumber>> {
        Ok(self
            .coordinator
            .store()
            .read_current(key)?
            .map(|row| row.version))
    }
}
