//! PointInTimeQueryEngine: read-only historical reconstruction
//!
//! Answers "what was entity E as of time T" and "what changed between T1
//! and T2". The engine only reads; it never takes a write path, so it is
//! safe to point at a read replica of the store.
//!
//! Interval membership is half-open `[valid_from, valid_to)`; an open
//! `valid_to` is treated as +infinity. Time comparisons use the same
//! microsecond `Timestamp` as the writer, so boundary instants are exact:
//! at `t1` the successor applies, at `t1 - 1µs` the predecessor does.

use std::sync::Arc;

use tempora_core::{BusinessKey, Result, TemporalStore, Timestamp, VersionedRecord};

/// Read-only query engine over a temporal store
pub struct PointInTimeQueryEngine<T, S>
where
    S: TemporalStore<T>,
{
    store: Arc<S>,
    _payload: std::marker::PhantomData<fn() -> T>,
}

impl<T, S> Clone for PointInTimeQueryEngine<T, S>
where
    S: TemporalStore<T>,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _payload: std::marker::PhantomData,
        }
    }
}

impl<T, S> PointInTimeQueryEngine<T, S>
where
    T: Clone + Send + Sync,
    S: TemporalStore<T>,
{
    /// Create a query engine over a store handle
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            _payload: std::marker::PhantomData,
        }
    }

    /// The version of `key` valid at `as_of`, if any
    ///
    /// None when the key is unknown, when `as_of` precedes the chain's
    /// birth, or when `as_of` falls after a soft delete closed the chain.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage medium fails.
    pub fn at_time(
        &self,
        key: &BusinessKey,
        as_of: Timestamp,
    ) -> Result<Option<VersionedRecord<T>>> {
        self.store.read_at(key, as_of)
    }

    /// Versions of `key` whose `valid_from` falls in `[from, to]`
    ///
    /// The window is inclusive on both ends and filters on when a version
    /// *became* valid, so a version created before `from` but still valid
    /// inside the window is not a "change" and is excluded. Ascending by
    /// version; empty for unknown keys and empty windows.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage medium fails.
    pub fn changes_between(
        &self,
        key: &BusinessKey,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<VersionedRecord<T>>> {
        if to < from {
            return Ok(Vec::new());
        }
        let history = self.store.read_history(key)?;
        Ok(history
            .into_iter()
            .filter(|row| row.validity.valid_from >= from && row.validity.valid_from <= to)
            .collect())
    }
}
