//! MemoryStore: in-memory TemporalStore backend
//!
//! This module implements the TemporalStore trait using:
//! - `BTreeMap<BusinessKey, Chain<T>>` for ordered chain storage
//! - `parking_lot::RwLock` for thread-safe access
//! - An IdIndex secondary index for O(1) technical-id lookups
//!
//! # Design Notes
//!
//! - **One write lock per atomic write**: `write_atomic` validates the
//!   optimistic guard and applies close + insert while holding the write
//!   lock once. A failed validation releases the lock with the chain
//!   untouched, so there is no partial-write window.
//! - **Snapshot-consistent reads**: readers take the read lock; because
//!   every mutation happens under the write lock, a reader can never
//!   observe zero or two current rows for a key mid-transition.
//! - **Index updated atomically with data**: the IdIndex is mutated
//!   inside the same write lock as the chain map.
//! - **History is a snapshot**: `read_history` clones the chain at call
//!   time; later writes do not mutate the returned rows.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use tracing::{debug, trace};

use tempora_core::{
    BusinessKey, CloseOp, Error, Result, TechnicalId, TemporalStore, Timestamp, VersionedRecord,
};

use crate::chain::Chain;
use crate::index::IdIndex;

struct Inner<T> {
    chains: BTreeMap<BusinessKey, Chain<T>>,
    ids: IdIndex,
}

/// In-memory temporal store backed by a BTreeMap of version chains
///
/// Thread-safe through `parking_lot::RwLock`. Suitable as the engine's
/// reference backend and for tests; the `TemporalStore` trait seam allows
/// swapping in a database-backed implementation without touching the
/// coordinator or repository.
pub struct MemoryStore<T> {
    inner: RwLock<Inner<T>>,
}

impl<T> MemoryStore<T> {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                chains: BTreeMap::new(),
                ids: IdIndex::new(),
            }),
        }
    }

    /// Number of business keys with at least one version
    pub fn len(&self) -> usize {
        self.inner.read().chains.len()
    }

    /// True if no chain has been created yet
    pub fn is_empty(&self) -> bool {
        self.inner.read().chains.is_empty()
    }

    /// All business keys in the store, in key order
    pub fn keys(&self) -> Vec<BusinessKey> {
        self.inner.read().chains.keys().cloned().collect()
    }

    /// Total number of stored row versions across all chains
    pub fn row_count(&self) -> usize {
        self.inner.read().ids.len()
    }

    /// Check the structural invariants of one chain
    ///
    /// Returns `NotFound` for an unknown key, `CorruptChain` naming the
    /// first violation otherwise. Used by property tests and audits.
    pub fn verify(&self, key: &BusinessKey) -> Result<()> {
        let inner = self.inner.read();
        match inner.chains.get(key) {
            Some(chain) => chain.verify(key),
            None => Err(Error::NotFound { key: key.clone() }),
        }
    }

    /// Check the structural invariants of every chain
    pub fn verify_all(&self) -> Result<()> {
        let inner = self.inner.read();
        for (key, chain) in &inner.chains {
            chain.verify(key)?;
        }
        Ok(())
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync> MemoryStore<T> {
    /// Validate the close guard against the live chain
    ///
    /// Returns the closed copy of the current row without mutating
    /// anything; the caller applies it only after every validation in the
    /// atomic write has passed.
    fn prepare_close(inner: &Inner<T>, close: &CloseOp) -> Result<VersionedRecord<T>> {
        let conflict = || Error::Conflict {
            key: close.business_key.clone(),
            expected_version: close.expected_version,
        };

        let chain = inner.chains.get(&close.business_key).ok_or_else(conflict)?;
        let current = chain.current().ok_or_else(conflict)?;

        // The WHERE-guard: the row must still be current at the version
        // the caller read. Anything else means another writer won.
        if current.version != close.expected_version {
            return Err(conflict());
        }

        current.closed(close.at)
    }

    /// Validate an insert against the live chain and the paired close
    fn validate_insert(
        inner: &Inner<T>,
        insert: &VersionedRecord<T>,
        close: Option<&CloseOp>,
    ) -> Result<()> {
        let key = &insert.business_key;

        if !insert.is_current || !insert.validity.is_open() {
            return Err(Error::CorruptChain {
                key: key.clone(),
                detail: "inserted row must be current with an open interval".to_string(),
            });
        }

        if inner.ids.contains(&insert.technical_id) {
            return Err(Error::CorruptChain {
                key: key.clone(),
                detail: format!("technical id {} already exists", insert.technical_id),
            });
        }

        match close {
            None => {
                // First insert: the chain must not exist in any state.
                if let Some(chain) = inner.chains.get(key) {
                    if chain.is_deleted() {
                        return Err(Error::Deleted { key: key.clone() });
                    }
                    return Err(Error::DuplicateKey { key: key.clone() });
                }
                if !insert.version.is_first() {
                    return Err(Error::CorruptChain {
                        key: key.clone(),
                        detail: format!(
                            "insert without close must be version 1, got {}",
                            insert.version
                        ),
                    });
                }
            }
            Some(close) => {
                if close.business_key != *key {
                    return Err(Error::CorruptChain {
                        key: key.clone(),
                        detail: format!(
                            "close targets {} but insert targets {}",
                            close.business_key, key
                        ),
                    });
                }
                if insert.version != close.expected_version.next() {
                    return Err(Error::CorruptChain {
                        key: key.clone(),
                        detail: format!(
                            "insert version {} does not succeed closed version {}",
                            insert.version, close.expected_version
                        ),
                    });
                }
                if insert.validity.valid_from != close.at {
                    return Err(Error::CorruptChain {
                        key: key.clone(),
                        detail: "insert must open at the close instant".to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

impl<T: Clone + Send + Sync> TemporalStore<T> for MemoryStore<T> {
    fn read_current(&self, key: &BusinessKey) -> Result<Option<VersionedRecord<T>>> {
        let inner = self.inner.read();
        Ok(inner.chains.get(key).and_then(|c| c.current()).cloned())
    }

    fn read_at(&self, key: &BusinessKey, as_of: Timestamp) -> Result<Option<VersionedRecord<T>>> {
        let inner = self.inner.read();
        Ok(inner.chains.get(key).and_then(|c| c.at(as_of)).cloned())
    }

    fn read_history(&self, key: &BusinessKey) -> Result<Vec<VersionedRecord<T>>> {
        let inner = self.inner.read();
        Ok(inner
            .chains
            .get(key)
            .map(|c| c.rows().to_vec())
            .unwrap_or_default())
    }

    fn read_by_id(&self, id: &TechnicalId) -> Result<Option<VersionedRecord<T>>> {
        let inner = self.inner.read();
        let Some((key, version)) = inner.ids.get(id) else {
            return Ok(None);
        };
        let row = inner.chains.get(key).and_then(|chain| {
            let position = version.as_u32() as usize - 1;
            chain.rows().get(position)
        });
        Ok(row.cloned())
    }

    fn write_atomic(
        &self,
        close: Option<CloseOp>,
        insert: Option<VersionedRecord<T>>,
    ) -> Result<()> {
        if close.is_none() && insert.is_none() {
            return Err(Error::Store(
                "write_atomic requires a close or an insert".to_string(),
            ));
        }

        let mut inner = self.inner.write();

        // Validate everything before mutating anything: a rejected write
        // must leave the prior current row untouched.
        let closed_row = match &close {
            Some(op) => Some(Self::prepare_close(&inner, op)?),
            None => None,
        };
        if let Some(row) = &insert {
            Self::validate_insert(&inner, row, close.as_ref())?;
        }

        if let (Some(op), Some(closed)) = (&close, closed_row) {
            if let Some(chain) = inner.chains.get_mut(&op.business_key) {
                chain.swap_in_closed(closed);
            }
            trace!(key = %op.business_key, version = %op.expected_version, at = %op.at, "closed current row");
        }

        if let Some(row) = insert {
            let key = row.business_key.clone();
            let id = row.technical_id;
            let version = row.version;

            inner.ids.insert(id, key.clone(), version);
            match inner.chains.get_mut(&key) {
                Some(chain) => chain.push(row),
                None => {
                    inner.chains.insert(key.clone(), Chain::new(row));
                }
            }
            debug!(key = %key, version = %version, "inserted row version");
        }

        Ok(())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use tempora_core::Audit;

    /// A random walk of transitions applied to one chain must keep every
    /// structural invariant intact and leave exactly one current row.
    fn apply_transitions(store: &MemoryStore<u32>, key: &BusinessKey, payloads: &[u32]) {
        let mut at = 1_000u64;
        for payload in payloads {
            at += 100;
            let current = store.read_current(key).unwrap().unwrap();
            let instant = Timestamp::from_micros(at);
            let close = CloseOp {
                business_key: key.clone(),
                expected_version: current.version,
                at: instant,
            };
            let next = current.successor(*payload, instant, current.audit.clone());
            store.write_atomic(Some(close), Some(next)).unwrap();
        }
    }

    proptest! {
        #[test]
        fn chain_invariants_hold_under_random_transitions(
            payloads in proptest::collection::vec(any::<u32>(), 0..20),
            delete in any::<bool>(),
        ) {
            let store = MemoryStore::new();
            let key = BusinessKey::new("P-1");
            let v1 = VersionedRecord::first(
                key.clone(),
                0u32,
                Timestamp::from_micros(1_000),
                Audit::created("prop"),
            );
            store.write_atomic(None, Some(v1)).unwrap();
            apply_transitions(&store, &key, &payloads);

            if delete {
                let current = store.read_current(&key).unwrap().unwrap();
                store.write_atomic(
                    Some(CloseOp {
                        business_key: key.clone(),
                        expected_version: current.version,
                        at: Timestamp::from_micros(1_000_000),
                    }),
                    None,
                ).unwrap();
            }

            // Structural invariants I1, I2, I3, I5
            store.verify(&key).unwrap();

            let history = store.read_history(&key).unwrap();
            prop_assert_eq!(history.len(), payloads.len() + 1);

            let current_rows = history.iter().filter(|r| r.is_current).count();
            prop_assert_eq!(current_rows, if delete { 0 } else { 1 });

            // valid_from values ascend with version (non-strictly: the
            // manual walk always advances the clock, so strictly here)
            for pair in history.windows(2) {
                prop_assert!(pair[0].validity.valid_from < pair[1].validity.valid_from);
                prop_assert_eq!(
                    pair[0].validity.valid_to,
                    Some(pair[1].validity.valid_from)
                );
            }
        }
    }
}
