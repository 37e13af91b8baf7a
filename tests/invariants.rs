//! Property tests: randomized save/delete interleavings never violate
//! the chain invariants, and the contract types survive serialization.

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;

use tempora::{
    Audit, BusinessKey, ManualClock, MemoryStore, SaveRequest, TemporalStore, Timestamp,
    VersionNumber, VersionTransitionCoordinator, VersionedRecord,
};

#[derive(Debug, Clone)]
enum Op {
    /// Save a new payload; `advance` is the clock step taken first, zero
    /// meaning a same-instant transition.
    Save { payload: u64, advance_micros: u64 },
    Delete,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (any::<u64>(), prop_oneof![Just(0u64), 1u64..=1_000]).prop_map(
            |(payload, advance_micros)| Op::Save {
                payload,
                advance_micros,
            }
        ),
        1 => Just(Op::Delete),
    ]
}

proptest! {
    /// Drive one chain through an arbitrary op sequence. The driver
    /// always re-reads before saving, so every accepted save extends the
    /// chain; after the delete the key is terminal. At every step the
    /// chain verifies: one current row at most, gapless versions,
    /// contiguous intervals, stable created_at.
    #[test]
    fn random_interleavings_preserve_chain_invariants(
        ops in prop::collection::vec(op_strategy(), 1..40)
    ) {
        let store: Arc<MemoryStore<u64>> = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Timestamp::from_micros(1_000_000)));
        let coordinator = VersionTransitionCoordinator::new(store.clone(), clock.clone());
        let key = BusinessKey::new("P-1");

        let mut expected_rows = 0usize;
        let mut deleted = false;

        for op in ops {
            match op {
                Op::Save { payload, advance_micros } => {
                    clock.advance(Duration::from_micros(advance_micros));
                    let request = match store.read_current(&key).unwrap() {
                        Some(current) => {
                            SaveRequest::update("P-1", payload, current.version, "prop")
                        }
                        None => SaveRequest::create("P-1", payload, "prop"),
                    };
                    let result = coordinator.save(request);
                    if deleted {
                        prop_assert!(result.is_err(), "deleted chains are terminal");
                    } else {
                        prop_assert!(result.is_ok());
                        expected_rows += 1;
                    }
                }
                Op::Delete => {
                    clock.advance(Duration::from_micros(1));
                    let result = coordinator.soft_delete(&key);
                    if deleted || expected_rows == 0 {
                        prop_assert!(result.is_err());
                    } else {
                        prop_assert!(result.is_ok());
                        deleted = true;
                    }
                }
            }

            // Invariants hold after every single step, not just at the end.
            store.verify_all().unwrap();
            let history = store.read_history(&key).unwrap();
            prop_assert_eq!(history.len(), expected_rows);

            let current_count = history.iter().filter(|r| r.is_current).count();
            if deleted || expected_rows == 0 {
                prop_assert_eq!(current_count, 0);
            } else {
                prop_assert_eq!(current_count, 1);
            }

            for (i, row) in history.iter().enumerate() {
                prop_assert_eq!(row.version.as_u32() as usize, i + 1);
                if i > 0 {
                    prop_assert_eq!(
                        history[i - 1].validity.valid_to,
                        Some(row.validity.valid_from)
                    );
                    prop_assert_eq!(row.created_at, history[0].created_at);
                }
            }
        }
    }

    /// Interval membership is exact at boundaries for arbitrary instants.
    #[test]
    fn at_time_never_returns_two_versions(
        probes in prop::collection::vec(0u64..5_000_000, 1..20)
    ) {
        let store: Arc<MemoryStore<u64>> = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Timestamp::from_micros(1_000_000)));
        let coordinator = VersionTransitionCoordinator::new(store.clone(), clock.clone());
        let key = BusinessKey::new("P-1");

        coordinator.save(SaveRequest::create("P-1", 1u64, "prop")).unwrap();
        for base in 1u32..=3 {
            clock.advance(Duration::from_micros(500_000));
            coordinator
                .save(SaveRequest::update(
                    "P-1",
                    u64::from(base) + 1,
                    VersionNumber::new(base),
                    "prop",
                ))
                .unwrap();
        }

        let history = store.read_history(&key).unwrap();
        for probe in probes {
            let at = Timestamp::from_micros(probe);
            let matching = history
                .iter()
                .filter(|row| row.validity.contains(at))
                .count();
            prop_assert!(matching <= 1, "intervals must not overlap at {}", at);

            let found = store.read_at(&key, at).unwrap();
            prop_assert_eq!(found.is_some(), matching == 1);
        }
    }
}

#[test]
fn envelope_serde_round_trip() {
    let row: VersionedRecord<Vec<String>> = VersionedRecord::first(
        BusinessKey::new("C-100"),
        vec!["a".to_string(), "b".to_string()],
        Timestamp::from_micros(42),
        Audit::created("alice"),
    );

    let json = serde_json::to_string(&row).unwrap();
    let back: VersionedRecord<Vec<String>> = serde_json::from_str(&json).unwrap();

    assert_eq!(back.technical_id, row.technical_id);
    assert_eq!(back.business_key, row.business_key);
    assert_eq!(back.version, row.version);
    assert_eq!(back.validity, row.validity);
    assert_eq!(back.payload, row.payload);
    assert_eq!(back.created_at, row.created_at);
    assert_eq!(back.audit.created_by, row.audit.created_by);
}
