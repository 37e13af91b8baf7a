//! Per-key version chains
//!
//! A chain is the append-only row set of one business key, ordered
//! ascending by version. The last row is the only candidate for
//! "current"; a chain whose last row is closed has been soft-deleted
//! and is terminal.

use tempora_core::{BusinessKey, Error, Result, Timestamp, VersionNumber, VersionedRecord};

/// Append-only version chain for a single business key
#[derive(Debug, Clone)]
pub struct Chain<T> {
    rows: Vec<VersionedRecord<T>>,
}

impl<T> Chain<T> {
    /// Create a chain from its first row
    pub fn new(first: VersionedRecord<T>) -> Self {
        Self { rows: vec![first] }
    }

    /// All rows, ascending by version
    pub fn rows(&self) -> &[VersionedRecord<T>] {
        &self.rows
    }

    /// The current row, if the chain has not been soft-deleted
    pub fn current(&self) -> Option<&VersionedRecord<T>> {
        self.rows.last().filter(|row| row.is_current)
    }

    /// The last row regardless of currency (for delete detection)
    pub fn last(&self) -> Option<&VersionedRecord<T>> {
        self.rows.last()
    }

    /// True once the chain has been ended by a soft delete
    ///
    /// Deleted chains keep their full history; they just have no current
    /// row and accept no further writes.
    pub fn is_deleted(&self) -> bool {
        matches!(self.rows.last(), Some(row) if !row.is_current)
    }

    /// The row valid at `as_of`, per half-open interval membership
    pub fn at(&self, as_of: Timestamp) -> Option<&VersionedRecord<T>> {
        // Chains are short (one row per business change); a reverse scan
        // finds the row in O(distance from newest).
        self.rows.iter().rev().find(|row| row.validity.contains(as_of))
    }

    /// Number of versions in the chain
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Chains are created non-empty and rows are never removed
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Replace the current row with its closed copy
    ///
    /// Internal to `write_atomic`; the caller has already validated the
    /// optimistic guard and built the closed row.
    pub(crate) fn swap_in_closed(&mut self, closed: VersionedRecord<T>) {
        if let Some(slot) = self.rows.last_mut() {
            *slot = closed;
        }
    }

    /// Append the successor row
    ///
    /// Internal to `write_atomic`; contiguity has already been validated.
    pub(crate) fn push(&mut self, row: VersionedRecord<T>) {
        self.rows.push(row);
    }

    /// Check structural invariants I1, I2, I3, I5 over this chain
    ///
    /// Returns `CorruptChain` naming the first violation found. Used by
    /// property tests and available to operators for audits.
    pub fn verify(&self, key: &BusinessKey) -> Result<()> {
        let corrupt = |detail: String| Error::CorruptChain {
            key: key.clone(),
            detail,
        };

        if self.rows.is_empty() {
            return Err(corrupt("chain has no rows".to_string()));
        }

        let created_at = self.rows[0].created_at;
        let mut current_count = 0usize;

        for (i, row) in self.rows.iter().enumerate() {
            // I3: versions form the sequence 1..N
            let expected = VersionNumber::new(i as u32 + 1);
            if row.version != expected {
                return Err(corrupt(format!(
                    "version {} at chain position {} (expected {})",
                    row.version, i, expected
                )));
            }

            // I5: created_at identical across the chain
            if row.created_at != created_at {
                return Err(corrupt(format!(
                    "created_at drift at version {}",
                    row.version
                )));
            }

            // Redundant flag agrees with the interval
            if !row.flag_consistent() {
                return Err(corrupt(format!(
                    "is_current flag disagrees with interval at version {}",
                    row.version
                )));
            }

            if row.is_current {
                current_count += 1;
                if i != self.rows.len() - 1 {
                    return Err(corrupt(format!(
                        "non-terminal version {} is marked current",
                        row.version
                    )));
                }
            }

            // I2: contiguous, non-overlapping intervals
            if i > 0 {
                let prev = &self.rows[i - 1];
                match prev.validity.valid_to {
                    Some(prev_to) if prev_to == row.validity.valid_from => {}
                    Some(prev_to) => {
                        return Err(corrupt(format!(
                            "gap or overlap between versions {} and {}: {} != {}",
                            prev.version, row.version, prev_to, row.validity.valid_from
                        )));
                    }
                    None => {
                        return Err(corrupt(format!(
                            "version {} has an open interval but a successor exists",
                            prev.version
                        )));
                    }
                }
            }
        }

        // I1: at most one current row (zero only for deleted chains)
        if current_count > 1 {
            return Err(corrupt(format!("{} rows marked current", current_count)));
        }

        Ok(())
    }
}
