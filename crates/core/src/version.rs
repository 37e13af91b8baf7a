//! Version numbers for record chains
//!
//! Versions start at 1 and increment by exactly 1 per transition. The
//! sequence 1..N of a chain has no gaps and no reuse (invariant I3); a
//! chain that violates this is rejected as corrupt rather than repaired.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Positive version number within a business key's chain
///
/// Version 1 marks the birth of a chain. Each transition produces the
/// successor `next()`. Zero is not a valid version; the coordinator
/// rejects saves that declare it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct VersionNumber(u32);

impl VersionNumber {
    /// The version assigned at chain creation
    pub const FIRST: VersionNumber = VersionNumber(1);

    /// Create a version number from a raw value
    ///
    /// Callers declaring the version they last read use this; the value 0
    /// constructs but never validates.
    pub const fn new(n: u32) -> Self {
        VersionNumber(n)
    }

    /// Raw numeric value
    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// The successor version (v + 1)
    #[inline]
    pub const fn next(&self) -> VersionNumber {
        VersionNumber(self.0 + 1)
    }

    /// The predecessor version, or None for version 1 (and the invalid 0)
    pub const fn prev(&self) -> Option<VersionNumber> {
        if self.0 > 1 {
            Some(VersionNumber(self.0 - 1))
        } else {
            None
        }
    }

    /// True for version 1, the chain-creating save
    #[inline]
    pub const fn is_first(&self) -> bool {
        self.0 == 1
    }

    /// True for any positive version number
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.0 >= 1
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
