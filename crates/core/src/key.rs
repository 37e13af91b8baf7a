//! Identifier types for versioned records
//!
//! Two identities coexist for every stored row:
//! - `BusinessKey`: the stable logical identifier shared by every version
//!   in a chain. Assigned once at version 1, immutable afterwards.
//! - `TechnicalId`: an opaque per-version identifier, globally unique and
//!   never reused. Two versions of the same entity have the same business
//!   key but distinct technical ids.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable logical identifier for an entity across all its versions
///
/// Business keys are caller-supplied strings ("C-100", "contract:2024-17",
/// ...). The engine treats them as opaque; it only requires equality and
/// ordering (chains are kept in a `BTreeMap` keyed by business key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BusinessKey(String);

impl BusinessKey {
    /// Create a business key from any string-like value
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// View the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the key is the empty string
    ///
    /// Empty keys are rejected at the coordinator boundary; this exists so
    /// the check lives next to the type.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for BusinessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BusinessKey {
    fn from(s: &str) -> Self {
        BusinessKey::new(s)
    }
}

impl From<String> for BusinessKey {
    fn from(s: String) -> Self {
        BusinessKey::new(s)
    }
}

/// Opaque per-version identifier, globally unique, never reused
///
/// A TechnicalId is a wrapper around a UUID v4. Every row version gets a
/// fresh one; history rows keep theirs forever since they are never
/// physically deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TechnicalId(Uuid);

impl TechnicalId {
    /// Create a new random TechnicalId using UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a TechnicalId from raw bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Parse a TechnicalId from a string representation
    ///
    /// Accepts standard UUID format (with or without hyphens).
    /// Returns None if the string is not a valid UUID.
    pub fn from_string(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }

    /// Get the raw bytes of this TechnicalId
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for TechnicalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TechnicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
