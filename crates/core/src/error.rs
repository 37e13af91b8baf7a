//! Error types for the temporal versioning engine
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Every public operation enumerates its possible error kinds; none are
//! swallowed. Absence is a distinct kind from conflict: a caller that sees
//! [`Error::Conflict`] lost an optimistic race and should reload, while
//! [`Error::NotFound`] means there is nothing to reload.

use crate::key::{BusinessKey, TechnicalId};
use crate::version::VersionNumber;
use thiserror::Error;

/// Result type alias for temporal engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the temporal versioning engine
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// No row exists for the requested business key (or none at the
    /// requested instant)
    #[error("no record found for business key {key}")]
    NotFound {
        /// The business key that was looked up
        key: BusinessKey,
    },

    /// No row exists with the requested technical id
    #[error("no record found for technical id {id}")]
    IdNotFound {
        /// The per-version identifier that was looked up
        id: TechnicalId,
    },

    /// Optimistic guard tripped during a transition or delete
    ///
    /// Another writer already transitioned the chain past the version the
    /// caller based its save on. The caller must re-read and retry; the
    /// engine never retries or merges on its own.
    #[error(
        "record {key} changed since version {expected_version} was loaded; reload and retry"
    )]
    Conflict {
        /// The business key whose chain moved underneath the caller
        key: BusinessKey,
        /// The version the caller believed was current
        expected_version: VersionNumber,
    },

    /// Attempted version-1 insert for a key that already has a current row
    ///
    /// The coordinator never silently reinterprets an insert as a
    /// transition, so this is a programmer error in the caller.
    #[error("business key {key} already has a current version")]
    DuplicateKey {
        /// The business key that already exists
        key: BusinessKey,
    },

    /// Attempted write against a soft-deleted chain
    ///
    /// Deleted is a terminal state; the engine offers no reactivation path.
    #[error("business key {key} has been deleted; its chain is closed")]
    Deleted {
        /// The business key whose chain was ended by a soft delete
        key: BusinessKey,
    },

    /// The stored chain violates a structural invariant
    ///
    /// Surfaced defensively when a read or write observes a chain with
    /// version gaps, interval overlaps, or more than one current row. The
    /// engine never repairs such a chain.
    #[error("corrupt version chain for {key}: {detail}")]
    CorruptChain {
        /// The business key whose chain is malformed
        key: BusinessKey,
        /// Human-readable description of the violation
        detail: String,
    },

    /// Malformed save request rejected before reaching the store
    ///
    /// Programmer error in the caller: an empty business key or a
    /// declared version of 0. Unlike [`Error::Store`], retrying the
    /// identical request can never succeed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Persistence medium failure unrelated to the optimistic guard
    ///
    /// Safe to retry: `write_atomic` guarantees no partial effect.
    #[error("store error: {0}")]
    Store(String),
}

impl Error {
    /// True if this error indicates typed absence rather than failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. } | Error::IdNotFound { .. })
    }

    /// True if this error indicates a lost optimistic race
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound {
            key: BusinessKey::new("C-100"),
        };
        let msg = err.to_string();
        assert!(msg.contains("no record found"));
        assert!(msg.contains("C-100"));
    }

    #[test]
    fn test_error_display_conflict_reads_as_reload_and_retry() {
        let err = Error::Conflict {
            key: BusinessKey::new("L-7"),
            expected_version: VersionNumber::new(3),
        };
        let msg = err.to_string();
        assert!(msg.contains("L-7"));
        assert!(msg.contains("version 3"));
        assert!(msg.contains("reload and retry"));
    }

    #[test]
    fn test_error_display_duplicate_key() {
        let err = Error::DuplicateKey {
            key: BusinessKey::new("C-100"),
        };
        assert!(err.to_string().contains("already has a current version"));
    }

    #[test]
    fn test_error_display_deleted() {
        let err = Error::Deleted {
            key: BusinessKey::new("C-100"),
        };
        assert!(err.to_string().contains("deleted"));
    }

    #[test]
    fn test_error_display_corrupt_chain() {
        let err = Error::CorruptChain {
            key: BusinessKey::new("C-100"),
            detail: "version gap between 2 and 4".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("corrupt version chain"));
        assert!(msg.contains("version gap"));
    }

    #[test]
    fn test_error_display_invalid_request() {
        let err = Error::InvalidRequest("business key must not be empty".to_string());
        let msg = err.to_string();
        assert!(msg.contains("invalid request"));
        assert!(msg.contains("business key"));
    }

    #[test]
    fn test_error_display_store() {
        let err = Error::Store("write failed".to_string());
        assert!(err.to_string().contains("store error"));
        assert!(err.to_string().contains("write failed"));
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::NotFound {
            key: BusinessKey::new("x")
        }
        .is_not_found());
        assert!(Error::IdNotFound {
            id: TechnicalId::new()
        }
        .is_not_found());
        assert!(!Error::Store("x".into()).is_not_found());
    }

    #[test]
    fn test_is_conflict() {
        let conflict = Error::Conflict {
            key: BusinessKey::new("x"),
            expected_version: VersionNumber::FIRST,
        };
        assert!(conflict.is_conflict());
        assert!(!Error::DuplicateKey {
            key: BusinessKey::new("x")
        }
        .is_conflict());
    }

    #[test]
    fn test_error_pattern_matching() {
        let err = Error::Conflict {
            key: BusinessKey::new("L-7"),
            expected_version: VersionNumber::new(4),
        };

        match err {
            Error::Conflict {
                key,
                expected_version,
            } => {
                assert_eq!(key.as_str(), "L-7");
                assert_eq!(expected_version.as_u32(), 4);
            }
            _ => panic!("Wrong error variant"),
        }
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }

        fn returns_error() -> Result<i32> {
            Err(Error::Store("boom".to_string()))
        }

        assert_eq!(returns_result().unwrap(), 42);
        assert!(returns_error().is_err());
    }
}
