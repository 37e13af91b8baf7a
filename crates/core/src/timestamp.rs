//! Microsecond-precision timestamps and validity intervals
//!
//! Timestamps are stored as microseconds since Unix epoch. Both the write
//! path (closing and opening intervals) and the read path (point-in-time
//! membership) use this one type, so boundary instants are never ambiguous
//! between reader and writer.
//!
//! Validity intervals are half-open `[valid_from, valid_to)`. An open
//! `valid_to` (None) means the version is current and the interval extends
//! to +infinity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};
use crate::key::BusinessKey;

/// Microsecond-precision timestamp
///
/// Represents a point in time as microseconds since Unix epoch. This is
/// the canonical time representation in the engine.
///
/// ## Invariants
///
/// - Timestamps are always non-negative (u64)
/// - Timestamps are always in microseconds
/// - The zero timestamp represents Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Unix epoch (1970-01-01 00:00:00 UTC)
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Maximum representable timestamp
    pub const MAX: Timestamp = Timestamp(u64::MAX);

    /// Create a timestamp for the current moment
    ///
    /// Uses system time. Returns epoch (0) if the system clock is before
    /// Unix epoch (e.g., clock went backwards due to NTP adjustment).
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp(duration.as_micros() as u64)
    }

    /// Create a timestamp from microseconds since epoch
    #[inline]
    pub const fn from_micros(micros: u64) -> Self {
        Timestamp(micros)
    }

    /// Create a timestamp from milliseconds since epoch
    #[inline]
    pub const fn from_millis(millis: u64) -> Self {
        Timestamp(millis.saturating_mul(1_000))
    }

    /// Create a timestamp from seconds since epoch
    #[inline]
    pub const fn from_secs(secs: u64) -> Self {
        Timestamp(secs.saturating_mul(1_000_000))
    }

    /// Get microseconds since Unix epoch
    #[inline]
    pub const fn as_micros(&self) -> u64 {
        self.0
    }

    /// Get milliseconds since Unix epoch (truncates)
    #[inline]
    pub const fn as_millis(&self) -> u64 {
        self.0 / 1_000
    }

    /// Add a duration, saturating at `Timestamp::MAX`
    pub fn saturating_add(&self, duration: Duration) -> Self {
        Timestamp(self.0.saturating_add(duration.as_micros() as u64))
    }

    /// Subtract a duration, saturating at `Timestamp::EPOCH`
    pub fn saturating_sub(&self, duration: Duration) -> Self {
        Timestamp(self.0.saturating_sub(duration.as_micros() as u64))
    }

    /// Check if this timestamp is strictly before another
    #[inline]
    pub fn is_before(&self, other: Timestamp) -> bool {
        self.0 < other.0
    }

    /// Check if this timestamp is strictly after another
    #[inline]
    pub fn is_after(&self, other: Timestamp) -> bool {
        self.0 > other.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Timestamp::EPOCH
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // RFC 3339 with microseconds, falling back to raw micros if the
        // value is outside chrono's representable range
        match DateTime::<Utc>::from_timestamp_micros(self.0 as i64) {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.6fZ")),
            None => write!(f, "{}us", self.0),
        }
    }
}

impl From<u64> for Timestamp {
    fn from(micros: u64) -> Self {
        Timestamp::from_micros(micros)
    }
}

impl From<Timestamp> for u64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

/// Half-open validity interval `[valid_from, valid_to)`
///
/// `valid_to == None` means the interval is open: the version it belongs
/// to is current and its validity extends to +infinity. Closing produces
/// the immutable historical interval.
///
/// ## Invariants
///
/// - `valid_from <= valid_to` when closed (empty intervals are legal:
///   two transitions within one microsecond close a row at its own
///   `valid_from`)
/// - Within a chain, row *v*'s `valid_to` equals row *v+1*'s `valid_from`
///   (invariant I2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityInterval {
    /// Inclusive lower bound
    pub valid_from: Timestamp,
    /// Exclusive upper bound; None while the version is current
    pub valid_to: Option<Timestamp>,
}

impl ValidityInterval {
    /// Create an open interval starting at `valid_from`
    pub const fn open_from(valid_from: Timestamp) -> Self {
        Self {
            valid_from,
            valid_to: None,
        }
    }

    /// True while `valid_to` is open
    #[inline]
    pub const fn is_open(&self) -> bool {
        self.valid_to.is_none()
    }

    /// Half-open membership test: `valid_from <= at < valid_to-or-infinity`
    pub fn contains(&self, at: Timestamp) -> bool {
        if at < self.valid_from {
            return false;
        }
        match self.valid_to {
            Some(to) => at < to,
            None => true,
        }
    }

    /// Close the interval at `at`
    ///
    /// Fails if the interval is already closed or if `at` precedes
    /// `valid_from` (which would make the interval run backwards).
    /// `at == valid_from` is legal and produces an empty interval.
    pub fn close(&self, at: Timestamp, key: &BusinessKey) -> Result<ValidityInterval> {
        match self.valid_to {
            Some(_) => Err(Error::CorruptChain {
                key: key.clone(),
                detail: "attempted to close an already-closed interval".to_string(),
            }),
            None if at < self.valid_from => Err(Error::CorruptChain {
                key: key.clone(),
                detail: format!(
                    "close instant {} precedes valid_from {}",
                    at, self.valid_from
                ),
            }),
            None => Ok(ValidityInterval {
                valid_from: self.valid_from,
                valid_to: Some(at),
            }),
        }
    }
}

impl fmt::Display for ValidityInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.valid_to {
            Some(to) => write!(f, "[{}, {})", self.valid_from, to),
            None => write!(f, "[{}, ∞)", self.valid_from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> BusinessKey {
        BusinessKey::new("C-100")
    }

    // ========================================
    // Timestamp Tests
    // ========================================

    #[test]
    fn test_timestamp_epoch() {
        assert_eq!(Timestamp::EPOCH.as_micros(), 0);
        assert_eq!(Timestamp::EPOCH.as_millis(), 0);
    }

    #[test]
    fn test_timestamp_from_units() {
        assert_eq!(Timestamp::from_secs(2).as_micros(), 2_000_000);
        assert_eq!(Timestamp::from_millis(5).as_micros(), 5_000);
        assert_eq!(Timestamp::from_micros(7).as_micros(), 7);
    }

    #[test]
    fn test_timestamp_now_advances() {
        let before = Timestamp::now();
        std::thread::sleep(Duration::from_millis(1));
        let after = Timestamp::now();
        assert!(after > before, "time should advance");
    }

    #[test]
    fn test_timestamp_ordering() {
        let t1 = Timestamp::from_micros(100);
        let t2 = Timestamp::from_micros(200);
        assert!(t1 < t2);
        assert!(t1.is_before(t2));
        assert!(t2.is_after(t1));
    }

    #[test]
    fn test_timestamp_saturating_arithmetic() {
        let ts = Timestamp::from_micros(1000);
        assert_eq!(ts.saturating_add(Duration::from_micros(500)).as_micros(), 1500);
        assert_eq!(ts.saturating_sub(Duration::from_micros(500)).as_micros(), 500);
        assert_eq!(
            Timestamp::EPOCH.saturating_sub(Duration::from_micros(1)),
            Timestamp::EPOCH
        );
        assert_eq!(
            Timestamp::MAX.saturating_add(Duration::from_micros(1)),
            Timestamp::MAX
        );
    }

    #[test]
    fn test_timestamp_display_rfc3339() {
        let ts = Timestamp::from_secs(0);
        assert_eq!(format!("{}", ts), "1970-01-01T00:00:00.000000Z");
    }

    #[test]
    fn test_timestamp_conversions() {
        let ts: Timestamp = 12345u64.into();
        assert_eq!(ts.as_micros(), 12345);
        let raw: u64 = ts.into();
        assert_eq!(raw, 12345);
    }

    #[test]
    fn test_timestamp_serialization() {
        let ts = Timestamp::from_micros(1_234_567);
        let json = serde_json::to_string(&ts).unwrap();
        let restored: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, restored);
    }

    // ========================================
    // ValidityInterval Tests
    // ========================================

    #[test]
    fn test_interval_open() {
        let iv = ValidityInterval::open_from(Timestamp::from_micros(100));
        assert!(iv.is_open());
        assert_eq!(iv.valid_to, None);
    }

    #[test]
    fn test_interval_contains_half_open() {
        let iv = ValidityInterval {
            valid_from: Timestamp::from_micros(100),
            valid_to: Some(Timestamp::from_micros(200)),
        };

        assert!(!iv.contains(Timestamp::from_micros(99)));
        assert!(iv.contains(Timestamp::from_micros(100)), "lower bound inclusive");
        assert!(iv.contains(Timestamp::from_micros(199)));
        assert!(!iv.contains(Timestamp::from_micros(200)), "upper bound exclusive");
    }

    #[test]
    fn test_interval_open_contains_everything_after_start() {
        let iv = ValidityInterval::open_from(Timestamp::from_micros(100));
        assert!(!iv.contains(Timestamp::from_micros(99)));
        assert!(iv.contains(Timestamp::from_micros(100)));
        assert!(iv.contains(Timestamp::MAX), "open upper bound is +infinity");
    }

    #[test]
    fn test_interval_close() {
        let iv = ValidityInterval::open_from(Timestamp::from_micros(100));
        let closed = iv.close(Timestamp::from_micros(250), &key()).unwrap();
        assert_eq!(closed.valid_from, Timestamp::from_micros(100));
        assert_eq!(closed.valid_to, Some(Timestamp::from_micros(250)));
        assert!(!closed.is_open());
    }

    #[test]
    fn test_interval_close_already_closed_fails() {
        let iv = ValidityInterval {
            valid_from: Timestamp::from_micros(100),
            valid_to: Some(Timestamp::from_micros(200)),
        };
        let result = iv.close(Timestamp::from_micros(300), &key());
        assert!(matches!(result, Err(Error::CorruptChain { .. })));
    }

    #[test]
    fn test_interval_close_before_start_fails() {
        let iv = ValidityInterval::open_from(Timestamp::from_micros(100));
        let result = iv.close(Timestamp::from_micros(50), &key());
        assert!(matches!(result, Err(Error::CorruptChain { .. })));
    }

    #[test]
    fn test_interval_close_at_start_produces_empty_interval() {
        // Two transitions within one microsecond: legal, empty interval
        let iv = ValidityInterval::open_from(Timestamp::from_micros(100));
        let closed = iv.close(Timestamp::from_micros(100), &key()).unwrap();
        assert_eq!(closed.valid_to, Some(Timestamp::from_micros(100)));
        assert!(!closed.contains(Timestamp::from_micros(100)));
    }

    #[test]
    fn test_interval_display() {
        let open = ValidityInterval::open_from(Timestamp::from_secs(0));
        assert!(format!("{}", open).ends_with("∞)"));
    }

    #[test]
    fn test_interval_serialization() {
        let iv = ValidityInterval {
            valid_from: Timestamp::from_micros(1),
            valid_to: Some(Timestamp::from_micros(2)),
        };
        let json = serde_json::to_string(&iv).unwrap();
        let restored: ValidityInterval = serde_json::from_str(&json).unwrap();
        assert_eq!(iv, restored);
    }
}
