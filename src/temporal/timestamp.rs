//! Timestamp type.

use std::ops::{Add, Sub};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A high-precision timestamp in nanoseconds since an epoch.
///
/// Timestamps serve two roles in the runtime:
///
/// - **Originating time**: the logical time the underlying real-world event
///   occurred. This is the ordering key for every delivery guarantee.
/// - **Creation time**: the wall-clock time a message was produced,
///   carried for diagnostics only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp {
    nanos: u64,
}

impl Timestamp {
    /// Create a timestamp from nanoseconds.
    pub const fn from_nanos(nanos: u64) -> Self {
        Self { nanos }
    }

    /// Create a timestamp from milliseconds.
    pub const fn from_millis(millis: u64) -> Self {
        Self::from_nanos(millis * 1_000_000)
    }

    /// Create a timestamp from seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Self::from_nanos(secs * 1_000_000_000)
    }

    /// Create a timestamp from a Duration.
    pub fn from_duration(duration: Duration) -> Self {
        Self::from_nanos(duration.as_nanos() as u64)
    }

    /// Get the current wall-clock time.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Self::from_nanos(duration.as_nanos() as u64)
    }

    /// Create a zero timestamp (epoch).
    pub const fn zero() -> Self {
        Self::from_nanos(0)
    }

    /// Get the raw nanoseconds value.
    pub const fn as_nanos(&self) -> u64 {
        self.nanos
    }

    /// Get the timestamp in milliseconds.
    pub const fn as_millis(&self) -> u64 {
        self.nanos / 1_000_000
    }

    /// Get the timestamp in seconds.
    pub const fn as_secs(&self) -> u64 {
        self.nanos / 1_000_000_000
    }

    /// Convert to a Duration.
    pub fn as_duration(&self) -> Duration {
        Duration::from_nanos(self.nanos)
    }

    /// Calculate the absolute difference between two timestamps.
    pub fn abs_diff(&self, other: &Self) -> Duration {
        Duration::from_nanos(self.nanos.abs_diff(other.nanos))
    }

    /// Saturating subtraction - returns zero if result would be negative.
    pub fn saturating_sub(&self, duration: Duration) -> Self {
        Self {
            nanos: self.nanos.saturating_sub(duration.as_nanos() as u64),
        }
    }
}

impl Add<Duration> for Timestamp {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self {
            nanos: self.nanos + rhs.as_nanos() as u64,
        }
    }
}

impl Sub<Duration> for Timestamp {
    type Output = Self;

    fn sub(self, rhs: Duration) -> Self::Output {
        Self {
            nanos: self.nanos - rhs.as_nanos() as u64,
        }
    }
}

impl Sub<Timestamp> for Timestamp {
    type Output = Duration;

    fn sub(self, rhs: Timestamp) -> Self::Output {
        Duration::from_nanos(self.nanos.saturating_sub(rhs.nanos))
    }
}

impl From<Duration> for Timestamp {
    fn from(d: Duration) -> Self {
        Self::from_duration(d)
    }
}

impl From<Timestamp> for Duration {
    fn from(ts: Timestamp) -> Self {
        ts.as_duration()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let secs = self.as_secs();
        let nanos = self.nanos % 1_000_000_000;
        write!(f, "{}.{:09}s", secs, nanos)
    }
}
