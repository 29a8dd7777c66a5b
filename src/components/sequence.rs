//! Scripted source producing predefined timestamped samples.

use crate::component::Source;
use crate::error::Result;
use crate::temporal::Timestamp;

/// Emits a fixed list of `(value, originating_time)` samples, one per cadence
/// tick, then retires. Handy for replaying a recorded stream or scripting a
/// sensor in tests.
///
/// The originating times must be non-decreasing, as on any producer;
/// a backwards sample surfaces as an
/// [`OrderingViolation`](crate::Error::OrderingViolation) when it is posted.
pub struct Sequence<T> {
    items: std::vec::IntoIter<(T, Timestamp)>,
}

impl<T> Sequence<T> {
    /// Create a sequence from timestamped samples.
    pub fn new(items: Vec<(T, Timestamp)>) -> Self {
        Self {
            items: items.into_iter(),
        }
    }

    /// Number of samples not yet emitted.
    pub fn remaining(&self) -> usize {
        self.items.len()
    }
}

impl<T: Clone + Send + 'static> Source for Sequence<T> {
    type Out = T;

    fn produce(&mut self) -> Result<Option<(T, Timestamp)>> {
        Ok(self.items.next())
    }
}
