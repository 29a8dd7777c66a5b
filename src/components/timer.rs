//! Clock tick source.

use crate::component::Source;
use crate::error::Result;
use crate::temporal::Timestamp;

/// Emits an incrementing tick count at the cadence it is registered with,
/// stamped with the current wall-clock time.
///
/// The usual clock input for alignment components such as
/// [`Repeater`](super::Repeater): connect its output to the repeater's clock
/// receiver and every tick re-emits the held sample.
///
/// # Example
///
/// ```rust,ignore
/// use chronoflow::components::Timer;
/// use std::time::Duration;
///
/// // a 50 Hz clock that stops after 100 ticks
/// let clock = pipeline.add_source(
///     "clock",
///     Timer::with_limit(100),
///     Duration::from_millis(20),
/// );
/// ```
pub struct Timer {
    ticks: u64,
    limit: Option<u64>,
    last: Timestamp,
}

impl Timer {
    /// Create a timer that ticks until the pipeline stops.
    pub fn new() -> Self {
        Self {
            ticks: 0,
            limit: None,
            last: Timestamp::zero(),
        }
    }

    /// Create a timer that retires after `limit` ticks.
    pub fn with_limit(limit: u64) -> Self {
        Self {
            ticks: 0,
            limit: Some(limit),
            last: Timestamp::zero(),
        }
    }

    /// Number of ticks emitted so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Source for Timer {
    type Out = u64;

    fn produce(&mut self) -> Result<Option<(u64, Timestamp)>> {
        if let Some(limit) = self.limit {
            if self.ticks >= limit {
                return Ok(None);
            }
        }
        // the wall clock may step backwards between ticks; keep the stream monotone
        let now = Timestamp::now().max(self.last);
        self.last = now;
        let tick = self.ticks;
        self.ticks += 1;
        Ok(Some((tick, now)))
    }
}
