// src/timer.rs
// Accumulated-interval trigger for periodic work such as map snapshots. Each tick
// adds its elapsed time; the timer fires once the total reaches the period and
// carries the remainder over, so the cadence does not drift with tick jitter.

use std::time::Duration;

/// Fires once per accumulated `period` of elapsed time
#[derive(Clone, Debug)]
pub struct IntervalTimer {
    period: Duration,
    accumulated: Duration,
}

impl IntervalTimer {
    /// Timer with nothing accumulated yet
    pub fn new(period: Duration) -> Self {
        IntervalTimer {
            period,
            accumulated: Duration::ZERO,
        }
    }

    /// Adds `elapsed` and returns true if the period has been reached.
    /// Fires at most once per call, however long `elapsed` was.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        if self.period.is_zero() {
            return true;
        }
        self.accumulated += elapsed;
        if self.accumulated >= self.period {
            // Keep the overshoot, but never bank more than one extra period
            self.accumulated = (self.accumulated - self.period).min(self.period);
            true
        } else {
            false
        }
    }
}
