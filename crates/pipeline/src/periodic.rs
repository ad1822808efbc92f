//! Cooperative periodic scheduler, polled at the top of each frame cycle.

use std::time::{Duration, Instant};

/// Fires at most once per interval; the first firing is one interval after creation
#[derive(Debug, Clone)]
pub struct PeriodicTask {
    interval: Duration,
    next_due: Instant,
    fired: u64,
}

impl PeriodicTask {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next_due: now + interval,
            fired: 0,
        }
    }

    /// True if the task should run now; schedules the next run from `now`
    ///
    /// Missed intervals are not replayed: a long stall yields one firing.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due = now + self.interval;
        self.fired += 1;
        true
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn fired(&self) -> u64 {
        self.fired
    }
}
