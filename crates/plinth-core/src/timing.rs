//! Timing information for operations.
//!
//! [`Timing`] captures start and end timestamps of an operation; [`StageTimer`]
//! measures consecutive pipeline stages in milliseconds for debug records.

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

/// Timing information for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    /// When the operation started.
    pub started_at: Timestamp,
    /// When the operation ended.
    pub ended_at: Timestamp,
}

impl Timing {
    /// Create a new timing with the given start and end timestamps.
    pub fn new(started_at: Timestamp, ended_at: Timestamp) -> Self {
        Self {
            started_at,
            ended_at,
        }
    }

    /// Create a timing from a start timestamp and duration.
    pub fn from_duration(started_at: Timestamp, duration: SignedDuration) -> Self {
        Self {
            started_at,
            ended_at: started_at + duration,
        }
    }

    /// Get the duration of the operation.
    pub fn duration(&self) -> SignedDuration {
        self.ended_at.duration_since(self.started_at)
    }

    /// Get the duration in whole milliseconds.
    pub fn millis(&self) -> u64 {
        self.duration().as_millis().max(0) as u64
    }
}

/// Measures consecutive pipeline stages.
///
/// Each call to [`StageTimer::lap`] returns the milliseconds elapsed since the
/// previous lap (or since construction for the first lap).
#[derive(Debug)]
pub struct StageTimer {
    started_at: Timestamp,
    last_lap: Timestamp,
}

impl StageTimer {
    /// Starts a new timer.
    pub fn start() -> Self {
        let now = Timestamp::now();
        Self {
            started_at: now,
            last_lap: now,
        }
    }

    /// Returns milliseconds elapsed since the previous lap and resets the lap.
    pub fn lap(&mut self) -> u64 {
        let now = Timestamp::now();
        let elapsed = now.duration_since(self.last_lap);
        self.last_lap = now;
        elapsed.as_millis().max(0) as u64
    }

    /// Returns total milliseconds elapsed since the timer started.
    pub fn total(&self) -> u64 {
        Timestamp::now()
            .duration_since(self.started_at)
            .as_millis()
            .max(0) as u64
    }
}

impl Default for StageTimer {
    fn default() -> Self {
        Self::start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_duration() {
        let start = Timestamp::now();
        let end = start + SignedDuration::from_millis(250);

        let timing = Timing::new(start, end);
        assert_eq!(timing.duration().as_millis(), 250);
        assert_eq!(timing.millis(), 250);
    }

    #[test]
    fn timing_from_duration() {
        let start = Timestamp::now();
        let duration = SignedDuration::from_secs(2);

        let timing = Timing::from_duration(start, duration);
        assert_eq!(timing.ended_at, start + duration);
    }

    #[test]
    fn stage_timer_laps() {
        let mut timer = StageTimer::start();
        let first = timer.lap();
        let second = timer.lap();

        // Laps are non-negative and total covers both.
        assert!(timer.total() >= first + second);
    }
}
