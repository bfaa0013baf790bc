//! Poll backoff schedule for run status checks.
//!
//! The schedule is a pure function from attempt index to wait duration; it
//! never sleeps itself. The first `fast_attempts` polls wait `initial_wait`,
//! after which the wait grows by `multiplier` per attempt until it reaches
//! `max_wait` and stays there. Polling stops once `max_attempts` polls have
//! been made.

use std::time::Duration;

use bon::Builder;

/// Deterministic, non-decreasing wait sequence with a hard attempt ceiling.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct BackoffSchedule {
    /// Wait before each of the first `fast_attempts` polls.
    #[builder(default = Duration::from_millis(500))]
    pub initial_wait: Duration,
    /// Number of polls that use `initial_wait` before escalation starts.
    #[builder(default = 4)]
    pub fast_attempts: u32,
    /// Growth factor applied per attempt after the fast phase. Values below
    /// 1.0 are treated as 1.0.
    #[builder(default = 2.0)]
    pub multiplier: f64,
    /// Plateau every wait saturates to.
    #[builder(default = Duration::from_secs(4))]
    pub max_wait: Duration,
    /// Hard cap on the number of polls.
    #[builder(default = 60)]
    pub max_attempts: u32,
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl BackoffSchedule {
    /// Wait to apply before poll number `attempt` (zero-based).
    pub fn next_wait(&self, attempt: u32) -> Duration {
        let floor = self.initial_wait.min(self.max_wait);
        if attempt < self.fast_attempts {
            return floor;
        }

        let multiplier = self.multiplier.max(1.0);
        let exponent = (attempt - self.fast_attempts).saturating_add(1).min(64) as i32;
        let scaled = floor.as_secs_f64() * multiplier.powi(exponent);
        if !scaled.is_finite() || scaled >= self.max_wait.as_secs_f64() {
            return self.max_wait;
        }
        Duration::from_secs_f64(scaled).max(floor)
    }

    /// Whether poll number `attempt` (zero-based) may still be made.
    pub fn has_attempts_remaining(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Sum of every wait the schedule can produce: the worst-case time a
    /// turn spends sleeping between polls.
    pub fn worst_case_wait(&self) -> Duration {
        (0..self.max_attempts).map(|attempt| self.next_wait(attempt)).sum()
    }
}
