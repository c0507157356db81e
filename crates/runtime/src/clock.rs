//! Time sources for poll scheduling.
//!
//! Sessions never sleep; they compare [`Clock::now`] against a
//! [`PollSchedule`] on every frame. Tests drive a [`ManualClock`].

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

/// Monotonic time since the clock was created.
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

/// Wall-clock time backed by `tokio::time::Instant`.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.lock().map(|now| *now).unwrap_or_default()
    }
}

/// Fixed-interval retry schedule for order polling.
///
/// Disarmed while the session is running or acting locally; armed, and due
/// immediately, when a pause for a remote player begins.
#[derive(Clone, Debug)]
pub struct PollSchedule {
    interval: Duration,
    next_due: Option<Duration>,
}

impl PollSchedule {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    /// Makes a poll due right away.
    pub fn arm(&mut self, now: Duration) {
        self.next_due = Some(now);
    }

    pub fn disarm(&mut self) {
        self.next_due = None;
    }

    pub fn is_due(&self, now: Duration) -> bool {
        self.next_due.is_some_and(|due| now >= due)
    }

    /// Pushes the next poll one interval past `now`.
    pub fn record_poll(&mut self, now: Duration) {
        if self.next_due.is_some() {
            self.next_due = Some(now + self.interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_only_moves_when_advanced() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Duration::ZERO);
        clock.advance(Duration::from_millis(250));
        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now(), Duration::from_millis(500));
    }

    #[test]
    fn schedule_is_due_on_arm_then_every_interval() {
        let mut schedule = PollSchedule::new(Duration::from_millis(500));
        let start = Duration::from_secs(3);
        assert!(!schedule.is_due(start));

        schedule.arm(start);
        assert!(schedule.is_due(start));

        schedule.record_poll(start);
        assert!(!schedule.is_due(start + Duration::from_millis(499)));
        assert!(schedule.is_due(start + Duration::from_millis(500)));

        schedule.disarm();
        assert!(!schedule.is_due(start + Duration::from_secs(10)));
    }

    #[test]
    fn recording_a_poll_does_not_arm() {
        let mut schedule = PollSchedule::new(Duration::from_millis(500));
        schedule.record_poll(Duration::ZERO);
        assert!(!schedule.is_armed());
    }
}
