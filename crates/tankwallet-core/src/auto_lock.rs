//! Inactivity deadline for the unlocked session

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Re-armable inactivity deadline
///
/// Holds no timer of its own; callers compare the deadline against their
/// clock. Arming again replaces the previous deadline.
#[derive(Debug, Clone)]
pub struct AutoLock {
    timeout: Duration,
    deadline: Option<DateTime<Utc>>,
}

impl AutoLock {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            deadline: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Start (or restart) the window at `now`
    pub fn arm(&mut self, now: DateTime<Utc>) {
        // An unrepresentable deadline means the session never expires
        self.deadline = chrono::Duration::from_std(self.timeout)
            .ok()
            .and_then(|timeout| now.checked_add_signed(timeout));
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// True once `now` has reached the deadline
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.deadline, Some(deadline) if now >= deadline)
    }
}
