use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Cooperative bounded wait: a deadline plus a fixed poll interval.
///
/// The caller checks, then calls [`PollBudget::wait_next`]; a `false` return
/// means the deadline has passed and the caller should stop probing.
#[derive(Debug, Clone)]
pub struct PollBudget {
    deadline: Instant,
    interval: Duration,
}

impl PollBudget {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
            interval,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn expired(&self) -> bool {
        self.remaining().is_zero()
    }

    /// Sleep until the next check. Never sleeps past the deadline.
    pub async fn wait_next(&mut self) -> bool {
        let remaining = self.remaining();
        if remaining.is_zero() {
            return false;
        }
        sleep(self.interval.min(remaining)).await;
        true
    }
}
