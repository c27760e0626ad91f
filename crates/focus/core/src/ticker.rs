//! Periodic expiry check and progress refresh.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::host::ProgressDisplay;
use crate::session::SessionManager;

/// Delay between ticks close to the deadline.
pub const FAST_INTERVAL: Duration = Duration::from_secs(1);
/// Delay between ticks otherwise.
pub const SLOW_INTERVAL: Duration = Duration::from_secs(5);
/// Below this much remaining time, tick every second.
pub const FAST_THRESHOLD: Duration = Duration::from_secs(60);

/// Delay until the next tick given the time left.
pub fn next_interval(remaining: Duration) -> Duration {
    if remaining < FAST_THRESHOLD {
        FAST_INTERVAL
    } else {
        SLOW_INTERVAL
    }
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still running; tick again after `delay`.
    Continue { remaining: Duration, delay: Duration },
    /// Time is up; the session has been cleared.
    Expired,
    /// The session was stopped by someone else; nothing to do.
    Stopped,
}

/// Ticker for the running session.
pub struct Ticker {
    sessions: Arc<SessionManager>,
    display: Arc<dyn ProgressDisplay>,
}

impl Ticker {
    pub fn new(sessions: Arc<SessionManager>, display: Arc<dyn ProgressDisplay>) -> Self {
        Self { sessions, display }
    }

    /// Run one tick against the persisted session.
    pub fn tick(&self) -> TickOutcome {
        let now = self.sessions.now();
        let session = self.sessions.read();

        if !session.is_set() {
            return TickOutcome::Stopped;
        }

        if !session.is_active_at(now) {
            info!("focus session time is up");
            self.sessions.stop();
            return TickOutcome::Expired;
        }

        let remaining = session.remaining_at(now);
        self.display.show(remaining);

        let delay = next_interval(remaining);
        debug!(remaining_secs = remaining.as_secs(), delay_secs = delay.as_secs(), "tick");
        TickOutcome::Continue { remaining, delay }
    }

    /// Tick until the session expires or is stopped.
    ///
    /// The display is dismissed on the way out once anything was shown.
    pub async fn run(self) -> TickOutcome {
        let mut shown = false;
        loop {
            match self.tick() {
                TickOutcome::Continue { delay, .. } => {
                    shown = true;
                    tokio::time::sleep(delay).await;
                }
                TickOutcome::Expired => {
                    self.display.dismiss();
                    return TickOutcome::Expired;
                }
                TickOutcome::Stopped => {
                    if shown {
                        info!("focus session stopped elsewhere");
                        self.display.dismiss();
                    }
                    return TickOutcome::Stopped;
                }
            }
        }
    }
}
