//! Capabilities the host platform provides.

use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::event::BlockedAttemptNotice;

/// Permission checks.
pub trait Permissions: Send + Sync {
    /// Whether the host lets us observe foreground changes.
    fn is_monitoring_permission_granted(&self) -> bool;

    /// Whether the progress display can be shown. Advisory only.
    fn are_notifications_enabled(&self) -> bool;
}

/// Dismisses the foreground app back to the home screen.
pub trait HomeAction: Send + Sync {
    fn return_to_home(&self) -> color_eyre::eyre::Result<()>;
}

/// Receives blocked-attempt notices. Must not block.
pub trait NoticeSink: Send + Sync {
    fn on_blocked_attempt(&self, notice: BlockedAttemptNotice);
}

/// Persistent status display for a running session.
pub trait ProgressDisplay: Send + Sync {
    fn show(&self, remaining: Duration);

    fn dismiss(&self);
}

/// Forwards notices over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<BlockedAttemptNotice>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BlockedAttemptNotice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NoticeSink for ChannelSink {
    fn on_blocked_attempt(&self, notice: BlockedAttemptNotice) {
        if self.tx.send(notice).is_err() {
            debug!("no listener for blocked-attempt notices");
        }
    }
}

/// Writes progress to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDisplay;

impl ProgressDisplay for LogDisplay {
    fn show(&self, remaining: Duration) {
        info!(remaining = %format_remaining(remaining), "focus session active");
    }

    fn dismiss(&self) {
        info!("focus session ended");
    }
}

/// Human-readable remaining time: `1h 5m`, `4m 12s`, or `9s`.
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;

    if hours > 0 {
        format!("{hours}h {mins}m")
    } else if mins > 0 {
        format!("{mins}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(Duration::from_secs(3900)), "1h 5m");
        assert_eq!(format_remaining(Duration::from_secs(252)), "4m 12s");
        assert_eq!(format_remaining(Duration::from_secs(9)), "9s");
        assert_eq!(format_remaining(Duration::ZERO), "0s");
    }

    #[test]
    fn test_channel_sink_survives_dropped_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.on_blocked_attempt(BlockedAttemptNotice {
            identifier: "a".into(),
            at: Utc::now(),
        });
    }
}
