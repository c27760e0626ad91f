//! Reacts to foreground changes while a session is running.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::event::{BlockedAttemptNotice, ForegroundEvent};
use crate::host::{HomeAction, NoticeSink};
use crate::session::SessionManager;

/// What the monitor did with a foreground event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// No session is running.
    Idle,
    /// Session running, app not in the block set.
    Allowed,
    /// App was blocked and sent home.
    Blocked,
}

/// Block monitor.
///
/// The session is reloaded on every event, so a session started while the
/// monitor is live takes effect on the next event.
pub struct BlockMonitor {
    sessions: Arc<SessionManager>,
    home: Arc<dyn HomeAction>,
    notices: Arc<dyn NoticeSink>,
}

impl BlockMonitor {
    pub fn new(
        sessions: Arc<SessionManager>,
        home: Arc<dyn HomeAction>,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        Self {
            sessions,
            home,
            notices,
        }
    }

    /// Handle one foreground change.
    pub fn on_foreground_change(&self, event: &ForegroundEvent) -> Verdict {
        let now = self.sessions.now();

        let Some(session) = self.sessions.active_session(now) else {
            return Verdict::Idle;
        };

        if !session.blocks(&event.identifier) {
            debug!(app = %event.identifier, "foreground app allowed");
            return Verdict::Allowed;
        }

        info!(app = %event.identifier, "blocked app reached foreground");

        self.notices.on_blocked_attempt(BlockedAttemptNotice {
            identifier: event.identifier.clone(),
            at: now,
        });

        if let Err(e) = self.home.return_to_home() {
            warn!(app = %event.identifier, error = %e, "failed to return to home");
        }

        Verdict::Blocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingHome, RecordingSink, sessions};
    use std::sync::atomic::Ordering;

    fn monitor() -> (
        BlockMonitor,
        Arc<SessionManager>,
        Arc<crate::clock::ManualClock>,
        Arc<RecordingHome>,
        Arc<RecordingSink>,
    ) {
        let (sessions, clock) = sessions();
        let home = Arc::new(RecordingHome::default());
        let sink = Arc::new(RecordingSink::default());
        let monitor = BlockMonitor::new(sessions.clone(), home.clone(), sink.clone());
        (monitor, sessions, clock, home, sink)
    }

    #[test]
    fn test_blocked_app_sent_home_once() {
        let (monitor, sessions, _, home, sink) = monitor();
        sessions.start(["a", "b"], 300).unwrap();

        assert_eq!(
            monitor.on_foreground_change(&ForegroundEvent::new("a")),
            Verdict::Blocked
        );
        assert_eq!(home.calls.load(Ordering::SeqCst), 1);

        let notices = sink.notices.lock().unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].identifier, "a");
    }

    #[test]
    fn test_unlisted_app_untouched() {
        let (monitor, sessions, _, home, sink) = monitor();
        sessions.start(["a", "b"], 300).unwrap();

        assert_eq!(
            monitor.on_foreground_change(&ForegroundEvent::new("c")),
            Verdict::Allowed
        );
        assert_eq!(home.calls.load(Ordering::SeqCst), 0);
        assert!(sink.notices.lock().unwrap().is_empty());
    }

    #[test]
    fn test_expired_session_ignored_and_cleared() {
        let (monitor, sessions, clock, home, sink) = monitor();
        sessions.start(["a"], 60).unwrap();
        clock.advance_secs(61);

        assert_eq!(
            monitor.on_foreground_change(&ForegroundEvent::new("a")),
            Verdict::Idle
        );
        assert_eq!(home.calls.load(Ordering::SeqCst), 0);
        assert!(sink.notices.lock().unwrap().is_empty());
        assert!(!sessions.read().is_set());
    }

    #[test]
    fn test_idle_without_session() {
        let (monitor, _, _, home, _) = monitor();
        assert_eq!(
            monitor.on_foreground_change(&ForegroundEvent::new("a")),
            Verdict::Idle
        );
        assert_eq!(home.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_repeated_events_each_send_home() {
        let (monitor, sessions, _, home, sink) = monitor();
        sessions.start(["a"], 300).unwrap();

        for _ in 0..3 {
            monitor.on_foreground_change(&ForegroundEvent::new("a"));
        }
        assert_eq!(home.calls.load(Ordering::SeqCst), 3);
        assert_eq!(sink.notices.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_picks_up_session_started_while_live() {
        let (monitor, sessions, _, _, _) = monitor();
        sessions.start(["a"], 300).unwrap();
        assert_eq!(
            monitor.on_foreground_change(&ForegroundEvent::new("b")),
            Verdict::Allowed
        );

        sessions.start(["b"], 300).unwrap();
        assert_eq!(
            monitor.on_foreground_change(&ForegroundEvent::new("b")),
            Verdict::Blocked
        );
    }
}
