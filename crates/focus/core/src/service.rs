//! Long-running presence that keeps the ticker alive.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

use crate::host::ProgressDisplay;
use crate::session::SessionManager;
use crate::ticker::{TickOutcome, Ticker};

/// Owns the ticker task for the running session.
///
/// Must be started from within a tokio runtime.
pub struct FocusService {
    sessions: Arc<SessionManager>,
    display: Arc<dyn ProgressDisplay>,
    task: Mutex<Option<JoinHandle<TickOutcome>>>,
}

impl FocusService {
    pub fn new(sessions: Arc<SessionManager>, display: Arc<dyn ProgressDisplay>) -> Self {
        Self {
            sessions,
            display,
            task: Mutex::new(None),
        }
    }

    /// Start ticking for the persisted session, replacing any running ticker.
    ///
    /// Returns `false` when there was no time left, in which case the session
    /// is cleared without scheduling anything.
    pub fn start(&self) -> bool {
        self.cancel_ticker();

        if self.sessions.remaining().is_zero() {
            info!("focus session already over, not starting ticker");
            self.sessions.stop();
            self.display.dismiss();
            return false;
        }

        let ticker = Ticker::new(self.sessions.clone(), self.display.clone());
        let handle = tokio::spawn(ticker.run());
        *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);

        info!("focus service started");
        true
    }

    /// Resume ticking for a session persisted by an earlier process.
    pub fn adopt(&self) -> bool {
        if self.is_running() || !self.sessions.status() {
            return false;
        }
        info!("resuming persisted focus session");
        self.start()
    }

    /// Cancel the ticker and clear the session. Safe to call at any time.
    pub fn stop(&self) {
        let was_running = self.cancel_ticker();
        self.sessions.stop();
        if was_running {
            self.display.dismiss();
            info!("focus service stopped");
        }
    }

    /// Time left in the running session.
    pub fn remaining_time(&self) -> Duration {
        self.sessions.remaining()
    }

    /// Whether a session is running and being ticked.
    pub fn is_active(&self) -> bool {
        self.is_running() && self.sessions.status()
    }

    fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Abort the ticker task, returning whether one was still running.
    fn cancel_ticker(&self) -> bool {
        let task = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        match task {
            Some(task) if !task.is_finished() => {
                task.abort();
                true
            }
            _ => false,
        }
    }
}

impl Drop for FocusService {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingDisplay, sessions};
    use std::sync::atomic::Ordering;

    fn service() -> (
        FocusService,
        Arc<SessionManager>,
        Arc<crate::clock::ManualClock>,
        Arc<RecordingDisplay>,
    ) {
        let (sessions, clock) = sessions();
        let display = Arc::new(RecordingDisplay::default());
        let service = FocusService::new(sessions.clone(), display.clone());
        (service, sessions, clock, display)
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_reports_remaining() {
        let (service, sessions, clock, _) = service();
        sessions.start(["a"], 600).unwrap();

        assert!(service.start());
        assert!(service.is_active());
        assert_eq!(service.remaining_time(), Duration::from_secs(600));

        clock.advance_secs(100);
        assert_eq!(service.remaining_time(), Duration::from_secs(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_without_time_left_clears_synchronously() {
        let (service, sessions, clock, display) = service();
        sessions.start(["a"], 10).unwrap();
        clock.advance_secs(10);

        assert!(!service.start());
        assert!(!service.is_active());
        assert!(!sessions.read().is_set());
        assert_eq!(display.dismissed.load(Ordering::SeqCst), 1);
        assert!(display.shown.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_ticking() {
        let (service, sessions, _, display) = service();
        sessions.start(["a"], 600).unwrap();
        service.start();

        // Let the first tick run.
        tokio::time::sleep(Duration::from_millis(10)).await;
        service.stop();
        service.stop();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(!service.is_active());
        assert!(!sessions.read().is_set());
        assert_eq!(display.shown.lock().unwrap().len(), 1);
        assert_eq!(display.dismissed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_adopt_only_when_session_running() {
        let (service, sessions, _, _) = service();
        assert!(!service.adopt());

        sessions.start(["a"], 120).unwrap();
        assert!(service.adopt());
        // Already ticking.
        assert!(!service.adopt());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_ends_after_external_stop() {
        let (service, sessions, _, _) = service();
        sessions.start(["a"], 120).unwrap();
        service.start();

        sessions.stop();
        tokio::time::sleep(Duration::from_secs(6)).await;

        assert!(!service.is_running());
    }
}
