//! Foreground polling loop and component wiring.

use color_eyre::eyre::WrapErr as _;
use focus_core::host::{ChannelSink, LogDisplay};
use focus_core::{
    BlockMonitor, FocusConfig, FocusController, FocusService, ForegroundEvent, PlistFileStore,
    SessionManager, StatsRecorder, SystemClock, Verdict,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, info};

use crate::accessibility;
use crate::host::MacHost;

/// Turns frontmost-app samples into foreground events.
///
/// An event is produced when the frontmost app changes, and again on every
/// sample while a blocked app stays in front.
#[derive(Debug, Default)]
pub struct ForegroundWatcher {
    last: Option<String>,
    last_blocked: bool,
}

impl ForegroundWatcher {
    pub fn observe(&mut self, bundle_id: &str) -> Option<ForegroundEvent> {
        if self.last.as_deref() == Some(bundle_id) && !self.last_blocked {
            return None;
        }
        self.last = Some(bundle_id.to_string());
        Some(ForegroundEvent::new(bundle_id))
    }

    pub fn record(&mut self, verdict: Verdict) {
        self.last_blocked = verdict == Verdict::Blocked;
    }

    /// Forget the last sample so the app in front is checked again.
    pub fn reset(&mut self) {
        self.last = None;
        self.last_blocked = false;
    }
}

/// The agent's components, backed by the state directory from the config.
pub struct Agent {
    pub sessions: Arc<SessionManager>,
    pub service: Arc<FocusService>,
    pub stats: Arc<StatsRecorder>,
    store: Arc<PlistFileStore>,
    config: FocusConfig,
}

impl Agent {
    pub fn new(config: FocusConfig) -> Self {
        let store = Arc::new(PlistFileStore::new(&config.state_dir));
        let sessions = Arc::new(SessionManager::new(store.clone(), Arc::new(SystemClock)));
        let service = Arc::new(FocusService::new(sessions.clone(), Arc::new(LogDisplay)));
        let stats = Arc::new(StatsRecorder::open(&config.state_dir));

        Self {
            sessions,
            service,
            stats,
            store,
            config,
        }
    }

    pub fn config(&self) -> &FocusConfig {
        &self.config
    }

    pub fn controller(&self) -> FocusController {
        FocusController::new(
            self.sessions.clone(),
            self.service.clone(),
            self.store.clone(),
            Arc::new(MacHost),
        )
        .with_protected(self.config.protected_apps.iter().cloned())
    }

    /// Watch the foreground until SIGTERM or SIGINT.
    pub async fn run(&self) -> color_eyre::eyre::Result<()> {
        let (sink, notices) = ChannelSink::new();
        let monitor = BlockMonitor::new(self.sessions.clone(), Arc::new(MacHost), Arc::new(sink));

        let stats = self.stats.clone();
        let stats_task = tokio::spawn(async move { stats.drain(notices).await });

        let mut sigterm =
            signal(SignalKind::terminate()).wrap_err("failed to install SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).wrap_err("failed to install SIGINT handler")?;

        self.service.adopt();

        let mut watcher = ForegroundWatcher::default();
        let mut poll = tokio::time::interval(Duration::from_millis(self.config.poll_interval_ms));

        info!(state_dir = %self.config.state_dir.display(), "focus agent running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT");
                    break;
                }
                _ = poll.tick() => {
                    // Sessions may be started by another process. An app
                    // already in front when one starts must be checked too.
                    if self.service.adopt() {
                        watcher.reset();
                    }
                    self.poll_once(&monitor, &mut watcher);
                }
            }
        }

        // Dropping the monitor closes the notice channel.
        drop(monitor);
        stats_task.await.wrap_err("statistics task panicked")?;

        info!("focus agent shutting down");
        Ok(())
    }

    fn poll_once(&self, monitor: &BlockMonitor, watcher: &mut ForegroundWatcher) {
        let frontmost = match accessibility::frontmost_app() {
            Ok(Some(app)) => app,
            Ok(None) => return,
            Err(e) => {
                debug!(error = %e, "could not get frontmost app");
                return;
            }
        };

        if let Some(event) = watcher.observe(&frontmost.bundle_id) {
            let verdict = monitor.on_foreground_change(&event);
            watcher.record(verdict);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watcher_emits_on_change_only() {
        let mut watcher = ForegroundWatcher::default();

        assert!(watcher.observe("com.apple.Terminal").is_some());
        watcher.record(Verdict::Allowed);
        assert!(watcher.observe("com.apple.Terminal").is_none());

        assert_eq!(
            watcher.observe("com.apple.Safari"),
            Some(ForegroundEvent::new("com.apple.Safari"))
        );
    }

    #[test]
    fn test_watcher_repeats_while_blocked_app_in_front() {
        let mut watcher = ForegroundWatcher::default();

        assert!(watcher.observe("com.hnc.Discord").is_some());
        watcher.record(Verdict::Blocked);
        assert!(watcher.observe("com.hnc.Discord").is_some());
        watcher.record(Verdict::Idle);
        assert!(watcher.observe("com.hnc.Discord").is_none());
    }

    #[test]
    fn test_watcher_rechecks_front_app_after_reset() {
        let mut watcher = ForegroundWatcher::default();

        assert!(watcher.observe("com.hnc.Discord").is_some());
        watcher.record(Verdict::Idle);
        assert!(watcher.observe("com.hnc.Discord").is_none());

        // A session starts while Discord stays in front.
        watcher.reset();
        assert_eq!(
            watcher.observe("com.hnc.Discord"),
            Some(ForegroundEvent::new("com.hnc.Discord"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_front_app_blocked_when_session_adopted() {
        let dir = tempfile::tempdir().unwrap();
        let config = FocusConfig {
            state_dir: dir.path().to_path_buf(),
            ..FocusConfig::default()
        };
        let daemon = Agent::new(config.clone());
        let (sink, _notices) = ChannelSink::new();
        let home = Arc::new(CountingHome::default());
        let monitor = BlockMonitor::new(daemon.sessions.clone(), home.clone(), Arc::new(sink));
        let mut watcher = ForegroundWatcher::default();

        let event = watcher.observe("com.hnc.Discord").unwrap();
        watcher.record(monitor.on_foreground_change(&event));
        assert!(watcher.observe("com.hnc.Discord").is_none());

        // Started from the CLI, which is a separate process.
        Agent::new(config)
            .sessions
            .start(["com.hnc.Discord"], 600)
            .unwrap();

        assert!(daemon.service.adopt());
        watcher.reset();
        let event = watcher.observe("com.hnc.Discord").unwrap();
        assert_eq!(monitor.on_foreground_change(&event), Verdict::Blocked);
        assert_eq!(home.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[derive(Default)]
    struct CountingHome {
        calls: std::sync::atomic::AtomicUsize,
    }

    impl focus_core::host::HomeAction for CountingHome {
        fn return_to_home(&self) -> color_eyre::eyre::Result<()> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_agent_controller_uses_state_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = FocusConfig {
            state_dir: dir.path().to_path_buf(),
            ..FocusConfig::default()
        };
        let agent = Agent::new(config);

        agent
            .controller()
            .save_selected_apps(["com.hnc.Discord"])
            .unwrap();

        let reopened = Agent::new(agent.config().clone());
        assert_eq!(reopened.controller().selected_apps().unwrap().len(), 1);
    }
}
