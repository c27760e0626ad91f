//! Recording doubles for the host capabilities.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::clock::ManualClock;
use crate::event::BlockedAttemptNotice;
use crate::host::{HomeAction, NoticeSink, Permissions, ProgressDisplay};
use crate::session::SessionManager;
use crate::store::MemoryStore;

pub fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

pub fn sessions() -> (Arc<SessionManager>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(epoch()));
    let sessions = SessionManager::new(Arc::new(MemoryStore::new()), clock.clone());
    (Arc::new(sessions), clock)
}

#[derive(Default)]
pub struct RecordingHome {
    pub calls: AtomicUsize,
}

impl HomeAction for RecordingHome {
    fn return_to_home(&self) -> color_eyre::eyre::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub notices: Mutex<Vec<BlockedAttemptNotice>>,
}

impl NoticeSink for RecordingSink {
    fn on_blocked_attempt(&self, notice: BlockedAttemptNotice) {
        self.notices.lock().unwrap().push(notice);
    }
}

#[derive(Default)]
pub struct RecordingDisplay {
    pub shown: Mutex<Vec<Duration>>,
    pub dismissed: AtomicUsize,
}

impl ProgressDisplay for RecordingDisplay {
    fn show(&self, remaining: Duration) {
        self.shown.lock().unwrap().push(remaining);
    }

    fn dismiss(&self) {
        self.dismissed.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct StubPermissions {
    pub monitoring: AtomicBool,
    pub notifications: AtomicBool,
}

impl StubPermissions {
    pub fn granted() -> Self {
        Self {
            monitoring: AtomicBool::new(true),
            notifications: AtomicBool::new(true),
        }
    }
}

impl Permissions for StubPermissions {
    fn is_monitoring_permission_granted(&self) -> bool {
        self.monitoring.load(Ordering::SeqCst)
    }

    fn are_notifications_enabled(&self) -> bool {
        self.notifications.load(Ordering::SeqCst)
    }
}
