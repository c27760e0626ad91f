//! Entry points for starting and stopping focus sessions.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::FocusError;
use crate::host::Permissions;
use crate::service::FocusService;
use crate::session::{Session, SessionManager};
use crate::store::SelectionStore;

/// Session control surface for a UI or CLI.
pub struct FocusController {
    sessions: Arc<SessionManager>,
    service: Arc<FocusService>,
    selection: Arc<dyn SelectionStore>,
    permissions: Arc<dyn Permissions>,
    protected: BTreeSet<String>,
}

impl FocusController {
    pub fn new(
        sessions: Arc<SessionManager>,
        service: Arc<FocusService>,
        selection: Arc<dyn SelectionStore>,
        permissions: Arc<dyn Permissions>,
    ) -> Self {
        Self {
            sessions,
            service,
            selection,
            permissions,
            protected: BTreeSet::new(),
        }
    }

    /// Identifiers that are never blocked.
    pub fn with_protected<I, S>(mut self, apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protected = apps.into_iter().map(Into::into).collect();
        self
    }

    /// Block `apps` for `duration_secs`, replacing any running session.
    pub fn start_blocking<I, S>(&self, duration_secs: i64, apps: I) -> Result<Session, FocusError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.permissions.is_monitoring_permission_granted() {
            return Err(FocusError::PermissionDenied(
                "foreground monitoring is not enabled".into(),
            ));
        }

        if !self.permissions.are_notifications_enabled() {
            warn!("notifications disabled, progress will not be visible");
        }

        let mut blocked = BTreeSet::new();
        for app in apps {
            let app = app.into();
            if self.protected.contains(&app) {
                warn!(app = %app, "refusing to block protected app");
            } else {
                blocked.insert(app);
            }
        }

        if blocked.is_empty() {
            warn!("starting focus session with nothing to block");
        }

        let session = self.sessions.start(blocked, duration_secs)?;
        self.service.start();
        Ok(session)
    }

    /// Block the saved selection for `duration_secs`.
    pub fn start_with_selection(&self, duration_secs: i64) -> Result<Session, FocusError> {
        let selection = self.selected_apps()?;
        if selection.is_empty() {
            return Err(FocusError::InvalidArgument(
                "no apps selected for blocking".into(),
            ));
        }
        self.start_blocking(duration_secs, selection)
    }

    /// Stop blocking immediately. Never fails.
    pub fn stop_blocking(&self) {
        self.service.stop();
        info!("focus session stopped by user");
    }

    /// Whether a session is currently running.
    pub fn blocking_status(&self) -> bool {
        self.sessions.status()
    }

    pub fn remaining_time(&self) -> Duration {
        self.service.remaining_time()
    }

    /// The running session, if any.
    pub fn session(&self) -> Option<Session> {
        Some(self.sessions.read()).filter(|s| s.is_active_at(self.sessions.now()))
    }

    pub fn save_selected_apps<I, S>(&self, apps: I) -> Result<(), FocusError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let apps: BTreeSet<String> = apps.into_iter().map(Into::into).collect();
        self.selection
            .save_selection(&apps)
            .map_err(|e| FocusError::storage(&e))?;
        info!(apps = apps.len(), "saved app selection");
        Ok(())
    }

    pub fn selected_apps(&self) -> Result<BTreeSet<String>, FocusError> {
        self.selection
            .load_selection()
            .map_err(|e| FocusError::storage(&e))
    }
}
