//! The focus session record and its lifecycle.

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::FocusError;
use crate::store::SessionStore;

/// The active blocking window.
///
/// `expires_at == None` means no session; the block set is empty whenever
/// that is the case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub blocked: BTreeSet<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Whether a session has been started and not yet cleared.
    pub fn is_set(&self) -> bool {
        self.expires_at.is_some()
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(end) if end > now)
    }

    /// Time left until expiry, zero once expired or unset.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at
            .and_then(|end| (end - now).to_std().ok())
            .unwrap_or(Duration::ZERO)
    }

    pub fn blocks(&self, identifier: &str) -> bool {
        self.blocked.contains(identifier)
    }
}

/// Single owner of the session record.
///
/// All mutation is whole-record replace or clear, so concurrent clears from
/// the monitor and the ticker are harmless.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Start (or replace) the session with `identifiers` for `duration_secs`.
    pub fn start<I, S>(&self, identifiers: I, duration_secs: i64) -> Result<Session, FocusError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if duration_secs <= 0 {
            return Err(FocusError::InvalidArgument(format!(
                "duration must be positive, got {duration_secs}s"
            )));
        }

        let expires_at = TimeDelta::try_seconds(duration_secs)
            .and_then(|delta| self.now().checked_add_signed(delta))
            .ok_or_else(|| {
                FocusError::InvalidArgument(format!("duration {duration_secs}s is out of range"))
            })?;

        let session = Session {
            blocked: identifiers.into_iter().map(Into::into).collect(),
            expires_at: Some(expires_at),
        };

        self.store
            .replace(&session)
            .map_err(|e| FocusError::storage(&e))?;

        info!(
            apps = session.blocked.len(),
            expires_at = %expires_at,
            "focus session started"
        );
        Ok(session)
    }

    /// Clear the session. Never fails.
    pub fn stop(&self) {
        match self.store.clear() {
            Ok(()) => debug!("focus session cleared"),
            Err(e) => warn!(error = %e, "failed to clear focus session"),
        }
    }

    /// Current record; the unset record if absent or unreadable.
    pub fn read(&self) -> Session {
        match self.store.load() {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "failed to read focus session, treating as inactive");
                Session::default()
            }
        }
    }

    /// The session if it is active at `now`.
    ///
    /// Observing an expired record clears it.
    pub fn active_session(&self, now: DateTime<Utc>) -> Option<Session> {
        let session = self.read();
        if session.is_active_at(now) {
            return Some(session);
        }
        if session.is_set() {
            info!("focus session expired");
            self.stop();
        }
        None
    }

    /// Whether a session is active at `now`, clearing it if expired.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.active_session(now).is_some()
    }

    pub fn is_active(&self) -> bool {
        self.is_active_at(self.now())
    }

    /// Whether a session is running right now, without clearing anything.
    pub fn status(&self) -> bool {
        self.read().is_active_at(self.now())
    }

    pub fn remaining(&self) -> Duration {
        self.read().remaining_at(self.now())
    }
}
