//! Events flowing in from the host and notices flowing back out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An application just became the visible one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForegroundEvent {
    pub identifier: String,
}

impl ForegroundEvent {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }
}

/// A blocked application was intercepted on its way to the foreground.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedAttemptNotice {
    pub identifier: String,
    /// When the attempt was intercepted.
    pub at: DateTime<Utc>,
}
