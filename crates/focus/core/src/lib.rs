//! Focus Core
//!
//! Host-agnostic focus sessions: a persisted block set with an expiry, a
//! monitor that reacts to foreground changes, and a ticker that winds the
//! session down when time is up.

pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod host;
pub mod monitor;
pub mod service;
pub mod session;
pub mod stats;
pub mod store;
pub mod ticker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::FocusConfig;
pub use controller::FocusController;
pub use error::FocusError;
pub use event::{BlockedAttemptNotice, ForegroundEvent};
pub use monitor::{BlockMonitor, Verdict};
pub use service::FocusService;
pub use session::{Session, SessionManager};
pub use stats::{BlockingStats, StatsRecorder};
pub use store::{MemoryStore, PlistFileStore, SelectionStore, SessionStore};
pub use ticker::{TickOutcome, Ticker};

#[cfg(test)]
pub(crate) mod test_support;
