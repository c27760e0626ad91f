//! Focus Agent
//!
//! Desktop host for focus sessions on macOS.

pub mod accessibility;
pub mod daemon;
pub mod host;
