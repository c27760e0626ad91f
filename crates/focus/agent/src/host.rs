//! macOS implementations of the focus host capabilities.

use color_eyre::eyre::{WrapErr as _, bail};
use focus_core::host::{HomeAction, Permissions};
use std::process::Command;

use crate::accessibility;

/// Hides the frontmost app, leaving the desktop in view.
const HIDE_FRONTMOST: &str = r#"tell application "System Events" to set visible of first application process whose frontmost is true to false"#;

/// Desktop host backed by lsappinfo and System Events.
#[derive(Debug, Clone, Copy, Default)]
pub struct MacHost;

impl Permissions for MacHost {
    fn is_monitoring_permission_granted(&self) -> bool {
        matches!(accessibility::frontmost_app(), Ok(Some(_)))
    }

    fn are_notifications_enabled(&self) -> bool {
        // Progress goes to the log, which is always there.
        true
    }
}

impl HomeAction for MacHost {
    fn return_to_home(&self) -> color_eyre::eyre::Result<()> {
        let output = Command::new("osascript")
            .args(["-e", HIDE_FRONTMOST])
            .output()
            .wrap_err("failed to run osascript")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("osascript failed: {}", stderr.trim());
        }

        Ok(())
    }
}
