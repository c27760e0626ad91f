//! Frontmost-app queries via lsappinfo.

use color_eyre::eyre::WrapErr as _;
use std::process::Command;

/// The app currently in front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontApp {
    pub bundle_id: String,
    pub name: String,
}

/// Get the frontmost application, if lsappinfo reports one.
pub fn frontmost_app() -> color_eyre::eyre::Result<Option<FrontApp>> {
    let output = Command::new("lsappinfo")
        .args([
            "info", "-only", "bundleid", "-only", "name", "-app", "front",
        ])
        .output()
        .wrap_err("failed to run lsappinfo")?;

    if !output.status.success() {
        return Ok(None);
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_lsappinfo_output(&stdout))
}

fn parse_lsappinfo_output(output: &str) -> Option<FrontApp> {
    let mut bundle_id = None;
    let mut name = None;

    for line in output.lines() {
        let line = line.trim();

        if let Some(value) = line
            .strip_prefix("\"bundleid\"=")
            .or_else(|| line.strip_prefix("\"CFBundleIdentifier\"="))
        {
            bundle_id = Some(value.trim_matches('"').to_string());
        } else if let Some(value) = line
            .strip_prefix("\"name\"=")
            .or_else(|| line.strip_prefix("\"LSDisplayName\"="))
        {
            name = Some(value.trim_matches('"').to_string());
        }
    }

    let bundle_id = bundle_id.filter(|b| !b.is_empty())?;
    let name = name.unwrap_or_else(|| bundle_id.clone());
    Some(FrontApp { bundle_id, name })
}
