use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Config file not found at {0}")]
    NotFound(PathBuf),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusConfig {
    /// Where the session record and statistics live.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    /// How often the agent samples the frontmost app.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Session length when none is given.
    #[serde(default = "default_minutes")]
    pub default_minutes: u32,
    /// Apps that are never blocked, whatever the selection says.
    #[serde(default = "default_protected_apps")]
    pub protected_apps: Vec<String>,
}

fn default_state_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("focus")
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_minutes() -> u32 {
    25
}

fn default_protected_apps() -> Vec<String> {
    [
        "com.apple.dock",
        "com.apple.finder",
        "com.apple.loginwindow",
        "com.apple.SecurityAgent",
        "com.apple.systempreferences",
        "com.android.dialer",
        "com.android.settings",
        "com.android.systemui",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl FocusConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::config_path())
    }

    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }
        let content = std::fs::read_to_string(&path)?;
        let config: FocusConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("focus")
            .join("config.toml")
    }

    pub fn is_protected(&self, identifier: &str) -> bool {
        self.protected_apps.iter().any(|a| a == identifier)
    }
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            poll_interval_ms: default_poll_interval_ms(),
            default_minutes: default_minutes(),
            protected_apps: default_protected_apps(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FocusConfig::default();
        assert!(config.is_protected("com.apple.finder"));
        assert!(!config.is_protected("com.twitter.twitter"));
        assert_eq!(config.poll_interval_ms, 100);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "state_dir = \"/var/lib/focus\"\nprotected_apps = [\"com.mitchellh.ghostty\"]\n",
        )
        .unwrap();

        let config = FocusConfig::load_from(path).unwrap();
        assert_eq!(config.state_dir, PathBuf::from("/var/lib/focus"));
        assert!(config.is_protected("com.mitchellh.ghostty"));
        assert!(!config.is_protected("com.apple.finder"));
        assert_eq!(config.default_minutes, 25);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            FocusConfig::load_from(dir.path().join("absent.toml")),
            Err(ConfigError::NotFound(_))
        ));
    }
}
