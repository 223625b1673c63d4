//! Uploader configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/moduploader/config.toml`
//! - Windows: `%APPDATA%/moduploader/config.toml`
//!
//! The same directory holds the logs, the instance lock and the default
//! preview image.

use std::path::{Path, PathBuf};
use std::time::Duration;

use moduploader_protocol::constants::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_PAYLOAD_EXTENSIONS, DEFAULT_POLL_INTERVAL,
};
use moduploader_protocol::{AppId, CSL_APP_ID};
use moduploader_workshop::{PollSettings, UploadSettings};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.toml";

/// Uploader configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Steam app the items are published for.
    #[serde(default = "default_app_id")]
    pub app_id: u32,

    /// Attempts per create or upload phase.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Interval between two pumps of the Steam callback queue.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Ceiling for a single Steam call. Unset waits indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_timeout_secs: Option<u64>,

    /// File extensions that identify the mod assembly in a content folder.
    #[serde(default = "default_payload_extensions")]
    pub payload_extensions: Vec<String>,

    /// Game version used for the compatibility tag instead of probing the
    /// installed game.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_version: Option<String>,

    /// Directory for daily log files (defaults to `<config dir>/logs`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

fn default_app_id() -> u32 {
    CSL_APP_ID.0
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

fn default_payload_extensions() -> Vec<String> {
    DEFAULT_PAYLOAD_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_id: default_app_id(),
            max_attempts: default_max_attempts(),
            poll_interval_ms: default_poll_interval_ms(),
            operation_timeout_secs: None,
            payload_extensions: default_payload_extensions(),
            game_version: None,
            log_dir: None,
        }
    }
}

impl Config {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&data_dir().join(CONFIG_FILE))
    }

    /// Loads configuration from `path`, creating it with defaults if missing.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn app_id(&self) -> AppId {
        AppId(self.app_id)
    }

    /// Directory daily logs are written to.
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| data_dir().join("logs"))
    }

    /// Settings for the upload orchestrator.
    pub fn upload_settings(&self) -> UploadSettings {
        UploadSettings {
            app_id: self.app_id(),
            max_attempts: self.max_attempts.max(1),
            poll: self.poll_settings(),
            payload_extensions: self.payload_extensions.clone(),
            preview_dir: data_dir().join("preview"),
        }
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            timeout: self.operation_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Returns the platform-specific data directory.
pub fn data_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home).join(".config").join("moduploader")
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("moduploader")
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        PathBuf::from("/tmp/moduploader")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.app_id, 255_710);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.poll_interval_ms, 50);
        assert_eq!(config.operation_timeout_secs, None);
        assert_eq!(config.payload_extensions, vec!["dll".to_string()]);
        assert_eq!(config.game_version, None);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = Config {
            app_id: 440,
            max_attempts: 5,
            poll_interval_ms: 100,
            operation_timeout_secs: Some(600),
            payload_extensions: vec!["dll".into(), "crp".into()],
            game_version: Some("1.17.1-f2".into()),
            log_dir: Some(PathBuf::from("/var/log/moduploader")),
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn config_partial_toml() {
        // Only the version override, rest should use defaults.
        let config: Config = toml::from_str(r#"game_version = "1.16.0-f3""#).unwrap();
        assert_eq!(config.game_version.as_deref(), Some("1.16.0-f3"));
        assert_eq!(config.app_id, 255_710);
        assert_eq!(config.max_attempts, 3);
    }

    #[test]
    fn data_dir_not_empty() {
        assert!(data_dir().to_string_lossy().contains("moduploader"));
    }

    #[test]
    fn load_creates_default_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn settings_from_config() {
        let config = Config {
            max_attempts: 0,
            poll_interval_ms: 20,
            operation_timeout_secs: Some(30),
            ..Config::default()
        };
        let settings = config.upload_settings();
        assert_eq!(settings.max_attempts, 1);
        assert_eq!(settings.poll.interval, Duration::from_millis(20));
        assert_eq!(settings.poll.timeout, Some(Duration::from_secs(30)));
        assert_eq!(settings.app_id, CSL_APP_ID);
    }

    #[test]
    fn explicit_log_dir_wins() {
        let config = Config {
            log_dir: Some(PathBuf::from("/tmp/mu-logs")),
            ..Config::default()
        };
        assert_eq!(config.log_dir(), PathBuf::from("/tmp/mu-logs"));
        assert!(Config::default().log_dir().ends_with("logs"));
    }
}
