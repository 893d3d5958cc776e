use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::downloader::DEFAULT_CONCURRENCY;

const APP_DIR_NAME: &str = "packfetch";
const CONFIG_FILE: &str = "config.json";
const API_KEY_ENV: &str = "CURSEFORGE_API_KEY";

/// Runtime settings, read once at startup.
///
/// Sources, in order: built-in defaults, then the optional JSON config file
/// under the user config directory, then environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// API key sent as `x-api-key` on CurseForge metadata calls.
    pub curseforge_api_key: Option<String>,
    /// Maximum API requests per rolling window.
    pub api_quota: usize,
    /// Rolling window length in seconds.
    pub api_window_secs: u64,
    /// Whether raw file-content downloads also pass through the limiter.
    pub limit_downloads: bool,
    /// Default number of concurrent download workers.
    pub concurrency: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            curseforge_api_key: None,
            api_quota: 100,
            api_window_secs: 10,
            limit_downloads: false,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl Settings {
    pub fn load() -> Self {
        let mut settings = load_from_disk().unwrap_or_default();

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                settings.curseforge_api_key = Some(key);
            }
        }

        settings
    }

    pub fn api_window(&self) -> Duration {
        Duration::from_secs(self.api_window_secs)
    }
}

fn config_path() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join(APP_DIR_NAME).join(CONFIG_FILE))
}

fn load_from_disk() -> Option<Settings> {
    let path = config_path()?;
    let raw = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(settings) => {
            debug!("loaded settings from {:?}", path);
            Some(settings)
        }
        Err(err) => {
            debug!("ignoring unreadable settings at {:?}: {}", path, err);
            None
        }
    }
}
