use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use speedwatch_client::ClientSettings;
use speedwatch_logging::{parse_level, LevelFilter, LogDestination};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILENAME: &str = "speedwatch.ron";

/// Settings read from the ron config file. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub connect_timeout_secs: u64,
    /// Absent means no overall limit on a request.
    pub request_timeout_secs: Option<u64>,
    pub results_path: String,
    pub log_level: String,
    /// When set, logs go to this file as well as the terminal.
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let settings = ClientSettings::default();
        Self {
            base_url: settings.base_url,
            connect_timeout_secs: settings.connect_timeout.as_secs(),
            request_timeout_secs: settings.request_timeout.map(|timeout| timeout.as_secs()),
            results_path: settings.results_path,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl AppConfig {
    /// Reads `path`. A missing file yields the defaults; an unreadable or
    /// malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("read config {}", path.display()));
            }
        };
        ron::from_str(&content).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
            results_path: self.results_path.clone(),
        }
    }

    /// Unknown level names fall back to `info`. Never below `error`, since
    /// command failures are reported through the logger.
    pub fn level_filter(&self) -> LevelFilter {
        parse_level(&self.log_level)
            .unwrap_or(LevelFilter::Info)
            .max(LevelFilter::Error)
    }

    pub fn log_destination(&self) -> LogDestination {
        if self.log_file.is_some() {
            LogDestination::Both
        } else {
            LogDestination::Terminal
        }
    }
}
