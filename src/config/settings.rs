//! Application settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Process-level settings, resolved before storage is opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    /// Directory holding property files, the telemetry snapshot, and (for a
    /// SQLite URL pointing into it) the database file.
    pub data_dir: PathBuf,

    /// Log level for the application.
    pub log_level: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("nocturne")
}

fn default_log_level() -> String {
    "info".to_owned()
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

impl BotSettings {
    /// Creates settings from environment variables with defaults.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self {
            data_dir: std::env::var("NOCTURNE_DATA_DIR")
                .map_or_else(|_| default_data_dir(), PathBuf::from),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| default_log_level()),
        }
    }
}
