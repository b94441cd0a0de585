//! Runtime configuration for easyenv sessions.
//!
//! Hosts usually embed `EnvConfig` in their own config file and hand the
//! deserialized value to `Registry::with_config`.

use crate::db::DEFAULT_BUSY_TIMEOUT;
use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// File name written under every project path.
pub const DEFAULT_SETTINGS_FILE_NAME: &str = ".env";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    /// Settings file name joined onto each project path.
    pub settings_file_name: String,
    /// SQLite busy timeout, shared by the primary and worker connections.
    pub busy_timeout_ms: u64,
    /// Level handed to `init_logging` by hosts that let core own logging.
    pub log_level: String,
}

impl EnvConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            settings_file_name: DEFAULT_SETTINGS_FILE_NAME.to_string(),
            busy_timeout_ms: u64::try_from(DEFAULT_BUSY_TIMEOUT.as_millis()).unwrap_or(5_000),
            log_level: default_log_level().to_string(),
        }
    }
}
