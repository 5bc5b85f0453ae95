use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Deduplication window and rate limits of the announcement channel.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnnouncerConfig {
    /// Identical text within this window is dropped (milliseconds)
    #[serde(default = "default_dedup_window_ms")]
    pub dedup_window_ms: u64,

    /// Minimum spacing between two accepted calls, regardless of text
    #[serde(default = "default_min_call_interval_ms")]
    pub min_call_interval_ms: u64,

    /// Cap of accepted calls inside one sliding second
    #[serde(default = "default_max_calls_per_second")]
    pub max_calls_per_second: u32,
}

impl Default for AnnouncerConfig {
    fn default() -> Self {
        Self {
            dedup_window_ms: default_dedup_window_ms(),
            min_call_interval_ms: default_min_call_interval_ms(),
            max_calls_per_second: default_max_calls_per_second(),
        }
    }
}

impl AnnouncerConfig {
    pub(super) fn validate(&self) -> Result<()> {
        if self.max_calls_per_second == 0 {
            return Err(Error::Config(ConfigError::Message(
                "announcer.max_calls_per_second must be > 0".into(),
            )));
        }

        if self.min_call_interval_ms >= 1000 {
            return Err(Error::Config(ConfigError::Message(format!(
                "announcer.min_call_interval_ms {}ms must be less than one second",
                self.min_call_interval_ms
            ))));
        }

        Ok(())
    }

    pub fn dedup_window(&self) -> Duration {
        Duration::from_millis(self.dedup_window_ms)
    }

    pub fn min_call_interval(&self) -> Duration {
        Duration::from_millis(self.min_call_interval_ms)
    }
}

fn default_dedup_window_ms() -> u64 {
    300
}
fn default_min_call_interval_ms() -> u64 {
    50
}
fn default_max_calls_per_second() -> u32 {
    10
}
