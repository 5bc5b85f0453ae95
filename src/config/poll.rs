use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Driver cadence.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PollConfig {
    /// Time between two poll cycles (milliseconds)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// The interval is slept in chunks of this size so the foreign runtime can
    /// reach a safe point in between
    #[serde(default = "default_sleep_chunk_ms")]
    pub sleep_chunk_ms: u64,

    /// Heartbeat log every N poll cycles (0 disables it)
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            sleep_chunk_ms: default_sleep_chunk_ms(),
            heartbeat_interval: default_heartbeat_interval(),
        }
    }
}

impl PollConfig {
    pub(super) fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(Error::Config(ConfigError::Message("poll.interval_ms cannot be 0".into())));
        }

        if self.sleep_chunk_ms == 0 || self.sleep_chunk_ms > self.interval_ms {
            return Err(Error::Config(ConfigError::Message(format!(
                "poll.sleep_chunk_ms {}ms must be within 1..={}ms",
                self.sleep_chunk_ms, self.interval_ms
            ))));
        }

        Ok(())
    }
}

fn default_interval_ms() -> u64 {
    100
}
fn default_sleep_chunk_ms() -> u64 {
    20
}
// ~30 seconds at the default interval
fn default_heartbeat_interval() -> u64 {
    300
}
