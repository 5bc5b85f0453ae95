use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DiscoveryConfig {
    /// Poll cycles without any discovery after a handler lost its handle.
    /// Lets the foreign side finish tearing down or building a scene first.
    #[serde(default = "default_cooldown_after_release")]
    pub cooldown_after_release: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            cooldown_after_release: default_cooldown_after_release(),
        }
    }
}

impl DiscoveryConfig {
    pub(super) fn validate(&self) -> Result<()> {
        // 100 cycles is ~10s at the default interval
        if self.cooldown_after_release > 100 {
            return Err(Error::Config(ConfigError::Message(format!(
                "discovery.cooldown_after_release {} exceeds 100 cycles",
                self.cooldown_after_release
            ))));
        }
        Ok(())
    }
}

fn default_cooldown_after_release() -> u32 {
    3
}
