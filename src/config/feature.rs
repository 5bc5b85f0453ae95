use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Per-feature tuning. The numbers were tuned against real teardown timings,
/// so each feature carries its own defaults.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FeaturesConfig {
    #[serde(default = "default_battle_result")]
    pub battle_result: FeatureConfig,

    #[serde(default = "default_battle_subtitle")]
    pub battle_subtitle: FeatureConfig,

    #[serde(default = "default_supporter")]
    pub attack_support: FeatureConfig,

    #[serde(default = "default_supporter")]
    pub defence_support: FeatureConfig,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            battle_result: default_battle_result(),
            battle_subtitle: default_battle_subtitle(),
            attack_support: default_supporter(),
            defence_support: default_supporter(),
        }
    }
}

impl FeaturesConfig {
    pub(super) fn validate(&self) -> Result<()> {
        self.battle_result.validate("battle_result")?;
        self.battle_subtitle.validate("battle_subtitle")?;
        self.attack_support.validate("attack_support")?;
        self.defence_support.validate("defence_support")?;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FeatureConfig {
    /// Faults tolerated before the handler disables itself for the session
    pub max_faults: u32,

    /// Probe the cached address on every poll (`false` = wrapper/address check only)
    #[serde(default = "default_probe_on_poll")]
    pub probe_on_poll: bool,

    pub staleness: StalenessConfig,
}

impl FeatureConfig {
    pub fn validate(
        &self,
        name: &str,
    ) -> Result<()> {
        if self.max_faults == 0 {
            return Err(Error::Config(ConfigError::Message(format!(
                "features.{}.max_faults must be > 0",
                name
            ))));
        }
        self.staleness.validate(name)
    }
}

/// Thresholds of the FRESH -> STALE -> DEEP_STALE -> PERMANENT_STOP machine,
/// counted in poll cycles.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StalenessConfig {
    /// Consecutive unchanged reads before entering STALE
    pub stale_limit: u32,

    /// In STALE, read foreign memory only every Nth cycle
    pub probe_interval: u32,

    /// Enter DEEP_STALE once the stale counter reaches this value
    #[serde(default)]
    pub deep_stale_limit: Option<u32>,

    /// In DEEP_STALE, read only every Nth cycle
    #[serde(default = "default_deep_probe_interval")]
    pub deep_probe_interval: u32,

    /// Stop touching foreign memory for the session once the stale counter
    /// reaches this value
    #[serde(default)]
    pub permanent_stop: Option<u32>,
}

impl StalenessConfig {
    pub fn validate(
        &self,
        name: &str,
    ) -> Result<()> {
        if self.probe_interval == 0 || self.deep_probe_interval == 0 {
            return Err(Error::Config(ConfigError::Message(format!(
                "features.{}.staleness probe intervals must be > 0",
                name
            ))));
        }

        if let Some(deep) = self.deep_stale_limit {
            if deep <= self.stale_limit {
                return Err(Error::Config(ConfigError::Message(format!(
                    "features.{}.staleness.deep_stale_limit {} must be greater than stale_limit {}",
                    name, deep, self.stale_limit
                ))));
            }
        }

        if let Some(stop) = self.permanent_stop {
            if stop <= self.stale_limit {
                return Err(Error::Config(ConfigError::Message(format!(
                    "features.{}.staleness.permanent_stop {} must be greater than stale_limit {}",
                    name, stop, self.stale_limit
                ))));
            }
            if matches!(self.deep_stale_limit, Some(deep) if stop <= deep) {
                return Err(Error::Config(ConfigError::Message(format!(
                    "features.{}.staleness.permanent_stop {} must be greater than deep_stale_limit",
                    name, stop
                ))));
            }
        }

        Ok(())
    }
}

fn default_probe_on_poll() -> bool {
    true
}
fn default_deep_probe_interval() -> u32 {
    10
}

// Result data is polled while the post-battle screen settles; the wait
// gives up after ~20s.
fn default_battle_result() -> FeatureConfig {
    FeatureConfig {
        max_faults: 5,
        probe_on_poll: true,
        staleness: StalenessConfig {
            stale_limit: 20,
            probe_interval: 2,
            deep_stale_limit: Some(100),
            deep_probe_interval: 5,
            permanent_stop: Some(200),
        },
    }
}

// Subtitles stop changing right before the battle scene is destroyed.
fn default_battle_subtitle() -> FeatureConfig {
    FeatureConfig {
        max_faults: 5,
        probe_on_poll: false,
        staleness: StalenessConfig {
            stale_limit: 2,
            probe_interval: 5,
            deep_stale_limit: None,
            deep_probe_interval: 5,
            permanent_stop: Some(100),
        },
    }
}

fn default_supporter() -> FeatureConfig {
    FeatureConfig {
        max_faults: 5,
        probe_on_poll: true,
        staleness: StalenessConfig {
            stale_limit: 50,
            probe_interval: 5,
            deep_stale_limit: None,
            deep_probe_interval: 10,
            permanent_stop: None,
        },
    }
}
