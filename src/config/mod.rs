//! Configuration management for the polling engine.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support
//! - Environment variable overrides
//! - Component-wise validation
mod announcer;
mod discovery;
mod feature;
mod localization;
mod poll;
pub use announcer::*;
pub use discovery::*;
pub use feature::*;
pub use localization::*;
pub use poll::*;


use std::env;
use std::fmt::Debug;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

/// Environment variable prefix, e.g. `TICKWATCH__POLL__INTERVAL_MS=50`.
pub const ENV_PREFIX: &str = "TICKWATCH";

/// Main configuration container for the polling engine
///
/// Combines all subsystem configurations with hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables (highest priority)
#[derive(Serialize, Deserialize, Clone, Default)]
pub struct WatchConfig {
    /// Driver cadence
    #[serde(default)]
    pub poll: PollConfig,
    /// Deduplication and rate limits of the output channel
    #[serde(default)]
    pub announcer: AnnouncerConfig,
    /// Round-robin discovery budget
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    /// Announcement language
    #[serde(default)]
    pub localization: LocalizationConfig,
    /// Per-feature staleness and fault ceilings
    #[serde(default)]
    pub features: FeaturesConfig,
}

impl Debug for WatchConfig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("WatchConfig")
            .field("poll", &self.poll)
            .field("announcer", &self.announcer)
            .finish()
    }
}

impl WatchConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Configuration sources are merged in the following order (later sources override earlier):
    /// 1. Type defaults (lowest priority)
    /// 2. Configuration file from `CONFIG_PATH` environment variable (if set)
    /// 3. Environment variables with `TICKWATCH__` prefix (highest priority)
    ///
    /// # Note
    /// Validation is deferred so further overrides can be layered with
    /// `with_override_config()`. Callers must call `validate()` before use.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("TICKWATCH__ANNOUNCER__DEDUP_WINDOW_MS", "500");
    /// let cfg = WatchConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(environment());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional configuration overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables (highest priority)
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(environment())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates configuration and returns validated instance.
    pub fn validate(self) -> Result<Self> {
        self.poll.validate()?;
        self.announcer.validate()?;
        self.discovery.validate()?;
        self.features.validate()?;
        Ok(self)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}
