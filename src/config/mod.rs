//! Configuration for polling sessions.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support
//! - Environment variable overrides
//! - Component-wise validation
mod logging;
mod poll;
mod retry;
pub use logging::*;
pub use poll::*;
pub use retry::*;
use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::CONFIG_PATH_ENV;
use crate::constants::ENV_PREFIX;
use crate::constants::ENV_SEPARATOR;
use crate::Result;

/// Main configuration container
///
/// Combines all sections with hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables prefixed with `DRWAIT__` (highest priority)
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct SamplerConfig {
    /// Named timeout/sleep pairs for the waits of a DR workflow
    #[serde(default)]
    pub polling: WaitPolicies,
    /// Retry policy for probes that fail transiently
    #[serde(default)]
    pub retry: BackoffPolicy,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SamplerConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Sources are merged in order, later ones overriding earlier ones:
    /// 1. Type defaults
    /// 2. File named by the `CONFIG_PATH` environment variable (if set)
    /// 3. `DRWAIT__` environment variables
    ///
    /// Callers MUST call `validate()` before using the result.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("DRWAIT__POLLING__DRPC_PHASE__TIMEOUT_IN_MS", "60000");
    /// let cfg = SamplerConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(environment());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional overrides from file without validation.
    ///
    /// Merging order:
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

    /// Validates every section and returns the validated instance.
    pub fn validate(self) -> Result<Self> {
        self.polling.validate()?;
        self.retry.validate()?;
        self.logging.validate()?;
        Ok(self)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator(ENV_SEPARATOR)
        .ignore_empty(true)
        .try_parsing(true)
}
