use std::path::PathBuf;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for the `dr-wait.log` file; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            log_dir: None,
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<()> {
        self.level.parse::<tracing::Level>().map_err(|e| {
            Error::Config(ConfigError::Message(format!(
                "logging.level `{}` is invalid: {}",
                self.level, e
            )))
        })?;

        if let Some(dir) = &self.log_dir {
            if dir.as_os_str().is_empty() {
                return Err(Error::Config(ConfigError::Message(
                    "logging.log_dir cannot be empty".into(),
                )));
            }
        }
        Ok(())
    }
}

fn default_level() -> String {
    "info".to_string()
}
