use crate::errors::{ConfigError, LoggingError};
use crate::logging::{self, LogFormat, LoggingConfig};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, env, fs, path::Path, str::FromStr};
use tracing::Level;

pub const ENV_MAX_DEPTH: &str = "WIREBOX_MAX_DEPTH";
pub const ENV_LOG_LEVEL: &str = "WIREBOX_LOG_LEVEL";

/// Container configuration.
///
/// ```toml
/// max_depth = 64
///
/// [logging]
/// level = "debug"
/// format = "compact"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Longest caller chain a resolution may build. `None` leaves it unbounded,
    /// in which case keeping dependency graphs shallow is up to the caller.
    pub max_depth: Option<usize>,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
    pub show_target: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            show_target: true,
        }
    }
}

impl LoggingSettings {
    /// Convert into a [`LoggingConfig`] ready for `init_logging`
    pub fn to_logging_config(&self) -> Result<LoggingConfig, ConfigError> {
        let level = Level::from_str(&self.level)
            .map_err(|_| ConfigError::InvalidLogLevel(self.level.clone()))?;

        Ok(LoggingConfig {
            level,
            format: self.format,
            show_target: self.show_target,
            ..LoggingConfig::default()
        })
    }
}

impl ContainerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::TomlParse("<inline>".to_string(), e))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::FileRead(display.clone(), e))?;
        toml::from_str(&content).map_err(|e| ConfigError::TomlParse(display, e))
    }

    /// Load from an optional file, then apply process environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env_overrides(&collect_env_vars())
    }

    /// Install the global tracing subscriber described by the `[logging]` section
    pub fn init_logging(&self) -> Result<(), LoggingError> {
        let config = self.logging.to_logging_config()?;
        logging::init_logging(config)
    }

    /// Apply `WIREBOX_*` overrides. An empty or `none` max depth clears the limit.
    pub fn with_env_overrides(mut self, env_map: &HashMap<String, String>) -> Result<Self, ConfigError> {
        if let Some(value) = env_map.get(ENV_MAX_DEPTH) {
            let trimmed = value.trim();
            self.max_depth = if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
                None
            } else {
                let depth = trimmed.parse::<usize>().map_err(|_| ConfigError::InvalidEnv {
                    var: ENV_MAX_DEPTH.to_string(),
                    value: value.clone(),
                })?;
                Some(depth)
            };
        }

        if let Some(level) = env_map.get(ENV_LOG_LEVEL) {
            if Level::from_str(level).is_err() {
                return Err(ConfigError::InvalidEnv {
                    var: ENV_LOG_LEVEL.to_string(),
                    value: level.clone(),
                });
            }
            self.logging.level = level.clone();
        }

        Ok(self)
    }
}

fn collect_env_vars() -> HashMap<String, String> {
    env::vars().filter(|(key, _)| key.starts_with("WIREBOX_")).collect()
}
