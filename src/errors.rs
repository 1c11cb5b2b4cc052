use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file '{0}': {1}")]
    FileRead(String, #[source] std::io::Error),
    #[error("Failed to parse TOML from '{0}': {1}")]
    TomlParse(String, #[source] toml::de::Error),
    #[error("Invalid value '{value}' for environment variable {var}")]
    InvalidEnv { var: String, value: String },
    #[error("Unknown log level '{0}'")]
    InvalidLogLevel(String),
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to install tracing subscriber: {0}")]
    Init(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
