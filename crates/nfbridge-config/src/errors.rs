use std::io;
use thiserror::Error;

/// Errors that can occur while reading or writing the config file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Unknown config key: {0}. Supported keys: library-dirs, log-dir")]
    UnknownKey(String),

    #[error("Invalid directory list: {0}")]
    InvalidPathList(String),
}
