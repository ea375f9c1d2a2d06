//! Configuration error types.

use thiserror::Error;

/// Errors that can occur while loading settings or credentials.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file.
    #[error("Failed to read file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML content.
    #[error("Failed to parse settings in '{path}': {source}")]
    TomlError {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// Validation error in settings.
    #[error("Validation error in '{path}': {message}")]
    ValidationError { path: String, message: String },

    /// Missing required file.
    #[error("Missing required file: {path}")]
    MissingFile { path: String },

    /// One or more required credentials or identifiers are unset.
    #[error("Missing required configuration: {}", .names.join(", "))]
    MissingCredential { names: Vec<&'static str> },
}
