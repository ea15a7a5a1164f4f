//! Core error types for flowjournal-core.
//!
//! Expected engine conditions (a fade running out, ending a session twice)
//! are modelled as state, not errors. The types here cover configuration,
//! input validation and the external collaborators.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for flowjournal-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// External collaborator failures
    #[error("{0}")]
    Collaborator(#[from] CollaboratorError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// No usable config directory
    #[error("Could not determine configuration directory")]
    NoConfigDir,
}

/// Validation errors.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    /// Text missing or whitespace only
    #[error("Text is required")]
    EmptyText,

    /// Text over the collaborator's hard cap
    #[error("Text too long: {len} characters (max {max})")]
    TextTooLong { len: usize, max: usize },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Threshold table would let category and delta disagree
    #[error("Invalid threshold policy: {0}")]
    InvalidThresholds(String),
}

/// Failures talking to an external collaborator.
///
/// The display text is what the end user sees, so it never carries
/// upstream status codes, bodies or the session text.
#[derive(Error, Debug, PartialEq)]
pub enum CollaboratorError {
    #[error("Failed to generate summary")]
    SummaryUnavailable,

    #[error("Failed to {operation}")]
    BillingUnavailable { operation: &'static str },

    #[error("API key not configured for {service}")]
    NotConfigured { service: &'static str },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

impl From<toml::de::Error> for CoreError {
    fn from(err: toml::de::Error) -> Self {
        CoreError::Config(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
