//! Core error types for focuscoach-core.
//!
//! This module defines the error hierarchy using thiserror so that every
//! layer (config, context validation, interaction logs) reports failures
//! with enough detail for the CLI to print a useful message.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focuscoach-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Interaction log errors
    #[error("Interaction log error: {0}")]
    Log(#[from] LogError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
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

    /// Key does not exist in the configuration tree
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    /// Numeric signal outside its declared range
    #[error("Value {value} for '{field}' is outside [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Empty collection
    #[error("Empty collection: {0}")]
    EmptyCollection(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Persona label not recognised
    #[error("Unknown persona: '{0}' (expected manager, analyst, developer, designer or customer_support)")]
    UnknownPersona(String),

    /// Personality code not recognised
    #[error("Unknown personality type: '{0}' (expected a four-letter code such as INTJ)")]
    UnknownPersonality(String),
}

/// Interaction log errors.
#[derive(Error, Debug)]
pub enum LogError {
    /// Log file does not exist
    #[error("No interactions found at {}", .0.display())]
    NotFound(PathBuf),

    /// A line could not be parsed as an interaction record
    #[error("Malformed record on line {line}: {message}")]
    Malformed { line: usize, message: String },

    /// A line parsed but carries out-of-range data
    #[error("Invalid record on line {line}: {message}")]
    InvalidRecord { line: usize, message: String },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CoreError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CoreError::Custom(err.to_string())
    }
}

impl ValidationError {
    /// Build an `OutOfRange` error for a unit-interval field.
    pub fn unit_interval(field: &str, value: f64) -> Self {
        ValidationError::OutOfRange {
            field: field.to_string(),
            value,
            min: 0.0,
            max: 1.0,
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
