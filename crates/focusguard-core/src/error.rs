//! Core error types for focusguard-core.
//!
//! Most failures in the permission subsystem are absorbed where they occur
//! (a failed probe becomes a non-functional status, a failed preference read
//! becomes "not suppressed"). These types describe what went wrong before it
//! was absorbed, and are surfaced directly only by config and CLI paths.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusguard-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Capability probe errors
    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    /// Preference storage errors
    #[error("Preference error: {0}")]
    Preference(#[from] PreferenceError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

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

/// Errors raised by a [`PermissionProbe`](crate::permission::PermissionProbe).
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The backend could not be reached or rejected the call
    #[error("Backend unavailable: {0}")]
    Backend(String),

    /// The backend answered with something that is not a permission report
    #[error("Malformed permission report: {0}")]
    Malformed(String),

    /// No answer arrived in time
    #[error("Permission check timed out after {timeout_ms} ms")]
    TimedOut { timeout_ms: u64 },

    /// The probe task panicked or was cancelled
    #[error("Probe task failed: {0}")]
    Task(String),
}

/// Preference storage errors.
#[derive(Error, Debug)]
pub enum PreferenceError {
    /// Failed to read the preference file
    #[error("Failed to read preferences from {path}: {message}")]
    ReadFailed { path: PathBuf, message: String },

    /// Failed to write the preference file
    #[error("Failed to write preferences to {path}: {message}")]
    WriteFailed { path: PathBuf, message: String },

    /// Backing storage is not available at all
    #[error("Preference storage unavailable: {0}")]
    Unavailable(String),
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

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

impl From<tokio::task::JoinError> for ProbeError {
    fn from(err: tokio::task::JoinError) -> Self {
        ProbeError::Task(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
