//! Error types for the notifier
//!
//! This module defines the run-level error type. Per-attempt delivery
//! failures never surface here: they live in [`crate::outcome`] and are
//! consumed by the retry controller.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for notifier operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the notifier
#[derive(Error, Debug)]
pub enum Error {
    /// The config file exists but a value is unusable
    #[error("Invalid configuration ({key}): {reason}")]
    ConfigInvalid {
        /// Offending config key
        key: String,
        /// What is wrong with it
        reason: String,
    },

    /// The config file exists but could not be read
    #[error("Cannot read config file {}: {source}", path.display())]
    ConfigUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The template could not be written in place of a missing config file
    #[error("Cannot write config template {}: {source}", path.display())]
    TemplateWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Other file system errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid configuration error
    pub fn config_invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Whether the operator has to fix the config file before re-running
    pub fn is_config(&self) -> bool {
        matches!(self, Self::ConfigInvalid { .. } | Self::ConfigUnreadable { .. })
    }
}
