//! Layered error definitions
//!
//! Categorized by source: config / timestamp preconditions / io

use chrono::{FixedOffset, NaiveDateTime};
use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// Unknown IANA zone name
    #[error("unknown timezone '{name}'")]
    UnknownTimezone { name: String },

    // ===== Timestamp Preconditions =====
    /// Tick time carries no timezone
    #[error("now is missing tzinfo field ({naive})")]
    MissingTimezone { naive: NaiveDateTime },

    /// Tick time is aware but not UTC
    #[error("now must be UTC, got offset {offset}")]
    NonUtcTimestamp { offset: FixedOffset },

    /// Tick time could not be parsed
    #[error("invalid timestamp '{input}': {message}")]
    InvalidTimestamp { input: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// True for tick-time precondition violations
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::MissingTimezone { .. } | Self::NonUtcTimestamp { .. }
        )
    }
}
