//! MeteringClient trait - API client boundary
//!
//! The HTTP/session layer lives outside this workspace. The coordinator only
//! depends on this trait and on the typed failures in [`ApiError`].

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::{Measure, RawHistoricalConsumption, RawHistoricalGeneration, RawHistoricalPowerDemand};

/// Failures raised by the API client
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// Response body could not be decoded
    #[error("invalid encoding: {message}")]
    Decode { message: String },

    /// Upstream answered with a non-success status
    #[error("{reason} ({status})")]
    RequestFailed { status: u16, reason: String },

    /// Upstream rejected the command
    #[error("command error from API: {message}")]
    Command { message: String },

    /// Operation not supported
    #[error("{operation} is not implemented")]
    NotImplemented { operation: &'static str },

    /// Anything else
    #[error("unexpected error: {message}")]
    Unexpected { message: String },
}

impl ApiError {
    /// Create a request failure
    pub fn request_failed(status: u16, reason: impl Into<String>) -> Self {
        Self::RequestFailed {
            status,
            reason: reason.into(),
        }
    }

    /// Create a command error
    pub fn command(message: impl Into<String>) -> Self {
        Self::Command {
            message: message.into(),
        }
    }
}

/// Account metering API
///
/// Every call is one suspending upstream request.
#[trait_variant::make(MeteringClient: Send)]
pub trait LocalMeteringClient {
    /// `"{username}/{contract}"` style label, if the client knows it
    fn account(&self) -> Option<String>;

    /// Read the meter directly
    async fn get_measure(&self) -> Result<Measure, ApiError>;

    /// Consumption periods between `start` and `end` (local wall clock)
    async fn get_historical_consumption(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<RawHistoricalConsumption, ApiError>;

    /// Generation periods between `start` and `end` (local wall clock)
    async fn get_historical_generation(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<RawHistoricalGeneration, ApiError>;

    /// Maximum power demand records over the API's default range
    async fn get_historical_power_demand(&self) -> Result<RawHistoricalPowerDemand, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_failed_display() {
        let err = ApiError::request_failed(503, "Service Unavailable");
        assert_eq!(err.to_string(), "Service Unavailable (503)");
    }

    #[test]
    fn test_not_implemented_display() {
        let err = ApiError::NotImplemented {
            operation: "historical generation",
        };
        assert_eq!(err.to_string(), "historical generation is not implemented");
    }
}
