//! Error types for proxy checks.
//!
//! The taxonomy is deliberately flat: every endpoint failure is an
//! [`ProbeError::UnexpectedStatus`] carrying the observed status code, and the
//! calling scenario decides what that status means in context (a rate-limit
//! race expects one, the legacy-key check tolerates one per configured key).
//!
//! # Example
//!
//! ```rust
//! use proxy_probe::{ProbeError, ProbeResult};
//!
//! fn require_ok(status: u16, body: &str) -> ProbeResult<()> {
//!     if status != 200 {
//!         return Err(ProbeError::unexpected_status(status, body));
//!     }
//!     Ok(())
//! }
//!
//! assert_eq!(require_ok(429, "slow down").unwrap_err().status(), Some(429));
//! ```

use crate::logging::{log_error, log_warn};
use thiserror::Error;

/// Convenient result type for proxy checks.
pub type ProbeResult<T> = std::result::Result<T, ProbeError>;

/// Errors raised while exercising a proxy.
///
/// | Variant | Raised when |
/// |---------|-------------|
/// | `UnexpectedStatus` | The proxy answered with anything but 200 |
/// | `HeaderLimitExceeded` | Response headers reached the byte ceiling |
/// | `RequestFailed` | The request never produced a response |
/// | `ResponseParsingError` | A 200 body was not the expected JSON |
/// | `ConfigurationError` | The harness was configured with unusable values |
/// | `ExpectationFailed` | A scenario's expected outcome did not happen |
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The endpoint returned a status other than 200.
    #[error("Request did not return a 200 status code: {status}")]
    UnexpectedStatus {
        /// Observed HTTP status.
        status: u16,
        /// Response body, kept for diagnostics.
        body: String,
    },

    /// Combined response header bytes reached the configured ceiling.
    #[error("Response headers exceed the {limit} byte limit: {size} bytes")]
    HeaderLimitExceeded {
        /// Measured header name + value bytes.
        size: usize,
        /// The configured ceiling.
        limit: usize,
    },

    /// Transport-level failure (connect, timeout, body read).
    #[error("Request failed: {message}")]
    RequestFailed {
        /// Description of the failure.
        message: String,
        /// The underlying error, if available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A successful response could not be parsed.
    #[error("Response parsing failed: {message}")]
    ResponseParsingError {
        /// Details about the parsing failure.
        message: String,
    },

    /// Harness configuration is invalid.
    #[error("Probe configuration error: {message}")]
    ConfigurationError {
        /// Description of the configuration problem.
        message: String,
    },

    /// A scenario finished without the outcome it was checking for.
    #[error("Expectation failed: {message}")]
    ExpectationFailed {
        /// What was expected and what happened instead.
        message: String,
    },
}

impl ProbeError {
    /// The HTTP status behind this error, if the proxy answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the proxy rejected the request with 429.
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }

    // =========================================================================
    // Constructor methods with automatic logging
    // =========================================================================

    pub fn unexpected_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        log_warn!(
            error_type = "unexpected_status",
            status = status,
            body = %body,
            "Proxy returned a non-200 status"
        );
        Self::UnexpectedStatus { status, body }
    }

    pub fn header_limit_exceeded(size: usize, limit: usize) -> Self {
        log_error!(
            error_type = "header_limit_exceeded",
            header_bytes = size,
            limit = limit,
            "Response headers exceed the reverse-proxy limit"
        );
        Self::HeaderLimitExceeded { size, limit }
    }

    pub fn request_failed(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        let message = message.into();
        log_error!(
            error_type = "request_failed",
            message = %message,
            has_source = source.is_some(),
            "Proxy request failed"
        );
        Self::RequestFailed { message, source }
    }

    pub fn response_parsing_error(message: impl Into<String>) -> Self {
        let message = message.into();
        log_warn!(
            error_type = "response_parsing_error",
            message = %message,
            "Proxy response format invalid"
        );
        Self::ResponseParsingError { message }
    }

    pub fn configuration_error(message: impl Into<String>) -> Self {
        let message = message.into();
        log_error!(
            error_type = "configuration_error",
            message = %message,
            "Probe configuration validation failed"
        );
        Self::ConfigurationError { message }
    }

    pub fn expectation_failed(message: impl Into<String>) -> Self {
        let message = message.into();
        log_error!(
            error_type = "expectation_failed",
            message = %message,
            "Scenario expectation not met"
        );
        Self::ExpectationFailed { message }
    }
}
