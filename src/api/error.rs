//! Error types for calls against the library service.
//!
//! Every variant carries the endpoint it came from so log lines and
//! notifications can be traced back to a single request.

use thiserror::Error;

/// Errors that can occur while talking to the library service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (DNS, connection refused, TLS, reset).
    #[error("network error calling {endpoint}: {source}")]
    Network {
        /// Endpoint path that failed.
        endpoint: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Request did not complete within the configured timeout.
    #[error("timeout calling {endpoint}")]
    Timeout {
        /// Endpoint path that timed out.
        endpoint: String,
    },

    /// The service answered with a non-2xx status.
    #[error("HTTP {status} from {endpoint}")]
    HttpStatus {
        /// Endpoint path that rejected the request.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Response body, when one was sent.
        body: Option<String>,
    },

    /// The service answered 2xx but the body did not decode.
    #[error("invalid response body from {endpoint}: {reason}")]
    Decode {
        /// Endpoint path whose body failed to decode.
        endpoint: String,
        /// Decoder message.
        reason: String,
    },

    /// The configured base URL cannot be joined with the endpoint.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The offending URL text.
        url: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {reason}")]
    ClientBuild {
        /// Builder failure message.
        reason: String,
    },
}

impl ApiError {
    /// Creates a network error, mapping reqwest timeouts to [`ApiError::Timeout`].
    pub fn transport(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        let endpoint = endpoint.into();
        if source.is_timeout() {
            Self::Timeout { endpoint }
        } else {
            Self::Network { endpoint, source }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(endpoint: impl Into<String>, status: u16, body: Option<String>) -> Self {
        Self::HttpStatus {
            endpoint: endpoint.into(),
            status,
            body: body.filter(|text| !text.trim().is_empty()),
        }
    }

    /// Creates a decode error.
    pub fn decode(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Returns true when the service rejected the request (it was reachable).
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::HttpStatus { .. })
    }

    /// Returns true for 401/403 answers.
    #[must_use]
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::HttpStatus { status, .. } if *status == 401 || *status == 403)
    }
}
