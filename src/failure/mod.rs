//! Failure taxonomy for user-driven workflow actions.
//!
//! Service errors ([`ApiError`]) describe what happened on the wire; a
//! [`WorkflowError`] describes what it means for the action the user took
//! and which [`FailureCategory`] it belongs to.

use thiserror::Error;

use crate::api::ApiError;

/// Coarse classification of a workflow failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FailureCategory {
    /// Missing or expired token.
    Auth,
    /// Local input check failed before any network call.
    Validation,
    /// Transport failure (DNS, refused, timeout) or undecodable answer.
    Network,
    /// The service answered with a non-2xx status.
    ServerRejection,
}

impl FailureCategory {
    /// Returns a human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Auth => "Authentication",
            Self::Validation => "Validation",
            Self::Network => "Network",
            Self::ServerRejection => "Server rejection",
        }
    }
}

/// Error returned by workflow actions (upload, permission request, delete).
///
/// The user-visible notification has already been shown when one of these
/// is returned; the value exists for callers and logs.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// No token is stored; the action requires login.
    #[error("[AUTH] login required to {action}")]
    LoginRequired {
        /// Action that was gated.
        action: &'static str,
    },

    /// Draft is incomplete; nothing was sent.
    #[error("validation failed: {reason}")]
    Validation {
        /// What was missing.
        reason: &'static str,
    },

    /// The call did not complete.
    #[error("network failure: {source}")]
    Network {
        /// Underlying service error.
        #[source]
        source: ApiError,
    },

    /// The service refused the call.
    #[error("server rejected request: {source}")]
    Rejected {
        /// Underlying service error.
        #[source]
        source: ApiError,
    },

    /// The action is not available in the current workflow state.
    #[error("action unavailable while {state}")]
    InvalidState {
        /// Label of the state the action was attempted in.
        state: &'static str,
    },

    /// The response arrived after the user moved on and was discarded.
    #[error("response discarded: workflow state changed while request was in flight")]
    Superseded,
}

impl WorkflowError {
    /// Wraps a service error, separating rejections from transport failures.
    #[must_use]
    pub fn from_api(error: ApiError) -> Self {
        if error.is_rejection() {
            Self::Rejected { source: error }
        } else {
            Self::Network { source: error }
        }
    }

    /// Returns the failure category, or `None` for state-machine outcomes
    /// that are not failures of the request itself.
    #[must_use]
    pub fn category(&self) -> Option<FailureCategory> {
        match self {
            Self::LoginRequired { .. } => Some(FailureCategory::Auth),
            Self::Validation { .. } => Some(FailureCategory::Validation),
            Self::Network { .. } => Some(FailureCategory::Network),
            Self::Rejected { source } if source.is_auth_rejection() => Some(FailureCategory::Auth),
            Self::Rejected { .. } => Some(FailureCategory::ServerRejection),
            Self::InvalidState { .. } | Self::Superseded => None,
        }
    }
}
