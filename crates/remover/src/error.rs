//! Error types for wl-remover

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use wl_core::task::FailureReason;

/// Result type alias for removal operations
pub type Result<T> = std::result::Result<T, RemovalError>;

/// Errors that can occur while removing playlist entries
#[derive(Debug, Error)]
pub enum RemovalError {
    /// Playlist API returned an error or could not be reached
    #[error("Playlist API error{}: {message}", status_suffix(.status))]
    Api { status: Option<u16>, message: String },

    /// OAuth credentials are missing, expired beyond refresh, or lack scope
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    /// Token file could not be read
    #[error("Failed to read token file {path}: {message}")]
    TokenFile { path: PathBuf, message: String },

    /// WebDriver command failed
    #[error("WebDriver error ({error}): {message}")]
    WebDriver { error: String, message: String },

    /// Waiting for a UI condition expired
    #[error("Timed out after {timeout:?} waiting for {what}")]
    Timeout { what: String, timeout: Duration },

    /// A UI element required by the flow is not on the page
    #[error("Element missing: {what}")]
    ElementMissing { what: String },

    /// No browser session is open
    #[error("Browser session is not open")]
    SessionClosed,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Task source error
    #[error(transparent)]
    Core(#[from] wl_core::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {})", s)).unwrap_or_default()
}

impl RemovalError {
    /// Create an Api error
    pub fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an Auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a WebDriver error
    pub fn webdriver(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WebDriver {
            error: error.into(),
            message: message.into(),
        }
    }

    /// Create an ElementMissing error
    pub fn element_missing(what: impl Into<String>) -> Self {
        Self::ElementMissing { what: what.into() }
    }

    /// Whether the run cannot continue
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Auth { .. } | Self::TokenFile { .. } => true,
            Self::Core(e) => e.is_fatal(),
            _ => false,
        }
    }

    /// Per-task failure reason for errors raised while removing one entry
    pub fn into_failure(self, step: &str) -> FailureReason {
        match self {
            Self::Timeout { .. } | Self::ElementMissing { .. } => {
                FailureReason::TimeoutOrElementMissing {
                    step: step.to_string(),
                    detail: self.to_string(),
                }
            }
            Self::WebDriver { ref error, .. }
                if TRANSIENT_WEBDRIVER_ERRORS.contains(&error.as_str()) =>
            {
                FailureReason::TimeoutOrElementMissing {
                    step: step.to_string(),
                    detail: self.to_string(),
                }
            }
            Self::Api {
                status: Some(401),
                message,
            } => FailureReason::Unauthorized { message },
            Self::Api { status, message } => FailureReason::RemoteApi { status, message },
            Self::Auth { message } => FailureReason::Unauthorized { message },
            Self::TokenFile { .. } => FailureReason::Unauthorized {
                message: self.to_string(),
            },
            other => FailureReason::Driver {
                message: other.to_string(),
            },
        }
    }
}

/// WebDriver errors caused by the page re-rendering under the flow
const TRANSIENT_WEBDRIVER_ERRORS: &[&str] = &[
    "stale element reference",
    "element not interactable",
    "element click intercepted",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = RemovalError::api(Some(403), "quotaExceeded");
        assert_eq!(err.to_string(), "Playlist API error (status 403): quotaExceeded");
        let err = RemovalError::api(None, "connection reset");
        assert_eq!(err.to_string(), "Playlist API error: connection reset");
    }

    #[test]
    fn test_timeout_maps_to_timeout_or_element_missing() {
        let err = RemovalError::Timeout {
            what: "overflow menu".into(),
            timeout: Duration::from_secs(10),
        };
        match err.into_failure("overflow_menu_open") {
            FailureReason::TimeoutOrElementMissing { step, detail } => {
                assert_eq!(step, "overflow_menu_open");
                assert!(detail.contains("overflow menu"));
            }
            other => panic!("unexpected reason: {:?}", other),
        }
    }

    #[test]
    fn test_rerender_errors_are_retryable() {
        for error in ["stale element reference", "element not interactable"] {
            let reason =
                RemovalError::webdriver(error, "node detached").into_failure("save_dialog_open");
            assert!(reason.is_transient(), "{} should be retried", error);
            assert!(matches!(
                reason,
                FailureReason::TimeoutOrElementMissing { ref step, .. } if step == "save_dialog_open"
            ));
        }
        let crashed = RemovalError::webdriver("invalid session id", "session deleted")
            .into_failure("toggled");
        assert!(matches!(crashed, FailureReason::Driver { .. }));
        assert!(!crashed.is_transient());
    }

    #[test]
    fn test_auth_errors_become_fatal_reasons() {
        let refresh =
            RemovalError::auth("token refresh rejected with status 400").into_failure("scan");
        assert!(refresh.is_fatal());
        let revoked = RemovalError::api(Some(401), "Invalid Credentials").into_failure("delete");
        assert!(revoked.is_fatal());
        assert!(!RemovalError::api(Some(403), "quotaExceeded").into_failure("delete").is_fatal());
    }

    #[test]
    fn test_fatal_classification() {
        assert!(RemovalError::auth("read-only scope").is_fatal());
        assert!(!RemovalError::api(Some(500), "backend").is_fatal());
        assert!(!RemovalError::element_missing("checkbox").is_fatal());
    }
}
