//! Removal outcomes

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a removal attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// A UI wait expired or a required element never appeared
    TimeoutOrElementMissing { step: String, detail: String },
    /// The playlist API answered with an error
    RemoteApi {
        status: Option<u16>,
        message: String,
    },
    /// The browser automation driver itself failed
    Driver { message: String },
    /// Credentials were rejected; no further task can succeed
    Unauthorized { message: String },
}

impl FailureReason {
    /// Whether another attempt might succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::TimeoutOrElementMissing { .. } => true,
            Self::RemoteApi { status, .. } => match status {
                None => true,
                Some(code) => *code == 429 || *code >= 500,
            },
            Self::Driver { .. } | Self::Unauthorized { .. } => false,
        }
    }

    /// Whether the run must stop instead of moving to the next task
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimeoutOrElementMissing { step, detail } => {
                write!(f, "timeout or element missing at {}: {}", step, detail)
            }
            Self::RemoteApi {
                status: Some(code),
                message,
            } => write!(f, "remote API error {}: {}", code, message),
            Self::RemoteApi {
                status: None,
                message,
            } => write!(f, "remote API error: {}", message),
            Self::Driver { message } => write!(f, "driver error: {}", message),
            Self::Unauthorized { message } => write!(f, "not authorized: {}", message),
        }
    }
}

/// Result of one removal attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The entry was in the playlist and has been removed
    Removed,
    /// The entry was not in the playlist
    AlreadyAbsent,
    /// The content could not be resolved on the remote platform
    NotFound,
    Failed { reason: FailureReason },
}

impl Outcome {
    pub fn failed(reason: FailureReason) -> Self {
        Self::Failed { reason }
    }

    /// Whether the task reached the desired end state
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Removed | Self::AlreadyAbsent)
    }

    /// Whether a retry is worth attempting
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Failed { reason } => reason.is_transient(),
            _ => false,
        }
    }

    /// The failure reason when it ends the whole run
    pub fn fatal_reason(&self) -> Option<&FailureReason> {
        match self {
            Self::Failed { reason } if reason.is_fatal() => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Removed => f.write_str("removed"),
            Self::AlreadyAbsent => f.write_str("already absent"),
            Self::NotFound => f.write_str("not found"),
            Self::Failed { reason } => write!(f, "failed ({})", reason),
        }
    }
}
