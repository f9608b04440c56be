//! Error types for the core library

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Credentials were rejected or are missing
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The document database could not be reached or answered non-2xx
    #[error("Task source unavailable: {message}")]
    SourceUnavailable {
        status: Option<u16>,
        message: String,
    },

    /// A write-back was rejected by the document database
    #[error("Write rejected for task {task_id}: {message}")]
    WriteConflict { task_id: String, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    TomlDecode(#[from] toml::de::Error),
}

impl Error {
    /// Create a SourceUnavailable error without an HTTP status
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            status: None,
            message: message.into(),
        }
    }

    /// Whether this error must abort the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Auth(_) | Self::SourceUnavailable { .. } | Self::Config(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_display_with_status() {
        let err = Error::SourceUnavailable {
            status: Some(502),
            message: "status 502: bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "Task source unavailable: status 502: bad gateway");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_write_conflict_is_not_fatal() {
        let err = Error::WriteConflict {
            task_id: "page-1".to_string(),
            message: "conflict".to_string(),
        };
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("page-1"));
    }
}
