//! Error types for savoir-sync.

use thiserror::Error;

/// Errors that can occur while capturing, persisting or replaying actions.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The SQLite database could not be opened, migrated or queried.
    #[error("Database error: {0}")]
    Database(String),

    /// The persistent slot could not be written (quota exceeded, write denied).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem or socket error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Data could not be serialized or parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A replayed or direct submission was not accepted by the endpoint.
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// An action target could not be resolved to a URL.
    #[error("Invalid target '{target}': {reason}")]
    InvalidTarget {
        /// The target as captured.
        target: String,
        /// Why it could not be resolved.
        reason: String,
    },
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<rusqlite::Error> for SyncError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(e.to_string())
    }
}

impl SyncError {
    /// Whether this error came from the submission endpoint or the network.
    #[must_use]
    pub const fn is_delivery(&self) -> bool {
        matches!(self, Self::Delivery(_) | Self::InvalidTarget { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = SyncError::Storage("quota exceeded".to_string());
        assert_eq!(err.to_string(), "Storage error: quota exceeded");

        let err = SyncError::InvalidTarget {
            target: "::".to_string(),
            reason: "relative URL without a base".to_string(),
        };
        assert!(err.to_string().contains("'::'"));
    }

    #[test]
    fn test_from_serde_json() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: SyncError = parse.unwrap_err().into();
        assert!(matches!(err, SyncError::Parse(_)));
    }

    #[test]
    fn test_is_delivery() {
        assert!(SyncError::Delivery("HTTP 500".to_string()).is_delivery());
        assert!(!SyncError::Storage("full".to_string()).is_delivery());
    }
}
