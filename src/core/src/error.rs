//! Error types for event log backends

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LogError>;

/// Event log error
#[derive(Debug, Error)]
pub enum LogError {
    /// The log already holds an event with this id
    #[error("Duplicate event id: {0}")]
    DuplicateId(String),

    /// Underlying file I/O failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A record in the middle of a durable log could not be read back
    #[error("Corrupt log record at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },
}

impl LogError {
    /// True when the error is a duplicate-id rejection rather than a storage fault
    pub fn is_duplicate(&self) -> bool {
        matches!(self, LogError::DuplicateId(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LogError::DuplicateId("evt-1".to_string());
        assert_eq!(err.to_string(), "Duplicate event id: evt-1");
        assert!(err.is_duplicate());

        let err = LogError::Corrupt { line: 3, reason: "bad json".to_string() };
        assert_eq!(err.to_string(), "Corrupt log record at line 3: bad json");
        assert!(!err.is_duplicate());
    }
}
