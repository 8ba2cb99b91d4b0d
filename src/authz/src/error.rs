//! Error types for the authorization engine

use simplesync_core::LogError;
use std::fmt;
use thiserror::Error;

/// Engine-level errors (startup, refresh, configuration)
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Event log failure
    #[error("Log error: {0}")]
    Log(#[from] LogError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, AuthzError>;

/// Rejection category of a submitted draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed draft or policy payload
    Validation,
    /// Caller lacks a grant, or tried to act as someone else
    PermissionDenied,
    /// The log already holds this id
    DuplicateId,
    /// The log append failed
    Storage,
    /// The caller's credential did not resolve
    Unauthenticated,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::DuplicateId => "duplicate_id",
            ErrorKind::Storage => "storage_failure",
            ErrorKind::Unauthenticated => "unauthenticated",
        };
        f.write_str(name)
    }
}

/// Per-draft rejection
///
/// Every variant carries the id of the draft it rejects so batch callers can
/// correlate outcomes.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("event {draft_id}: {reason}")]
    Validation { draft_id: String, reason: String },

    #[error("event {draft_id}: {subject} may not {action} on {resource}")]
    PermissionDenied {
        draft_id: String,
        subject: String,
        resource: String,
        action: String,
    },

    #[error("event {draft_id}: id already exists in the log")]
    DuplicateId { draft_id: String },

    #[error("event {draft_id}: storage failure: {source}")]
    Storage {
        draft_id: String,
        #[source]
        source: LogError,
    },

    #[error("event {draft_id}: authentication required")]
    Unauthenticated { draft_id: String },
}

impl SubmitError {
    pub(crate) fn validation(draft_id: &str, reason: impl Into<String>) -> Self {
        SubmitError::Validation {
            draft_id: draft_id.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn denied(draft_id: &str, subject: &str, resource: &str, action: &str) -> Self {
        SubmitError::PermissionDenied {
            draft_id: draft_id.to_string(),
            subject: subject.to_string(),
            resource: resource.to_string(),
            action: action.to_string(),
        }
    }

    /// Map a failed append; a duplicate is reported as such, anything else as storage
    pub(crate) fn from_log(draft_id: &str, err: LogError) -> Self {
        match err {
            LogError::DuplicateId(_) => SubmitError::DuplicateId {
                draft_id: draft_id.to_string(),
            },
            source => SubmitError::Storage {
                draft_id: draft_id.to_string(),
                source,
            },
        }
    }

    /// Id of the rejected draft
    pub fn draft_id(&self) -> &str {
        match self {
            SubmitError::Validation { draft_id, .. }
            | SubmitError::PermissionDenied { draft_id, .. }
            | SubmitError::DuplicateId { draft_id }
            | SubmitError::Storage { draft_id, .. }
            | SubmitError::Unauthenticated { draft_id } => draft_id,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SubmitError::Validation { .. } => ErrorKind::Validation,
            SubmitError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            SubmitError::DuplicateId { .. } => ErrorKind::DuplicateId,
            SubmitError::Storage { .. } => ErrorKind::Storage,
            SubmitError::Unauthenticated { .. } => ErrorKind::Unauthenticated,
        }
    }
}
