//! # Simple Sync Authorization Engine
//!
//! Event-sourced access control over an append-only event log.
//!
//! ## Features
//!
//! - **Policy as events**: rules are ordinary log events addressed to `.acl`
//! - **Derived projection** rebuilt by folding the log, updated in place on accept
//! - **Specificity ranking** with trailing-`*` prefix patterns and recency tie-break
//! - **Write gate** that authenticates, authorizes, and appends each draft independently
//! - **Root bypass** for a single configured subject
//!
//! ## Example
//!
//! ```rust
//! use simplesync_authz::{AuthzConfig, RuleSubmission, WriteGate};
//! use simplesync_core::{EventDraft, InMemoryEventLog};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gate = WriteGate::new(AuthzConfig::default(), Arc::new(InMemoryEventLog::new())).await?;
//!
//!     gate.submit_rules(".root", vec![RuleSubmission::allow("alice", "doc1", "read")])
//!         .await;
//!
//!     let results = gate
//!         .submit("alice", vec![EventDraft::new("e1", 1, "alice", "doc1", "read")])
//!         .await;
//!     assert!(results[0].is_ok());
//!     assert!(!gate.check_permission("alice", "doc1", "write").await);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod pattern;
pub mod policy;
pub mod projector;
pub mod types;

// Re-export commonly used types
pub use config::{AuthzConfig, DEFAULT_ROOT_SUBJECT};
pub use engine::PermissionEngine;
pub use error::{AuthzError, ErrorKind, Result, SubmitError};
pub use gate::{RuleSubmission, SubmitResult, WriteGate};
pub use pattern::{Pattern, PatternError};
pub use policy::{
    AclRule, LogEntry, PolicyEffect, PolicyError, PolicyMutation, RulePatterns, ACL_ALLOW_ACTION,
    ACL_DENY_ACTION, ACL_RESOURCE,
};
pub use projector::AclProjector;
pub use types::{AclDecision, DecisionReason};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
