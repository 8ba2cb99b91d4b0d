//! # Simple Sync Core
//!
//! Shared event types, log and identity traits, and the event log backends
//! used by the authorization engine.

pub mod types;
pub mod traits;
pub mod error;
pub mod storage;

// Re-export commonly used types
pub use error::{LogError, Result};
pub use types::{Event, EventDraft, EventQuery};
pub use traits::{EventLog, IdentityProvider, StaticIdentityProvider};
pub use storage::{InMemoryEventLog, JsonlEventLog};

/// Subject identifier (user, service account, the root identity)
pub type SubjectId = String;

/// Unique event identifier
pub type EventId = String;
