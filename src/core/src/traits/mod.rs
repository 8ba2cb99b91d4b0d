//! Shared traits for log backends and identity resolution

pub mod log;
pub mod identity;

// Re-export commonly used traits
pub use log::EventLog;
pub use identity::{IdentityProvider, StaticIdentityProvider};
