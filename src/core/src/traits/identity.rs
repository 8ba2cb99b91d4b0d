//! Caller identity resolution

use async_trait::async_trait;
use std::collections::HashMap;

/// Resolves an opaque credential to the subject it authenticates
///
/// Credential formats and verification live outside this crate; the engine
/// only ever sees the resolved subject.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a credential, or `None` when it is not recognized
    async fn resolve(&self, credential: &str) -> Option<String>;
}

/// Fixed credential → subject table, for tooling and tests
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    subjects: HashMap<String, String>,
}

impl StaticIdentityProvider {
    /// Create an empty provider (every credential is unauthenticated)
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a credential for a subject
    pub fn with_credential(mut self, credential: impl Into<String>, subject: impl Into<String>) -> Self {
        self.subjects.insert(credential.into(), subject.into());
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn resolve(&self, credential: &str) -> Option<String> {
        self.subjects.get(credential).cloned()
    }
}
