//! Permission engine
//!
//! Resolves (subject, resource, action) against the live projection:
//!
//! ```text
//! subject == root? ──yes──▶ allow (bypass)
//!        │no
//!        ▼
//! filter rules by pattern match ──none──▶ deny (default)
//!        │
//!        ▼
//! rank by specificity, then recency ──▶ effect of the top rule
//! ```

pub mod ranking;

use crate::policy::AclRule;
use crate::projector::Projection;
use crate::types::AclDecision;
use std::sync::Arc;
use tracing::{debug, info};

/// Stateless evaluator over a shared projection
#[derive(Clone)]
pub struct PermissionEngine {
    root_subject: Arc<str>,
    projection: Arc<Projection>,
}

impl PermissionEngine {
    /// Create an engine reading `projection`, with `root_subject` bypassing all checks
    pub fn new(root_subject: impl Into<String>, projection: Arc<Projection>) -> Self {
        Self {
            root_subject: Arc::from(root_subject.into()),
            projection,
        }
    }

    pub fn root_subject(&self) -> &str {
        &self.root_subject
    }

    pub fn is_root(&self, subject: &str) -> bool {
        subject == &*self.root_subject
    }

    /// Decide a request against the current projection
    pub async fn check(&self, subject: &str, resource: &str, action: &str) -> AclDecision {
        if self.is_root(subject) {
            info!(subject, resource, action, "ACL: root bypass");
            return AclDecision::root_bypass(subject, resource, action);
        }

        let winner = {
            let state = self.projection.read().await;
            Self::evaluate(state.rules(), subject, resource, action).cloned()
        };

        match winner {
            Some(rule) => {
                debug!(
                    subject,
                    resource,
                    action,
                    effect = %rule.effect,
                    rule_sequence = rule.sequence,
                    "ACL: rule decision"
                );
                AclDecision::from_rule(subject, resource, action, rule)
            }
            None => {
                debug!(subject, resource, action, "ACL: deny by default");
                AclDecision::default_deny(subject, resource, action)
            }
        }
    }

    /// Boolean form of [`check`](Self::check), for route guards
    pub async fn check_permission(&self, subject: &str, resource: &str, action: &str) -> bool {
        self.check(subject, resource, action).await.allowed
    }

    /// Pick the deciding rule from a rule set, ignoring the root bypass
    pub fn evaluate<'a>(
        rules: &'a [AclRule],
        subject: &str,
        resource: &str,
        action: &str,
    ) -> Option<&'a AclRule> {
        ranking::select(rules.iter().filter(|r| r.matches(subject, resource, action)))
    }
}
