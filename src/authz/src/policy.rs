//! Policy events and the rules derived from them
//!
//! Policy mutations travel through the log as ordinary events addressed to
//! the reserved resource [`ACL_RESOURCE`]. They are told apart from
//! application events once, at decode time, by [`LogEntry::decode`].

use crate::pattern::{Pattern, PatternError};
use serde::{Deserialize, Serialize};
use simplesync_core::Event;
use std::fmt;
use thiserror::Error;

/// Reserved resource that carries policy mutations
pub const ACL_RESOURCE: &str = ".acl";

/// Action that appends an allow rule
pub const ACL_ALLOW_ACTION: &str = ".acl.allow";

/// Action that appends a deny rule
pub const ACL_DENY_ACTION: &str = ".acl.deny";

/// Rule effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyEffect {
    /// Allow the action
    Allow,
    /// Deny the action
    Deny,
}

impl PolicyEffect {
    /// Map a reserved policy action to its effect
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            ACL_ALLOW_ACTION => Some(PolicyEffect::Allow),
            ACL_DENY_ACTION => Some(PolicyEffect::Deny),
            _ => None,
        }
    }

    /// The reserved action that produces this effect
    pub fn action(&self) -> &'static str {
        match self {
            PolicyEffect::Allow => ACL_ALLOW_ACTION,
            PolicyEffect::Deny => ACL_DENY_ACTION,
        }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, PolicyEffect::Allow)
    }
}

impl fmt::Display for PolicyEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyEffect::Allow => f.write_str("allow"),
            PolicyEffect::Deny => f.write_str("deny"),
        }
    }
}

/// Errors decoding a policy event
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("'{0}' is not a policy action (expected .acl.allow or .acl.deny)")]
    UnknownAction(String),

    #[error("malformed policy payload: {0}")]
    MalformedPayload(String),

    #[error("invalid {field}: {source}")]
    InvalidPattern {
        field: &'static str,
        #[source]
        source: PatternError,
    },
}

/// Payload body of a policy event
///
/// Encoded as compact JSON with camelCase keys. The older
/// `user` / `item` / `action` keys are accepted on decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulePatterns {
    #[serde(alias = "user")]
    pub subject_pattern: String,

    #[serde(alias = "item")]
    pub resource_pattern: String,

    #[serde(alias = "action")]
    pub action_pattern: String,
}

impl RulePatterns {
    pub fn new(
        subject_pattern: impl Into<String>,
        resource_pattern: impl Into<String>,
        action_pattern: impl Into<String>,
    ) -> Self {
        Self {
            subject_pattern: subject_pattern.into(),
            resource_pattern: resource_pattern.into(),
            action_pattern: action_pattern.into(),
        }
    }

    /// Decode a payload string
    pub fn from_payload(payload: &str) -> Result<Self, PolicyError> {
        serde_json::from_str(payload).map_err(|e| PolicyError::MalformedPayload(e.to_string()))
    }

    /// Encode as a payload string
    pub fn to_payload(&self) -> String {
        // A struct of three strings always serializes
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Validate all three patterns, reporting the first bad field
    pub fn parse(&self) -> Result<(Pattern, Pattern, Pattern), PolicyError> {
        let check = |field: &'static str, value: &str| {
            Pattern::parse(value).map_err(|source| PolicyError::InvalidPattern { field, source })
        };
        Ok((
            check("subjectPattern", &self.subject_pattern)?,
            check("resourcePattern", &self.resource_pattern)?,
            check("actionPattern", &self.action_pattern)?,
        ))
    }
}

/// A decoded policy mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyMutation {
    pub effect: PolicyEffect,
    pub subject_pattern: Pattern,
    pub resource_pattern: Pattern,
    pub action_pattern: Pattern,
    pub timestamp: u64,
}

impl PolicyMutation {
    /// Materialize the rule, recording the log position of its event
    pub fn into_rule(self, sequence: u64) -> AclRule {
        AclRule {
            subject_pattern: self.subject_pattern,
            resource_pattern: self.resource_pattern,
            action_pattern: self.action_pattern,
            effect: self.effect,
            timestamp: self.timestamp,
            sequence,
        }
    }
}

/// Log entry, discriminated once when read from the homogeneous log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    /// Application event, payload uninterpreted
    Generic(Event),
    /// Policy rule addition
    PolicyMutation(PolicyMutation),
}

impl LogEntry {
    /// Classify an event
    ///
    /// Events addressed to [`ACL_RESOURCE`] must carry a reserved policy
    /// action and a payload of three valid patterns.
    pub fn decode(event: &Event) -> Result<Self, PolicyError> {
        if !is_policy_event(event) {
            return Ok(LogEntry::Generic(event.clone()));
        }

        let effect = PolicyEffect::from_action(&event.action)
            .ok_or_else(|| PolicyError::UnknownAction(event.action.clone()))?;
        let (subject_pattern, resource_pattern, action_pattern) =
            RulePatterns::from_payload(&event.payload)?.parse()?;

        Ok(LogEntry::PolicyMutation(PolicyMutation {
            effect,
            subject_pattern,
            resource_pattern,
            action_pattern,
            timestamp: event.timestamp,
        }))
    }

    pub fn is_policy(&self) -> bool {
        matches!(self, LogEntry::PolicyMutation(_))
    }
}

/// Whether an event targets the policy resource
pub fn is_policy_event(event: &Event) -> bool {
    event.resource == ACL_RESOURCE
}

/// Access-control rule derived from a policy event
///
/// Rules are never stored on their own; they exist only as the fold of the
/// log and are never edited or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AclRule {
    pub subject_pattern: Pattern,
    pub resource_pattern: Pattern,
    pub action_pattern: Pattern,
    pub effect: PolicyEffect,

    /// Copied from the originating event; final ranking key
    pub timestamp: u64,

    /// Position of the originating event in the log
    pub sequence: u64,
}

impl AclRule {
    /// Check if this rule applies to the request
    pub fn matches(&self, subject: &str, resource: &str, action: &str) -> bool {
        self.subject_pattern.matches(subject)
            && self.resource_pattern.matches(resource)
            && self.action_pattern.matches(action)
    }
}

impl fmt::Display for AclRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} subject={} resource={} action={} @{}",
            self.effect, self.subject_pattern, self.resource_pattern, self.action_pattern, self.timestamp
        )
    }
}
