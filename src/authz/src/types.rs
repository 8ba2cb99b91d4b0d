//! Authorization decision types

use crate::policy::AclRule;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a decision came out the way it did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionReason {
    /// Subject is the root identity; no rules consulted
    RootBypass,

    /// No rule matched the request
    DefaultDeny,

    /// The highest-ranked matching rule
    Rule { rule: AclRule },
}

/// Authorization decision for one (subject, resource, action) triple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AclDecision {
    pub subject: String,
    pub resource: String,
    pub action: String,

    /// Whether the request is allowed
    pub allowed: bool,

    pub reason: DecisionReason,
}

impl AclDecision {
    pub(crate) fn root_bypass(subject: &str, resource: &str, action: &str) -> Self {
        Self::new(subject, resource, action, true, DecisionReason::RootBypass)
    }

    pub(crate) fn default_deny(subject: &str, resource: &str, action: &str) -> Self {
        Self::new(subject, resource, action, false, DecisionReason::DefaultDeny)
    }

    pub(crate) fn from_rule(subject: &str, resource: &str, action: &str, rule: AclRule) -> Self {
        let allowed = rule.effect.is_allow();
        Self::new(subject, resource, action, allowed, DecisionReason::Rule { rule })
    }

    fn new(subject: &str, resource: &str, action: &str, allowed: bool, reason: DecisionReason) -> Self {
        Self {
            subject: subject.to_string(),
            resource: resource.to_string(),
            action: action.to_string(),
            allowed,
            reason,
        }
    }

    /// The deciding rule, if any
    pub fn rule(&self) -> Option<&AclRule> {
        match &self.reason {
            DecisionReason::Rule { rule } => Some(rule),
            _ => None,
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionReason::RootBypass => f.write_str("root bypass"),
            DecisionReason::DefaultDeny => f.write_str("no matching rule"),
            DecisionReason::Rule { rule } => write!(f, "rule #{} ({})", rule.sequence, rule),
        }
    }
}
