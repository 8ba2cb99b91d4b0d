//! Write gate: the single synchronized entry point for new events
//!
//! Each draft runs through the same pipeline, with an independent outcome:
//!
//! 1. structural check (required fields, timestamp)
//! 2. identity binding (draft subject must be the caller, unless root)
//! 3. policy drafts: reserved action, decodable payload, valid patterns,
//!    and the caller must itself be allowed to write that policy action
//! 4. other drafts: the caller must be allowed the draft's action on its resource
//! 5. append to the log, then fold an accepted policy rule into the projection
//!
//! Steps 3 to 5 run under one submission mutex, so the projection seen by
//! any later check already contains every rule accepted before it.

use crate::config::AuthzConfig;
use crate::engine::PermissionEngine;
use crate::error::{ErrorKind, Result, SubmitError};
use crate::policy::{LogEntry, PolicyEffect, RulePatterns, ACL_RESOURCE};
use crate::projector::AclProjector;
use crate::types::AclDecision;
use serde::{Deserialize, Serialize};
use simplesync_core::{
    Event, EventDraft, EventLog, EventQuery, IdentityProvider, InMemoryEventLog, JsonlEventLog,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Outcome for one submitted draft
pub type SubmitResult = std::result::Result<Event, SubmitError>;

/// Request to add one rule, without the event envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSubmission {
    #[serde(flatten)]
    pub patterns: RulePatterns,

    #[serde(rename = "type", alias = "effect")]
    pub effect: PolicyEffect,
}

impl RuleSubmission {
    pub fn allow(subject: &str, resource: &str, action: &str) -> Self {
        Self {
            patterns: RulePatterns::new(subject, resource, action),
            effect: PolicyEffect::Allow,
        }
    }

    pub fn deny(subject: &str, resource: &str, action: &str) -> Self {
        Self {
            patterns: RulePatterns::new(subject, resource, action),
            effect: PolicyEffect::Deny,
        }
    }
}

/// Validates, authorizes, and commits events against the live policy
pub struct WriteGate {
    config: AuthzConfig,
    log: Arc<dyn EventLog>,
    projector: AclProjector,
    engine: PermissionEngine,
    submit_lock: Mutex<()>,
}

impl WriteGate {
    /// Build a gate over an existing log, folding it once
    pub async fn new(config: AuthzConfig, log: Arc<dyn EventLog>) -> Result<Self> {
        config.validate()?;

        let projector = AclProjector::load(Arc::clone(&log)).await?;
        let engine = PermissionEngine::new(config.root_subject.clone(), projector.projection());

        info!(root = %config.root_subject, "Write gate ready");

        Ok(Self {
            config,
            log,
            projector,
            engine,
            submit_lock: Mutex::new(()),
        })
    }

    /// Build a gate over the log named by the configuration
    pub async fn open(config: AuthzConfig) -> Result<Self> {
        let log: Arc<dyn EventLog> = match &config.log_path {
            Some(path) => Arc::new(JsonlEventLog::open(path)?),
            None => Arc::new(InMemoryEventLog::new()),
        };
        Self::new(config, log).await
    }

    /// Submit a batch of drafts as `caller`
    ///
    /// Drafts are processed in order and independently: a rejection does not
    /// stop later drafts. The returned vector lines up with the input.
    pub async fn submit(&self, caller: &str, drafts: Vec<EventDraft>) -> Vec<SubmitResult> {
        let mut results = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let result = self.submit_one(caller, draft).await;
            if let Err(e) = &result {
                info!(caller, draft_id = e.draft_id(), kind = %e.kind(), error = %e, "Rejected event");
            }
            results.push(result);
        }
        results
    }

    /// Resolve the caller from a credential, then submit
    ///
    /// An unrecognized credential rejects every draft.
    pub async fn submit_authenticated(
        &self,
        identity: &dyn IdentityProvider,
        credential: &str,
        drafts: Vec<EventDraft>,
    ) -> Vec<SubmitResult> {
        match identity.resolve(credential).await {
            Some(caller) => self.submit(&caller, drafts).await,
            None => {
                warn!(drafts = drafts.len(), "Rejecting submission with unresolved credential");
                drafts
                    .into_iter()
                    .map(|d| Err(SubmitError::Unauthenticated { draft_id: d.id }))
                    .collect()
            }
        }
    }

    /// Submit rule requests as `caller`
    ///
    /// Each request becomes a policy event with a fresh id and the current
    /// wall-clock second as its timestamp.
    pub async fn submit_rules(&self, caller: &str, rules: Vec<RuleSubmission>) -> Vec<SubmitResult> {
        let timestamp = now_secs().max(1);
        let drafts = rules
            .into_iter()
            .map(|rule| {
                EventDraft::new(
                    uuid::Uuid::new_v4().to_string(),
                    timestamp,
                    caller,
                    ACL_RESOURCE,
                    rule.effect.action(),
                )
                .with_payload(rule.patterns.to_payload())
            })
            .collect();
        self.submit(caller, drafts).await
    }

    async fn submit_one(&self, caller: &str, draft: EventDraft) -> SubmitResult {
        self.check_structure(&draft)?;

        if !self.engine.is_root(caller) && draft.subject != caller {
            warn!(caller, subject = %draft.subject, draft_id = %draft.id, "Cannot submit events for other users");
            return Err(SubmitError::denied(&draft.id, caller, &draft.resource, &draft.action));
        }

        let event = draft.into_event();
        let entry = LogEntry::decode(&event).map_err(|e| SubmitError::validation(&event.id, e.to_string()))?;

        let _guard = self.submit_lock.lock().await;

        // Policy writes are gated on (caller, ".acl", action) like any other resource
        let decision = self.engine.check(caller, &event.resource, &event.action).await;
        if !decision.allowed {
            return Err(SubmitError::denied(&event.id, caller, &event.resource, &event.action));
        }

        let sequence = self
            .log
            .append(event.clone())
            .await
            .map_err(|e| SubmitError::from_log(&event.id, e))?;

        match entry {
            LogEntry::PolicyMutation(mutation) => {
                let rule = mutation.into_rule(sequence);
                info!(caller, event_id = %event.id, sequence, rule = %rule, "Accepted ACL rule");
                self.projector.incorporate(rule).await;
            }
            LogEntry::Generic(_) => {
                debug!(caller, event_id = %event.id, sequence, "Accepted event");
            }
        }

        Ok(event)
    }

    fn check_structure(&self, draft: &EventDraft) -> std::result::Result<(), SubmitError> {
        let missing = [
            ("id", draft.id.is_empty()),
            ("subject", draft.subject.is_empty()),
            ("resource", draft.resource.is_empty()),
            ("action", draft.action.is_empty()),
        ];
        if let Some((field, _)) = missing.iter().find(|(_, empty)| *empty) {
            return Err(SubmitError::validation(&draft.id, format!("missing required field '{field}'")));
        }

        if draft.timestamp == 0 {
            return Err(SubmitError::validation(&draft.id, "timestamp must be greater than zero"));
        }

        if let Some(skew) = self.config.max_future_skew_secs {
            let limit = now_secs().saturating_add(skew);
            if draft.timestamp > limit {
                return Err(SubmitError::validation(
                    &draft.id,
                    format!("timestamp {} is more than {}s in the future", draft.timestamp, skew),
                ));
            }
        }

        Ok(())
    }

    /// Re-fold the log after it was written outside the gate
    ///
    /// Holds the submission mutex so no accepted rule is lost between the
    /// log read and the projection swap.
    pub async fn refresh(&self) -> Result<usize> {
        let _guard = self.submit_lock.lock().await;
        self.projector.refresh().await
    }

    /// Events in append order, unfiltered by permission
    pub async fn list_events(&self, query: EventQuery) -> Result<Vec<Event>> {
        Ok(self.log.query(&query).await?)
    }

    /// Full decision for a request
    pub async fn check(&self, subject: &str, resource: &str, action: &str) -> AclDecision {
        self.engine.check(subject, resource, action).await
    }

    /// Allow/deny for a request
    pub async fn check_permission(&self, subject: &str, resource: &str, action: &str) -> bool {
        self.engine.check_permission(subject, resource, action).await
    }

    pub fn engine(&self) -> &PermissionEngine {
        &self.engine
    }

    pub fn projector(&self) -> &AclProjector {
        &self.projector
    }

    pub fn config(&self) -> &AuthzConfig {
        &self.config
    }
}

/// Count rejections of each kind in a batch result
pub fn count_rejections(results: &[SubmitResult], kind: ErrorKind) -> usize {
    results
        .iter()
        .filter(|r| matches!(r, Err(e) if e.kind() == kind))
        .count()
}

fn now_secs() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(config: AuthzConfig) -> WriteGate {
        tokio_test::block_on(WriteGate::new(config, Arc::new(InMemoryEventLog::new()))).unwrap()
    }

    #[test]
    fn test_rule_submission_json() {
        let rule: RuleSubmission = serde_json::from_str(
            r#"{"subjectPattern":"u*","resourcePattern":"doc1","actionPattern":"read","type":"deny"}"#,
        )
        .unwrap();
        assert_eq!(rule, RuleSubmission::deny("u*", "doc1", "read"));

        let legacy: RuleSubmission =
            serde_json::from_str(r#"{"user":"u1","item":"*","action":"*","effect":"allow"}"#).unwrap();
        assert_eq!(legacy, RuleSubmission::allow("u1", "*", "*"));
    }

    #[test]
    fn test_structure_reports_first_missing_field() {
        let gate = gate(AuthzConfig::default());

        let err = gate
            .check_structure(&EventDraft::new("e1", 5, "u1", "", ""))
            .unwrap_err();
        match err {
            SubmitError::Validation { reason, .. } => assert_eq!(reason, "missing required field 'resource'"),
            other => panic!("unexpected error {other:?}"),
        }

        assert!(gate.check_structure(&EventDraft::new("e1", 5, "u1", "doc1", "read")).is_ok());
    }

    #[test]
    fn test_future_skew_is_relative_to_now() {
        let gate = gate(AuthzConfig::default().with_max_future_skew(3600));
        let now = now_secs();

        assert!(gate.check_structure(&EventDraft::new("e1", now + 60, "u1", "doc1", "read")).is_ok());
        assert!(gate.check_structure(&EventDraft::new("e2", now + 7200, "u1", "doc1", "read")).is_err());
        assert!(gate.check_structure(&EventDraft::new("e3", 1, "u1", "doc1", "read")).is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = tokio_test::block_on(WriteGate::new(
            AuthzConfig::default().with_root_subject("*"),
            Arc::new(InMemoryEventLog::new()),
        ));
        assert!(matches!(result, Err(crate::error::AuthzError::Config(_))));
    }
}
