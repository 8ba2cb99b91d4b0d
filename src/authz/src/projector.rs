//! ACL projection: the rule set folded from the event log
//!
//! The [`Projection`] is the only materialized copy of the policy. It is
//! owned by the [`AclProjector`] and shared read-only with the permission
//! engine. Readers take the lock shared; a rebuild or an incorporation takes
//! it exclusively and publishes the new rules before releasing it.

use crate::error::Result;
use crate::policy::{AclRule, LogEntry};
use simplesync_core::{Event, EventLog};
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{debug, info, warn};

/// Projected rules plus a change counter
#[derive(Debug, Default)]
pub struct ProjectionState {
    rules: Vec<AclRule>,
    version: u64,
    /// Log position of the last event folded or incorporated
    watermark: u64,
}

impl ProjectionState {
    /// Rules in log order
    pub fn rules(&self) -> &[AclRule] {
        &self.rules
    }

    /// Bumped on every incorporation and rebuild
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Highest log sequence already reflected in `rules`
    pub fn watermark(&self) -> u64 {
        self.watermark
    }
}

/// Reader/writer-guarded rule set
#[derive(Debug, Default)]
pub struct Projection {
    state: RwLock<ProjectionState>,
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared access for evaluation
    pub async fn read(&self) -> RwLockReadGuard<'_, ProjectionState> {
        self.state.read().await
    }

    /// Append a rule unless its event is already covered by the watermark
    async fn push(&self, rule: AclRule) -> bool {
        let mut state = self.state.write().await;
        if rule.sequence <= state.watermark {
            return false;
        }
        state.watermark = rule.sequence;
        state.rules.push(rule);
        state.version += 1;
        true
    }
}

/// Derives and maintains the projection from an event log
pub struct AclProjector {
    log: Arc<dyn EventLog>,
    projection: Arc<Projection>,
}

impl AclProjector {
    /// Fold the whole log once to build the initial projection
    pub async fn load(log: Arc<dyn EventLog>) -> Result<Self> {
        let projector = Self {
            log,
            projection: Arc::new(Projection::new()),
        };
        let count = projector.refresh().await?;
        info!(rules = count, "Loaded ACL projection");
        Ok(projector)
    }

    /// Re-fold the entire log
    ///
    /// For logs that were written outside the write gate (bulk seeding,
    /// imports). The projection stays exclusively locked for the duration
    /// so no reader observes a half-built rule set. Callers outside the
    /// crate go through `WriteGate::refresh`, which also holds the
    /// submission mutex.
    pub(crate) async fn refresh(&self) -> Result<usize> {
        let mut state = self.projection.state.write().await;
        let events = self.log.events().await?;
        state.rules = Self::fold(&events);
        state.watermark = events.len() as u64;
        state.version += 1;
        debug!(rules = state.rules.len(), version = state.version, "Rebuilt ACL projection");
        Ok(state.rules.len())
    }

    /// Append one newly accepted rule without re-reading the log
    ///
    /// A rule whose log position was already folded by a refresh is
    /// ignored; returns whether the rule was added.
    pub async fn incorporate(&self, rule: AclRule) -> bool {
        let sequence = rule.sequence;
        let added = self.projection.push(rule).await;
        if added {
            debug!(sequence, "Incorporated ACL rule");
        } else {
            debug!(sequence, "ACL rule already projected");
        }
        added
    }

    /// Pure fold of an ordered event sequence into rules
    ///
    /// Rule `sequence` is the 1-based position of the originating event.
    /// Policy events that fail to decode are skipped; the write gate never
    /// admits them, so they can only come from seeded logs.
    pub fn fold(events: &[Event]) -> Vec<AclRule> {
        let mut rules = Vec::new();
        for (index, event) in events.iter().enumerate() {
            match LogEntry::decode(event) {
                Ok(LogEntry::PolicyMutation(mutation)) => {
                    rules.push(mutation.into_rule(index as u64 + 1));
                }
                Ok(LogEntry::Generic(_)) => {}
                Err(e) => {
                    warn!(event_id = %event.id, error = %e, "Skipping undecodable ACL event");
                }
            }
        }
        rules
    }

    /// Snapshot of the current rules in log order
    pub async fn rules(&self) -> Vec<AclRule> {
        self.projection.read().await.rules().to_vec()
    }

    /// Current projection version
    pub async fn version(&self) -> u64 {
        self.projection.read().await.version()
    }

    /// Shared handle for evaluators
    pub fn projection(&self) -> Arc<Projection> {
        Arc::clone(&self.projection)
    }

    /// The log this projector folds
    pub fn log(&self) -> &Arc<dyn EventLog> {
        &self.log
    }
}
