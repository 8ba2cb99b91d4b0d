//! Append-only event log trait

use crate::error::Result;
use crate::types::{Event, EventQuery};
use async_trait::async_trait;

/// Append-only, duplicate-rejecting store of immutable events
///
/// Enumeration order is append order. Replaying `events()` always yields the
/// same sequence, so anything folded from it is reproducible.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Append an event, returning its sequence number (starting at 1)
    ///
    /// Fails with [`LogError::DuplicateId`](crate::LogError::DuplicateId) if
    /// the id is already present. A failed append leaves the log unchanged.
    async fn append(&self, event: Event) -> Result<u64>;

    /// All events in append order
    async fn events(&self) -> Result<Vec<Event>>;

    /// Events inside the query bounds, in append order
    async fn query(&self, query: &EventQuery) -> Result<Vec<Event>> {
        let events = self.events().await?;
        Ok(events.into_iter().filter(|e| query.matches(e)).collect())
    }

    /// Whether an event with this id exists
    async fn contains(&self, id: &str) -> Result<bool>;

    /// Number of events in the log
    async fn len(&self) -> Result<usize>;

    /// Whether the log holds no events
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}
