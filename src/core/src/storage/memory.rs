//! In-memory event log

use super::LogIndex;
use crate::error::Result;
use crate::traits::EventLog;
use crate::types::{Event, EventQuery};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Process-local append-only log
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    index: RwLock<LogIndex>,
}

impl InMemoryEventLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk-append events outside any write gate (fixtures, imports)
    ///
    /// Stops at the first duplicate id. Callers holding a policy projection
    /// over this log must refresh it afterwards.
    pub fn seed(&self, events: impl IntoIterator<Item = Event>) -> Result<usize> {
        let mut index = self.index.write();
        let mut count = 0;
        for event in events {
            index.ensure_unique(&event.id)?;
            index.push(event);
            count += 1;
        }
        debug!(count, "Seeded in-memory event log");
        Ok(count)
    }

    /// Immutable view of the current events
    pub fn snapshot(&self) -> Arc<Vec<Event>> {
        self.index.read().snapshot()
    }
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    async fn append(&self, event: Event) -> Result<u64> {
        let mut index = self.index.write();
        index.ensure_unique(&event.id)?;
        let sequence = index.push(event);
        Ok(sequence)
    }

    async fn events(&self) -> Result<Vec<Event>> {
        Ok(self.snapshot().as_ref().clone())
    }

    async fn query(&self, query: &EventQuery) -> Result<Vec<Event>> {
        let snapshot = self.snapshot();
        Ok(snapshot.iter().filter(|e| query.matches(e)).cloned().collect())
    }

    async fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.index.read().contains(id))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.index.read().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventDraft;

    fn event(id: &str, timestamp: u64) -> Event {
        EventDraft::new(id, timestamp, "user-123", "doc1", "edit").into_event()
    }

    #[tokio::test]
    async fn test_append_assigns_sequences() {
        let log = InMemoryEventLog::new();

        assert_eq!(log.append(event("a", 10)).await.unwrap(), 1);
        assert_eq!(log.append(event("b", 5)).await.unwrap(), 2);

        let ids: Vec<_> = log.events().await.unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["a", "b"], "enumeration follows append order");
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected_without_change() {
        let log = InMemoryEventLog::new();
        log.append(event("a", 10)).await.unwrap();

        let err = log.append(event("a", 11)).await.unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(log.len().await.unwrap(), 1);
        assert_eq!(log.events().await.unwrap()[0].timestamp, 10);
    }

    #[tokio::test]
    async fn test_snapshot_is_stable_across_appends() {
        let log = InMemoryEventLog::new();
        log.append(event("a", 1)).await.unwrap();

        let before = log.snapshot();
        log.append(event("b", 2)).await.unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(log.snapshot().len(), 2);
    }

    #[test]
    fn test_seed_and_query() {
        let log = InMemoryEventLog::new();
        log.seed(vec![event("a", 100), event("b", 200), event("c", 300)]).unwrap();

        let events = tokio_test::block_on(log.query(&EventQuery::since(150))).unwrap();
        let ids: Vec<_> = events.into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["b", "c"]);

        assert!(log.seed(vec![event("a", 400)]).is_err());
    }
}
