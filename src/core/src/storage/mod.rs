//! Event log backends
//!
//! - [`InMemoryEventLog`]: process-local log, used by tests and tooling
//! - [`JsonlEventLog`]: durable append-only file, one JSON record per line
//!
//! Both keep the current event list behind an `Arc` snapshot that is swapped
//! on append, so readers clone a pointer and iterate without holding a lock.

pub mod memory;
pub mod jsonl;

pub use memory::InMemoryEventLog;
pub use jsonl::JsonlEventLog;

use crate::error::{LogError, Result};
use crate::types::Event;
use std::collections::HashSet;
use std::sync::Arc;

/// Event list plus id index shared by both backends
#[derive(Debug, Default)]
pub(crate) struct LogIndex {
    events: Arc<Vec<Event>>,
    ids: HashSet<String>,
}

impl LogIndex {
    /// Immutable view of the events at this instant
    pub(crate) fn snapshot(&self) -> Arc<Vec<Event>> {
        Arc::clone(&self.events)
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.events.len()
    }

    /// Reject an id that is already present
    pub(crate) fn ensure_unique(&self, id: &str) -> Result<()> {
        if self.ids.contains(id) {
            return Err(LogError::DuplicateId(id.to_string()));
        }
        Ok(())
    }

    /// Push an event whose id was already checked; returns its sequence
    pub(crate) fn push(&mut self, event: Event) -> u64 {
        self.ids.insert(event.id.clone());
        // Copies the list only while some reader still holds the old snapshot
        Arc::make_mut(&mut self.events).push(event);
        self.events.len() as u64
    }
}
