//! Event envelope types

use crate::{EventId, SubjectId};
use serde::{Deserialize, Serialize};

/// Immutable unit of the log
///
/// Once appended an event is never mutated or removed. `timestamp` is a
/// logical ordering value supplied by the submitter; it is not trusted as
/// wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier
    pub id: EventId,

    /// Logical time (> 0)
    pub timestamp: u64,

    /// Acting principal
    pub subject: SubjectId,

    /// Target of the operation
    pub resource: String,

    /// Operation name
    pub action: String,

    /// Opaque body, usually compact JSON text
    #[serde(default)]
    pub payload: String,
}

/// Event as submitted by a caller, before validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    pub id: EventId,
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default)]
    pub subject: SubjectId,
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub payload: String,
}

impl EventDraft {
    /// Create a draft with an empty payload
    pub fn new(
        id: impl Into<String>,
        timestamp: u64,
        subject: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp,
            subject: subject.into(),
            resource: resource.into(),
            action: action.into(),
            payload: String::new(),
        }
    }

    /// Attach a payload
    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Freeze the draft into a log event
    pub fn into_event(self) -> Event {
        Event {
            id: self.id,
            timestamp: self.timestamp,
            subject: self.subject,
            resource: self.resource,
            action: self.action,
            payload: self.payload,
        }
    }
}

impl From<Event> for EventDraft {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            timestamp: event.timestamp,
            subject: event.subject,
            resource: event.resource,
            action: event.action,
            payload: event.payload,
        }
    }
}

/// Read-side filter over the log (bounds are inclusive)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_timestamp: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_timestamp: Option<u64>,
}

impl EventQuery {
    /// Every event
    pub fn all() -> Self {
        Self::default()
    }

    /// Events with `timestamp >= from`
    pub fn since(from: u64) -> Self {
        Self {
            from_timestamp: Some(from),
            to_timestamp: None,
        }
    }

    /// Add an inclusive upper bound
    pub fn until(mut self, to: u64) -> Self {
        self.to_timestamp = Some(to);
        self
    }

    /// Check whether an event falls inside the bounds
    pub fn matches(&self, event: &Event) -> bool {
        self.from_timestamp.map_or(true, |from| event.timestamp >= from)
            && self.to_timestamp.map_or(true, |to| event.timestamp <= to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_into_event() {
        let event = EventDraft::new("evt-1", 42, "u1", "doc1", "edit")
            .with_payload(r#"{"line":3}"#)
            .into_event();

        assert_eq!(event.id, "evt-1");
        assert_eq!(event.timestamp, 42);
        assert_eq!(event.subject, "u1");
        assert_eq!(event.payload, r#"{"line":3}"#);
    }

    #[test]
    fn test_query_bounds_are_inclusive() {
        let event = EventDraft::new("evt-1", 200, "u1", "doc1", "edit").into_event();

        assert!(EventQuery::all().matches(&event));
        assert!(EventQuery::since(200).matches(&event));
        assert!(!EventQuery::since(201).matches(&event));
        assert!(EventQuery::since(100).until(200).matches(&event));
        assert!(!EventQuery::since(100).until(199).matches(&event));
    }

    #[test]
    fn test_event_json_shape() {
        let json = r#"{"id":"e","timestamp":1,"subject":"u","resource":"r","action":"a"}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.payload, "");
    }

    #[test]
    fn test_identifier_aliases() {
        let id: EventId = "evt-9".to_string();
        let subject: SubjectId = "user-123".to_string();

        let event = EventDraft::new(id.clone(), 1, subject.clone(), "doc1", "edit").into_event();
        assert_eq!(event.id, id);
        assert_eq!(event.subject, subject);
    }
}
