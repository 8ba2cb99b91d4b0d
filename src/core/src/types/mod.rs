//! Shared types for the event log

pub mod event;

pub use event::{Event, EventDraft, EventQuery};
