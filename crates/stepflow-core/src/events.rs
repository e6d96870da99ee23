//! Run event types.
//!
//! Both workflow runs and agent runs report progress through the same event
//! stream. Every event is stamped with the time it was emitted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Position of an agent iteration within its run, attached to events that
/// originate inside the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IterationMeta {
    /// 1-based iteration number.
    pub iteration: u32,
}

/// A run lifecycle event.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    /// A run began.
    Start { run_id: String },

    /// A workflow step is about to execute.
    StepStart { step: String },

    /// A workflow step finished without error.
    StepSuccess { step: String },

    /// A workflow step returned an error.
    StepError { step: String, error: String },

    /// An agent iteration produced an intermediate value.
    Update {
        key: String,
        value: Value,
        meta: IterationMeta,
    },

    /// A recoverable error is being retried.
    Retry { error: String, meta: IterationMeta },

    /// The run failed.
    Error { error: String },

    /// The run completed with a final value.
    Success { value: Value },

    /// The run was cancelled.
    Cancelled { reason: Option<String> },
}

impl RunEvent {
    /// The kind of this event, for filtering.
    pub fn kind(&self) -> EventKind {
        match self {
            RunEvent::Start { .. } => EventKind::Start,
            RunEvent::StepStart { .. } => EventKind::StepStart,
            RunEvent::StepSuccess { .. } => EventKind::StepSuccess,
            RunEvent::StepError { .. } => EventKind::StepError,
            RunEvent::Update { .. } => EventKind::Update,
            RunEvent::Retry { .. } => EventKind::Retry,
            RunEvent::Error { .. } => EventKind::Error,
            RunEvent::Success { .. } => EventKind::Success,
            RunEvent::Cancelled { .. } => EventKind::Cancelled,
        }
    }
}

/// Discriminant of [`RunEvent`], used by subscription filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Start,
    StepStart,
    StepSuccess,
    StepError,
    Update,
    Retry,
    Error,
    Success,
    Cancelled,
}

/// Which events a subscriber wants to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFilter {
    /// Deliver every event.
    All,

    /// Deliver only events of one kind.
    Kind(EventKind),
}

impl EventFilter {
    /// Whether this filter accepts the given event.
    pub fn matches(&self, event: &RunEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Kind(kind) => event.kind() == *kind,
        }
    }
}

/// A timestamped event as delivered to subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    /// When the event was emitted.
    pub at: DateTime<Utc>,

    /// The event itself.
    pub payload: RunEvent,
}
