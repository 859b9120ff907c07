//! Navigator event recording for debugging and operator diagnostics.
//!
//! Every navigation action emits one event, including the ones the in-flight
//! guard or missing history turned into no-ops.

use chrono::{DateTime, Utc};

/// The navigation action that generated an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavEventKind {
    ListFiles,
    Latest,
    Older,
    Newer,
}

impl std::fmt::Display for NavEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ListFiles => "list_files",
            Self::Latest => "latest",
            Self::Older => "older",
            Self::Newer => "newer",
        };
        f.write_str(s)
    }
}

/// Outcome of a navigation action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEventOutcome {
    Loaded,
    Skipped(String),
    Failed(String),
}

impl std::fmt::Display for NavEventOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loaded => f.write_str("loaded"),
            Self::Skipped(reason) => write!(f, "skipped: {reason}"),
            Self::Failed(msg) => write!(f, "failed: {msg}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NavEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: NavEventKind,
    pub file: String,
    pub cursor: Option<u64>,
    pub outcome: NavEventOutcome,
}

impl NavEvent {
    pub fn new(
        kind: NavEventKind,
        file: impl Into<String>,
        cursor: Option<u64>,
        outcome: NavEventOutcome,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            file: file.into(),
            cursor,
            outcome,
        }
    }
}

/// Receives navigator events.
pub trait NavEventSink: Send + Sync {
    fn record(&self, event: NavEvent);
}

/// In-memory event sink for testing.
#[derive(Default)]
pub struct InMemoryNavEventSink {
    events: std::sync::Mutex<Vec<NavEvent>>,
}

impl InMemoryNavEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NavEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self) -> usize {
        match self.events.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

impl NavEventSink for InMemoryNavEventSink {
    fn record(&self, event: NavEvent) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

/// No-op event sink that discards all events.
pub struct NullNavEventSink;

impl NavEventSink for NullNavEventSink {
    fn record(&self, _event: NavEvent) {}
}
