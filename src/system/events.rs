//! Append-only change history of a system.
//!
//! Every mutating operation on an `IOSystem` records what it did in the
//! system's [`EventLog`]. Warnings are also emitted through `tracing` so
//! that applications with a subscriber see them as they happen; the log
//! keeps them for later inspection.

/// Category of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A table was calculated, reset, aggregated or otherwise changed.
    Modification,
    /// Informational entry.
    Note,
    /// Recoverable problem; the operation continued.
    Warning,
}

/// One entry of the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub seq: usize,
    pub kind: EventKind,
    pub message: String,
}

/// Ordered, append-only list of events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: EventKind, message: impl Into<String>) {
        let seq = self.events.len();
        self.events.push(Event { seq, kind, message: message.into() });
    }

    pub fn modification(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(target: "rust_mrio", "{}", message);
        self.record(EventKind::Modification, message);
    }

    pub fn note(&mut self, message: impl Into<String>) {
        self.record(EventKind::Note, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(target: "rust_mrio", "{}", message);
        self.record(EventKind::Warning, message);
    }

    /// Append the entries of a scratch log, renumbered. Nothing is re-emitted.
    pub(crate) fn absorb(&mut self, other: EventLog) {
        for e in other.events {
            self.record(e.kind, e.message);
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(|e| e.kind == EventKind::Warning)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
