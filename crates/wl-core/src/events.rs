//! Progress events emitted while previewing and committing.
//!
//! A run writes [`LogEvent`]s into an [`EventSink`]; any consumer (a terminal
//! printer, a UI list, a test) drains the paired [`EventStream`]. The stream
//! ends once every sink has been dropped.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// How a log event should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// A single human-readable progress message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub message: String,
    pub severity: Severity,
}

/// Creates a connected sink and stream.
pub fn event_channel() -> (EventSink, EventStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSink { tx }, EventStream { rx })
}

/// Producer half. Cheap to clone; every clone feeds the same stream.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<LogEvent>,
}

impl EventSink {
    /// Emits an event and mirrors it to `tracing`.
    ///
    /// Never fails: if the stream was dropped the event is only traced.
    pub fn emit(&self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Error => tracing::warn!(severity = severity.as_str(), "{message}"),
            Severity::Info | Severity::Success => {
                tracing::debug!(severity = severity.as_str(), "{message}");
            }
        }
        let _ = self.tx.send(LogEvent { message, severity });
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(Severity::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.emit(Severity::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(Severity::Error, message);
    }
}

/// Consumer half.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<LogEvent>,
}

impl EventStream {
    /// Waits for the next event. Returns `None` once all sinks are gone.
    pub async fn next(&mut self) -> Option<LogEvent> {
        self.rx.recv().await
    }

    /// Takes every event that is already buffered without waiting.
    pub fn drain(&mut self) -> Vec<LogEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}
