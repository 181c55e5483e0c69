//! The §6 "Log protocol": structured messages with severity, facility, an
//! integer code, a human-readable message and a best-effort source locator.
//!
//! The default sink forwards every message to `tracing`; a caller can also
//! register a callback on [`crate::World`] and both fire. A `Fatal` message
//! aborts the process once both sinks have run, per spec.

use crate::error::Locator;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facility {
    Uri,
    Node,
    Statement,
    Model,
    Storage,
    Hash,
    Parser,
    Serializer,
    Query,
    Digest,
    Other,
}

impl Facility {
    pub fn as_str(self) -> &'static str {
        match self {
            Facility::Uri => "uri",
            Facility::Node => "node",
            Facility::Statement => "statement",
            Facility::Model => "model",
            Facility::Storage => "storage",
            Facility::Hash => "hash",
            Facility::Parser => "parser",
            Facility::Serializer => "serializer",
            Facility::Query => "query",
            Facility::Digest => "digest",
            Facility::Other => "other",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogMessage {
    pub severity: Severity,
    pub facility: Facility,
    pub code: i32,
    pub message: String,
    pub locator: Option<Locator>,
}

/// A user-supplied log handler, registered on a [`crate::World`].
pub trait LogHandler: Send + Sync {
    fn handle(&self, message: &LogMessage);
}

impl<F> LogHandler for F
where
    F: Fn(&LogMessage) + Send + Sync,
{
    fn handle(&self, message: &LogMessage) {
        self(message)
    }
}

/// The sink every module logs through: always forwards to `tracing`, and
/// additionally calls a user callback when one is registered.
#[derive(Default, Clone)]
pub struct LogSink {
    callback: Option<Arc<dyn LogHandler>>,
}

impl LogSink {
    pub fn set_handler(&mut self, handler: Arc<dyn LogHandler>) {
        self.callback = Some(handler);
    }

    pub fn emit(&self, message: LogMessage) {
        let locator = message
            .locator
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        match message.severity {
            Severity::Debug => {
                tracing::debug!(facility = message.facility.as_str(), code = message.code, locator = %locator, "{}", message.message)
            }
            Severity::Info => {
                tracing::info!(facility = message.facility.as_str(), code = message.code, locator = %locator, "{}", message.message)
            }
            Severity::Warn => {
                tracing::warn!(facility = message.facility.as_str(), code = message.code, locator = %locator, "{}", message.message)
            }
            Severity::Error | Severity::Fatal => {
                tracing::error!(facility = message.facility.as_str(), code = message.code, locator = %locator, "{}", message.message)
            }
        }
        if let Some(callback) = &self.callback {
            callback.handle(&message);
        }
        if message.severity == Severity::Fatal {
            std::process::abort();
        }
    }

    pub fn warn(&self, facility: Facility, code: i32, message: impl Into<String>) {
        self.emit(LogMessage {
            severity: Severity::Warn,
            facility,
            code,
            message: message.into(),
            locator: None,
        });
    }

    pub fn error(&self, facility: Facility, code: i32, message: impl Into<String>) {
        self.emit(LogMessage {
            severity: Severity::Error,
            facility,
            code,
            message: message.into(),
            locator: None,
        });
    }

    pub fn fatal(&self, facility: Facility, code: i32, message: impl Into<String>) -> ! {
        self.emit(LogMessage {
            severity: Severity::Fatal,
            facility,
            code,
            message: message.into(),
            locator: None,
        });
        unreachable!("fatal log messages abort the process")
    }
}
