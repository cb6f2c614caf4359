//! Diagnostic sinks
//!
//! Extraction and analysis entry points take a `&dyn DiagnosticSink` instead of
//! logging to a process-wide logger. Hosts pick where the messages go.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Severity of a diagnostic message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiagnosticLevel {
    /// Detailed tracing of intermediate results
    Debug,
    /// Normal progress
    Info,
    /// Something the caller should look at
    Warn,
}

/// A recorded diagnostic message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    /// Severity
    pub level: DiagnosticLevel,
    /// Pipeline stage that produced the message (e.g. "intersect")
    pub stage: String,
    /// Message text
    pub message: String,
}

/// Receiver for diagnostics emitted by the pipeline
pub trait DiagnosticSink: Send + Sync {
    /// Handle one message
    fn emit(&self, level: DiagnosticLevel, stage: &str, message: &str);

    /// Convenience for debug messages
    fn debug(&self, stage: &str, message: &str) {
        self.emit(DiagnosticLevel::Debug, stage, message);
    }

    /// Convenience for info messages
    fn info(&self, stage: &str, message: &str) {
        self.emit(DiagnosticLevel::Info, stage, message);
    }

    /// Convenience for warnings
    fn warn(&self, stage: &str, message: &str) {
        self.emit(DiagnosticLevel::Warn, stage, message);
    }
}

/// Discards every message
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&self, _level: DiagnosticLevel, _stage: &str, _message: &str) {}
}

/// Forwards messages to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, level: DiagnosticLevel, stage: &str, message: &str) {
        match level {
            DiagnosticLevel::Debug => tracing::debug!(stage = stage, "{}", message),
            DiagnosticLevel::Info => tracing::info!(stage = stage, "{}", message),
            DiagnosticLevel::Warn => tracing::warn!(stage = stage, "{}", message),
        }
    }
}

/// Buffers messages in memory (tests, batch reports)
#[derive(Debug, Default)]
pub struct CollectingSink {
    records: Mutex<Vec<DiagnosticRecord>>,
}

impl CollectingSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far
    pub fn records(&self) -> Vec<DiagnosticRecord> {
        self.records.lock().clone()
    }

    /// Take the recorded messages, leaving the sink empty
    pub fn drain(&self) -> Vec<DiagnosticRecord> {
        std::mem::take(&mut *self.records.lock())
    }

    /// Number of messages at or above `level`
    pub fn count_at_least(&self, level: DiagnosticLevel) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|r| r.level >= level)
            .count()
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&self, level: DiagnosticLevel, stage: &str, message: &str) {
        self.records.lock().push(DiagnosticRecord {
            level,
            stage: stage.to_string(),
            message: message.to_string(),
        });
    }
}
