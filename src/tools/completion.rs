//! Terminal outcome recorded by the agent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The `(success, reason)` pair stored by `complete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub success: bool,
    pub reason: String,
    pub recorded_at: DateTime<Utc>,
}

/// Holds at most one completion record; later writes replace earlier ones.
///
/// Recording an outcome never stops anything by itself. The caller decides
/// when to end its loop.
///
/// Outside this crate the signal is read-only: it changes through
/// `Tools::complete` and `ToolSession::begin_task`.
///
/// ```compile_fail
/// let mut signal = droid_tools::CompletionSignal::new();
/// signal.reset();
/// ```
///
/// ```compile_fail
/// let mut signal = droid_tools::CompletionSignal::new();
/// signal.record(true, "done");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CompletionSignal {
    record: Option<CompletionRecord>,
}

impl CompletionSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an outcome. Always returns `true`.
    pub(crate) fn record(&mut self, success: bool, reason: impl Into<String>) -> bool {
        self.record = Some(CompletionRecord {
            success,
            reason: reason.into(),
            recorded_at: Utc::now(),
        });
        true
    }

    /// The current record, if any.
    pub fn get(&self) -> Option<&CompletionRecord> {
        self.record.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.record.is_some()
    }

    /// Clear the record before starting a new task.
    pub(crate) fn reset(&mut self) {
        self.record = None;
    }
}
