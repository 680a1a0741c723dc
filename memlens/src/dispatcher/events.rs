//! Presentation-facing engine callbacks.
//!
//! The engine emits events through a sink abstraction and never mutates
//! display state directly - the "emit, don't present" pattern. A GUI wires
//! a sink that updates widgets, the CLI wires one that prints, tests wire
//! one that records.

use crate::export::{ExportError, ExportReport};

use super::job::{JobKey, JobOutcome};

/// Callbacks consumed by the presentation layer.
///
/// Implementations must be cheap and non-blocking: callbacks fire on worker
/// tasks and on the export task.
pub trait EventSink: Send + Sync {
    /// A job left the queue and its tool process is starting.
    fn on_job_started(&self, key: &JobKey) {
        let _ = key;
    }

    /// A job reached a terminal state. Fires exactly once per job; for
    /// completed jobs the result store already holds the entry.
    fn on_job_completed(&self, key: &JobKey, outcome: &JobOutcome) {
        let _ = (key, outcome);
    }

    /// An export finished, successfully or not.
    fn on_export_completed(&self, result: &Result<ExportReport, ExportError>) {
        let _ = result;
    }
}

/// Sink that discards all events.
pub struct NullEventSink;

impl EventSink for NullEventSink {}

/// Sink that logs every event via `tracing`.
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn on_job_started(&self, key: &JobKey) {
        tracing::info!(key = %key, "Job started");
    }

    fn on_job_completed(&self, key: &JobKey, outcome: &JobOutcome) {
        match outcome {
            JobOutcome::Completed { output } => {
                tracing::info!(key = %key, bytes = output.len(), "Job completed");
            }
            JobOutcome::Failed { error } => {
                tracing::warn!(key = %key, error = %error, "Job failed");
            }
            JobOutcome::Cancelled => {
                tracing::info!(key = %key, "Job cancelled");
            }
        }
    }

    fn on_export_completed(&self, result: &Result<ExportReport, ExportError>) {
        match result {
            Ok(report) => {
                tracing::info!(
                    archive = %report.archive.display(),
                    warnings = report.warnings.len(),
                    "Export completed"
                );
            }
            Err(error) => {
                tracing::warn!(error = %error, "Export failed");
            }
        }
    }
}
