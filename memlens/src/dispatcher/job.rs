//! Job identity, lifecycle states, and submission errors.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::runner::RunError;

/// Global counter for generating unique job IDs.
static JOB_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for one scheduled job.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct JobId(String);

impl JobId {
    /// Creates a unique auto-generated job ID (`job-{counter}`).
    pub fn auto() -> Self {
        let counter = JOB_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("job-{counter}"))
    }

    /// Returns the string value of this job ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JobId({})", self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The dedupe identity of a job: artifact display name, command name, and
/// parameters.
///
/// The parameter-inclusive triple is the conservative key choice: the same
/// command with different parameters is a distinct job and a distinct
/// result entry. The in-flight set and the result store share this type, so
/// single-flight-per-key holds structurally.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct JobKey {
    /// Artifact display name.
    pub artifact: String,
    /// Command name.
    pub command: String,
    /// Normalized (trimmed) parameter string; empty when none.
    pub params: String,
}

impl JobKey {
    /// Creates a key, trimming the parameter string.
    pub fn new(
        artifact: impl Into<String>,
        command: impl Into<String>,
        params: impl AsRef<str>,
    ) -> Self {
        Self {
            artifact: artifact.into(),
            command: command.into(),
            params: params.as_ref().trim().to_string(),
        }
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            write!(f, "{}/{}", self.artifact, self.command)
        } else {
            write!(f, "{}/{} {}", self.artifact, self.command, self.params)
        }
    }
}

/// Job execution status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JobState {
    /// Waiting for a worker.
    #[default]
    Queued,

    /// The external tool is running.
    Running,

    /// Finished with output (stderr, if any, appended to the text).
    Completed,

    /// The tool could not be executed.
    Failed,

    /// Cancelled before completion.
    Cancelled,
}

impl JobState {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Terminal outcome delivered through the completion callback.
#[derive(Clone, Debug)]
pub enum JobOutcome {
    /// The run produced output, now stored in the result store.
    Completed {
        /// The assembled output text.
        output: Arc<str>,
    },
    /// The tool could not be executed; no result was stored.
    Failed {
        /// The execution error.
        error: RunError,
    },
    /// The job was cancelled; no result was stored.
    Cancelled,
}

impl JobOutcome {
    /// The state this outcome corresponds to.
    pub fn state(&self) -> JobState {
        match self {
            Self::Completed { .. } => JobState::Completed,
            Self::Failed { .. } => JobState::Failed,
            Self::Cancelled => JobState::Cancelled,
        }
    }
}

/// Why a duplicate submission was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DuplicateKind {
    /// A job for the key is queued or running.
    Running,
    /// The key already has an entry in the result store.
    Resolved,
}

impl fmt::Display for DuplicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Resolved => write!(f, "resolved"),
        }
    }
}

/// Errors rejected synchronously at submission, before any spawn.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// No evidence artifact is selected.
    #[error("no evidence artifact is selected")]
    NoArtifact,

    /// The command name is empty.
    #[error("no command selected")]
    EmptyCommand,

    /// The key is already running or already resolved. Carries the existing
    /// key so the caller can re-surface that result instead of re-running.
    #[error("job for {key} is already {kind}")]
    Duplicate {
        /// The existing job's key.
        key: JobKey,
        /// Whether the key is in flight or already resolved.
        kind: DuplicateKind,
    },
}
