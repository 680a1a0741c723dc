//! Job handle for status queries and cancellation.
//!
//! A [`JobHandle`] is returned by a successful submission. It never blocks
//! the submitter: `status()` is a snapshot read, `wait()` is an explicit
//! opt-in await on the watch channel the worker updates.

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::job::{JobId, JobKey, JobState};

/// Handle to a submitted job.
///
/// Cloneable; all clones refer to the same underlying job.
#[derive(Clone)]
pub struct JobHandle {
    id: JobId,
    key: JobKey,
    status_rx: watch::Receiver<JobState>,
    cancel: CancellationToken,
}

impl JobHandle {
    pub(crate) fn new(
        id: JobId,
        key: JobKey,
        status_rx: watch::Receiver<JobState>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            key,
            status_rx,
            cancel,
        }
    }

    /// Returns the job's unique identifier.
    pub fn id(&self) -> &JobId {
        &self.id
    }

    /// Returns the job's dedupe key.
    pub fn key(&self) -> &JobKey {
        &self.key
    }

    /// Returns the most recent job state without waiting.
    pub fn status(&self) -> JobState {
        *self.status_rx.borrow()
    }

    /// Waits until the job reaches a terminal state and returns it.
    pub async fn wait(&mut self) -> JobState {
        loop {
            let state = *self.status_rx.borrow();
            if state.is_terminal() {
                return state;
            }
            if self.status_rx.changed().await.is_err() {
                // Sender dropped - the last published state is final.
                return *self.status_rx.borrow();
            }
        }
    }

    /// Requests best-effort cancellation of this job.
    ///
    /// Queued jobs finish as Cancelled without starting; running jobs have
    /// their tool process terminated. The completion callback still fires
    /// exactly once.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("status", &self.status())
            .finish()
    }
}
