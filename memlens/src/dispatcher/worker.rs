//! Worker pool internals: queue consumption and the per-job run path.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::parser::ParserRegistry;
use crate::runner::{CommandRunner, RunError, RunRequest};
use crate::store::{CommandResult, ResultStore};

use super::events::EventSink;
use super::job::{JobId, JobKey, JobOutcome, JobState};

/// A queued or running job, tracked for duplicate rejection and cancel.
pub(super) struct InFlightJob {
    pub id: JobId,
    pub cancel: CancellationToken,
}

/// A job handed from `submit()` to the worker pool.
pub(super) struct QueuedJob {
    pub id: JobId,
    pub key: JobKey,
    pub artifact_path: PathBuf,
    pub status_tx: watch::Sender<JobState>,
    pub cancel: CancellationToken,
}

/// State shared by every worker.
pub(super) struct WorkerContext {
    pub runner: Arc<dyn CommandRunner>,
    pub parsers: Arc<ParserRegistry>,
    pub store: Arc<ResultStore>,
    pub events: Arc<dyn EventSink>,
    pub in_flight: Arc<Mutex<HashMap<JobKey, InFlightJob>>>,
    pub outstanding_tx: Arc<watch::Sender<usize>>,
    pub shutdown: CancellationToken,
}

/// One worker: pull the next job off the shared queue, run it, repeat.
///
/// The queue receiver is shared behind an async mutex; a worker holds the
/// lock only while idle-waiting for a job, never while running one, so the
/// pool executes up to `workers` jobs concurrently.
pub(super) async fn worker_loop(
    worker: usize,
    ctx: Arc<WorkerContext>,
    queue: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<QueuedJob>>>,
) {
    debug!(worker, "Worker started");
    loop {
        let next = async { queue.lock().await.recv().await };
        let job = tokio::select! {
            _ = ctx.shutdown.cancelled() => break,
            job = next => match job {
                Some(job) => job,
                None => break,
            },
        };
        run_job(&ctx, job).await;
    }
    debug!(worker, "Worker stopped");
}

/// Runs one job to its terminal state and fires the completion callback.
async fn run_job(ctx: &WorkerContext, job: QueuedJob) {
    let QueuedJob {
        id,
        key,
        artifact_path,
        status_tx,
        cancel,
    } = job;

    let outcome = if cancel.is_cancelled() {
        debug!(job_id = %id, key = %key, "Job cancelled before start");
        JobOutcome::Cancelled
    } else {
        status_tx.send_replace(JobState::Running);
        ctx.events.on_job_started(&key);
        info!(job_id = %id, key = %key, "Job running");

        let request = RunRequest {
            artifact: artifact_path,
            command: key.command.clone(),
            params: key.params.clone(),
        };
        match ctx.runner.run(&request, cancel.clone()).await {
            Ok(output) => {
                let raw: Arc<str> = Arc::from(output);
                let parsed = ctx.parsers.parse(&key.command, &raw);
                ctx.store
                    .put(CommandResult::new(key.clone(), raw.clone(), parsed));
                JobOutcome::Completed { output: raw }
            }
            Err(RunError::Cancelled) => JobOutcome::Cancelled,
            Err(error) => {
                warn!(job_id = %id, key = %key, error = %error, "Job failed");
                JobOutcome::Failed { error }
            }
        }
    };

    status_tx.send_replace(outcome.state());
    ctx.in_flight
        .lock()
        .expect("in-flight lock poisoned")
        .remove(&key);

    // Exactly one completion callback per job. The store write happens
    // first so a completion callback always observes its own result.
    ctx.events.on_job_completed(&key, &outcome);
    info!(job_id = %id, key = %key, state = ?outcome.state(), "Job finished");

    ctx.outstanding_tx.send_modify(|n| *n = n.saturating_sub(1));
}
