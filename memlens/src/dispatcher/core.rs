//! Dispatcher core: construction, submission, cancellation, drain barrier.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::artifact::Artifact;
use crate::catalog::{CommandCatalog, CommandSpec};
use crate::config::DEFAULT_WORKERS;
use crate::parser::ParserRegistry;
use crate::runner::CommandRunner;
use crate::store::ResultStore;

use super::events::{EventSink, NullEventSink};
use super::handle::JobHandle;
use super::job::{DuplicateKind, JobId, JobKey, JobState, SubmitError};
use super::worker::{worker_loop, InFlightJob, QueuedJob, WorkerContext};

/// Configuration for the job dispatcher.
#[derive(Clone, Debug)]
pub struct DispatcherConfig {
    /// Number of concurrent job workers. Values below 1 are clamped to 1.
    pub workers: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
        }
    }
}

/// The analysis job engine.
///
/// Owns the worker pool, the in-flight key set, and the result store.
/// Submissions are validated synchronously; everything else happens on the
/// pool and re-enters the caller through [`EventSink`] callbacks.
pub struct JobDispatcher {
    catalog: Arc<RwLock<CommandCatalog>>,
    store: Arc<ResultStore>,
    events: Arc<dyn EventSink>,
    queue_tx: mpsc::UnboundedSender<QueuedJob>,
    in_flight: Arc<Mutex<HashMap<JobKey, InFlightJob>>>,
    outstanding_tx: Arc<watch::Sender<usize>>,
    outstanding_rx: watch::Receiver<usize>,
    shutdown: CancellationToken,
}

impl JobDispatcher {
    /// Creates a dispatcher with a fresh result store, the built-in parser
    /// schemas, and no event sink.
    ///
    /// Must be called within a Tokio runtime: the worker pool is spawned
    /// immediately.
    pub fn new(
        catalog: CommandCatalog,
        runner: Arc<dyn CommandRunner>,
        config: DispatcherConfig,
    ) -> Self {
        Self::with_events(catalog, runner, Arc::new(NullEventSink), config)
    }

    /// Creates a dispatcher with an event sink for the presentation layer.
    pub fn with_events(
        catalog: CommandCatalog,
        runner: Arc<dyn CommandRunner>,
        events: Arc<dyn EventSink>,
        config: DispatcherConfig,
    ) -> Self {
        Self::with_components(
            catalog,
            runner,
            Arc::new(ParserRegistry::with_builtins()),
            Arc::new(ResultStore::new()),
            events,
            config,
        )
    }

    /// Creates a dispatcher from explicit components.
    pub fn with_components(
        catalog: CommandCatalog,
        runner: Arc<dyn CommandRunner>,
        parsers: Arc<ParserRegistry>,
        store: Arc<ResultStore>,
        events: Arc<dyn EventSink>,
        config: DispatcherConfig,
    ) -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (outstanding_tx, outstanding_rx) = watch::channel(0usize);
        let outstanding_tx = Arc::new(outstanding_tx);
        let in_flight = Arc::new(Mutex::new(HashMap::new()));
        let shutdown = CancellationToken::new();

        let ctx = Arc::new(WorkerContext {
            runner,
            parsers,
            store: Arc::clone(&store),
            events: Arc::clone(&events),
            in_flight: Arc::clone(&in_flight),
            outstanding_tx: Arc::clone(&outstanding_tx),
            shutdown: shutdown.clone(),
        });

        let queue_rx = Arc::new(tokio::sync::Mutex::new(queue_rx));
        let workers = config.workers.max(1);
        for worker in 0..workers {
            tokio::spawn(worker_loop(
                worker,
                Arc::clone(&ctx),
                Arc::clone(&queue_rx),
            ));
        }
        info!(workers, "Job dispatcher started");

        Self {
            catalog: Arc::new(RwLock::new(catalog)),
            store,
            events,
            queue_tx,
            in_flight,
            outstanding_tx,
            outstanding_rx,
            shutdown,
        }
    }

    /// Submits a job for the given artifact and command.
    ///
    /// Rejected synchronously, before any spawn, when no artifact is
    /// selected, the command name is empty, or the parameter-inclusive key
    /// is already queued/running or already resolved in the result store.
    /// The duplicate rejection carries the existing key so the caller can
    /// re-surface that result instead of re-running it.
    pub fn submit(
        &self,
        artifact: Option<&Artifact>,
        spec: &CommandSpec,
        params: &str,
    ) -> Result<JobHandle, SubmitError> {
        let artifact = artifact.ok_or(SubmitError::NoArtifact)?;
        let command = spec.command.trim();
        if command.is_empty() {
            return Err(SubmitError::EmptyCommand);
        }

        let key = JobKey::new(artifact.display_name(), command, params);
        let id = JobId::auto();
        // Child of the shutdown token so shutdown cancels every job.
        let cancel = self.shutdown.child_token();
        let (status_tx, status_rx) = watch::channel(JobState::Queued);

        {
            let mut in_flight = self.in_flight.lock().expect("in-flight lock poisoned");
            if in_flight.contains_key(&key) {
                return Err(SubmitError::Duplicate {
                    key,
                    kind: DuplicateKind::Running,
                });
            }
            if self.store.contains(&key) {
                return Err(SubmitError::Duplicate {
                    key,
                    kind: DuplicateKind::Resolved,
                });
            }
            in_flight.insert(
                key.clone(),
                InFlightJob {
                    id: id.clone(),
                    cancel: cancel.clone(),
                },
            );
        }
        self.outstanding_tx.send_modify(|n| *n += 1);

        debug!(job_id = %id, key = %key, "Job queued");
        self.queue_tx
            .send(QueuedJob {
                id: id.clone(),
                key: key.clone(),
                artifact_path: artifact.path().to_path_buf(),
                status_tx,
                cancel: cancel.clone(),
            })
            .expect("worker queue closed");

        Ok(JobHandle::new(id, key, status_rx, cancel))
    }

    /// Requests best-effort cancellation of the job with the given ID.
    ///
    /// Returns false if no queued or running job has that ID.
    pub fn cancel(&self, id: &JobId) -> bool {
        let in_flight = self.in_flight.lock().expect("in-flight lock poisoned");
        for job in in_flight.values() {
            if &job.id == id {
                info!(job_id = %id, "Cancelling job");
                job.cancel.cancel();
                return true;
            }
        }
        false
    }

    /// Drain barrier: resolves once every submitted job has reached a
    /// terminal state and fired its completion callback.
    pub async fn wait_idle(&self) {
        let mut rx = self.outstanding_rx.clone();
        // Sender lives in self, so wait_for can only fail after drop.
        let _ = rx.wait_for(|outstanding| *outstanding == 0).await;
    }

    /// Stops the worker pool and cancels every in-flight job.
    pub fn shutdown(&self) {
        info!("Job dispatcher shutting down");
        self.shutdown.cancel();
    }

    /// Returns the shared result store.
    pub fn store(&self) -> Arc<ResultStore> {
        Arc::clone(&self.store)
    }

    /// Returns the injected command catalog.
    pub fn catalog(&self) -> Arc<RwLock<CommandCatalog>> {
        Arc::clone(&self.catalog)
    }

    /// Returns the event sink shared with the export packager.
    pub fn events(&self) -> Arc<dyn EventSink> {
        Arc::clone(&self.events)
    }
}

impl Drop for JobDispatcher {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
