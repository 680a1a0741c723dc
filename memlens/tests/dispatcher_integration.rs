//! Integration tests for the analysis job engine.
//!
//! These tests verify the complete dispatch workflow including:
//! - Submission, validation, and duplicate rejection
//! - Worker pool execution and result storage
//! - Cancellation
//! - The drain barrier
//! - Exactly-once completion callbacks

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use memlens::artifact::Artifact;
use memlens::catalog::{CommandCatalog, CommandSpec};
use memlens::dispatcher::{
    DispatcherConfig, DuplicateKind, EventSink, JobDispatcher, JobKey, JobOutcome, JobState,
    SubmitError,
};
use memlens::runner::{CommandRunner, RunError, RunRequest, ToolRunner};

// =============================================================================
// Test Helpers
// =============================================================================

const PSLIST_OUTPUT: &str = "Volatility 3 Framework\nProgress: 100.00 PDB scanning finished\n\nPID PPID ImageFileName Offset Threads Handles SessionId Wow64 CreateTime ExitTime FileOutput\n4 0 System 0xfa80 120 500 N/A False 2021-01-01 N/A Disabled\n364 4 smss.exe 0xfa93 3 52 N/A False 2021-01-01 N/A Disabled\n";

/// Runner that counts invocations and returns a fixed output after an
/// optional cancellable delay.
struct RecordingRunner {
    calls: AtomicUsize,
    delay: Duration,
    output: String,
}

impl RecordingRunner {
    fn new(output: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            output: output.to_string(),
        }
    }

    fn with_delay(output: &str, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new(output)
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CommandRunner for RecordingRunner {
    fn run<'a>(
        &'a self,
        _request: &'a RunRequest,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<String, RunError>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(RunError::Cancelled),
                    _ = tokio::time::sleep(self.delay) => {}
                }
            }
            Ok(self.output.clone())
        })
    }
}

/// Sink recording every callback for assertion.
#[derive(Default)]
struct RecordingSink {
    started: Mutex<Vec<JobKey>>,
    completed: Mutex<Vec<(JobKey, JobState)>>,
}

impl RecordingSink {
    fn completed(&self) -> Vec<(JobKey, JobState)> {
        self.completed.lock().unwrap().clone()
    }

    fn started_count(&self) -> usize {
        self.started.lock().unwrap().len()
    }
}

impl EventSink for RecordingSink {
    fn on_job_started(&self, key: &JobKey) {
        self.started.lock().unwrap().push(key.clone());
    }

    fn on_job_completed(&self, key: &JobKey, outcome: &JobOutcome) {
        self.completed
            .lock()
            .unwrap()
            .push((key.clone(), outcome.state()));
    }
}

fn dispatcher_with(
    runner: Arc<dyn CommandRunner>,
    sink: Arc<RecordingSink>,
    workers: usize,
) -> JobDispatcher {
    JobDispatcher::with_events(
        CommandCatalog::builtin("commands.json"),
        runner,
        sink,
        DispatcherConfig { workers },
    )
}

fn artifact() -> Artifact {
    Artifact::new("/evidence/img.vmem")
}

fn pslist() -> CommandSpec {
    CommandSpec::builtin("windows.pslist", "List processes")
}

async fn drained(dispatcher: &JobDispatcher) {
    tokio::time::timeout(Duration::from_secs(5), dispatcher.wait_idle())
        .await
        .expect("dispatcher did not drain in time");
}

// =============================================================================
// Integration Tests
// =============================================================================

#[tokio::test]
async fn completed_job_stores_parsed_result() {
    let runner = Arc::new(RecordingRunner::new(PSLIST_OUTPUT));
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = dispatcher_with(runner, Arc::clone(&sink), 4);

    let artifact = artifact();
    let mut handle = dispatcher
        .submit(Some(&artifact), &pslist(), "")
        .expect("submission should be accepted");

    let state = tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .expect("job timed out");
    assert_eq!(state, JobState::Completed);

    let result = dispatcher
        .store()
        .get(handle.key())
        .expect("completed job must store a result");
    let table = result.parsed.table().expect("pslist parses as a table");
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0][2], "System");

    drained(&dispatcher).await;
    assert_eq!(sink.started_count(), 1);
    assert_eq!(sink.completed().len(), 1);
}

#[tokio::test]
async fn scenario_a_missing_tool_fails_without_store_entry() {
    // Real runner pointed at a nonexistent entry point.
    let runner = Arc::new(ToolRunner::new("/definitely/not/installed/vol.py"));
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = dispatcher_with(runner, Arc::clone(&sink), 2);

    let artifact = artifact();
    let mut handle = dispatcher
        .submit(Some(&artifact), &pslist(), "")
        .expect("submission should be accepted");

    let state = tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .expect("job timed out");
    assert_eq!(state, JobState::Failed);
    assert!(dispatcher.store().is_empty());

    drained(&dispatcher).await;
    let completed = sink.completed();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].1, JobState::Failed);
}

#[tokio::test]
async fn scenario_b_duplicate_submit_runs_tool_once() {
    let runner = Arc::new(RecordingRunner::with_delay(
        PSLIST_OUTPUT,
        Duration::from_millis(200),
    ));
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = dispatcher_with(Arc::clone(&runner) as _, sink, 4);

    let artifact = artifact();
    let first = dispatcher
        .submit(Some(&artifact), &pslist(), "")
        .expect("first submission should be accepted");

    let err = dispatcher
        .submit(Some(&artifact), &pslist(), "")
        .expect_err("second submission must be rejected");
    match err {
        SubmitError::Duplicate { key, kind } => {
            assert_eq!(&key, first.key());
            assert_eq!(kind, DuplicateKind::Running);
        }
        other => panic!("expected duplicate rejection, got {other:?}"),
    }

    drained(&dispatcher).await;
    assert_eq!(runner.calls(), 1);

    // The key is now resolved in the store; a resubmit is still rejected,
    // carrying the existing key so the caller can re-surface the result.
    let err = dispatcher
        .submit(Some(&artifact), &pslist(), "")
        .expect_err("resolved key must be rejected");
    assert!(matches!(
        err,
        SubmitError::Duplicate {
            kind: DuplicateKind::Resolved,
            ..
        }
    ));
    assert_eq!(runner.calls(), 1);
}

#[tokio::test]
async fn distinct_parameters_are_distinct_jobs() {
    let runner = Arc::new(RecordingRunner::new("output\n"));
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = dispatcher_with(Arc::clone(&runner) as _, sink, 4);

    let artifact = artifact();
    let spec = CommandSpec::builtin("windows.memmap", "Memory map");
    dispatcher
        .submit(Some(&artifact), &spec, "--pid 4")
        .expect("first parameter set accepted");
    dispatcher
        .submit(Some(&artifact), &spec, "--pid 8")
        .expect("second parameter set accepted");

    drained(&dispatcher).await;
    assert_eq!(runner.calls(), 2);
    assert_eq!(dispatcher.store().len(), 2);
}

#[tokio::test]
async fn validation_rejects_before_any_spawn() {
    let runner = Arc::new(RecordingRunner::new("output\n"));
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = dispatcher_with(Arc::clone(&runner) as _, sink, 1);

    assert!(matches!(
        dispatcher.submit(None, &pslist(), ""),
        Err(SubmitError::NoArtifact)
    ));

    let artifact = artifact();
    let empty = CommandSpec::builtin("  ", "");
    assert!(matches!(
        dispatcher.submit(Some(&artifact), &empty, ""),
        Err(SubmitError::EmptyCommand)
    ));

    assert_eq!(runner.calls(), 0);
}

#[tokio::test]
async fn cancel_terminates_job_without_store_entry() {
    let runner = Arc::new(RecordingRunner::with_delay(
        PSLIST_OUTPUT,
        Duration::from_secs(30),
    ));
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = dispatcher_with(runner, Arc::clone(&sink), 2);

    let artifact = artifact();
    let mut handle = dispatcher
        .submit(Some(&artifact), &pslist(), "")
        .expect("submission should be accepted");

    // Give the worker a moment to start the job, then cancel by ID.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(dispatcher.cancel(handle.id()));

    let state = tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .expect("cancelled job timed out");
    assert_eq!(state, JobState::Cancelled);
    assert!(dispatcher.store().is_empty());

    drained(&dispatcher).await;
    let completed = sink.completed();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].1, JobState::Cancelled);

    // No implicit retry: a fresh submit for the key is accepted again.
    dispatcher
        .submit(Some(&artifact), &pslist(), "")
        .expect("fresh submit after cancellation is accepted");
}

#[tokio::test]
async fn cancel_unknown_id_is_a_no_op() {
    let runner = Arc::new(RecordingRunner::new("output\n"));
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = dispatcher_with(runner, sink, 1);

    let artifact = artifact();
    let mut handle = dispatcher
        .submit(Some(&artifact), &pslist(), "")
        .expect("submission should be accepted");
    let _ = tokio::time::timeout(Duration::from_secs(5), handle.wait()).await;

    // The job already drained from the in-flight set.
    drained(&dispatcher).await;
    assert!(!dispatcher.cancel(handle.id()));
}

#[tokio::test]
async fn wait_idle_observes_full_batch_drain() {
    let runner = Arc::new(RecordingRunner::with_delay(
        "output\n",
        Duration::from_millis(50),
    ));
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = dispatcher_with(Arc::clone(&runner) as _, Arc::clone(&sink), 4);

    let artifact = artifact();
    let commands = [
        "windows.pslist",
        "windows.psscan",
        "windows.netscan",
        "windows.dlllist",
        "windows.cmdline",
        "windows.malfind",
        "windows.handles",
        "windows.filescan",
    ];
    for name in commands {
        dispatcher
            .submit(Some(&artifact), &CommandSpec::builtin(name, ""), "")
            .expect("submission should be accepted");
    }

    drained(&dispatcher).await;

    // Every job completed, stored its result, and fired exactly one
    // completion callback before the barrier released.
    assert_eq!(runner.calls(), commands.len());
    assert_eq!(dispatcher.store().len(), commands.len());
    assert_eq!(sink.completed().len(), commands.len());
}

#[tokio::test]
async fn completion_callbacks_interleave_across_keys() {
    let runner = Arc::new(RecordingRunner::new("output\n"));
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = dispatcher_with(runner, Arc::clone(&sink), 4);

    let first = Artifact::new("/evidence/one.vmem");
    let second = Artifact::new("/evidence/two.vmem");
    dispatcher
        .submit(Some(&first), &pslist(), "")
        .expect("submission should be accepted");
    dispatcher
        .submit(Some(&second), &pslist(), "")
        .expect("submission should be accepted");

    drained(&dispatcher).await;

    let store = dispatcher.store();
    assert_eq!(store.results_for_artifact("one.vmem").len(), 1);
    assert_eq!(store.results_for_artifact("two.vmem").len(), 1);
    assert_eq!(sink.completed().len(), 2);
}
