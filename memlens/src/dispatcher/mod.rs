//! The analysis job engine.
//!
//! The dispatcher schedules analysis commands against loaded artifacts on a
//! fixed-size worker pool. Submitters are never blocked: a submission is
//! validated synchronously, handed to the pool, and completion re-enters the
//! caller only through the [`EventSink`] callbacks.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      JobDispatcher                        │
//! │  submit() -> JobHandle | SubmitError                      │
//! │  cancel(), wait_idle(), shutdown()                        │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌────────────┐  ┌──────────────┐  ┌──────────────────┐  │
//! │  │ In-flight  │  │ Worker pool  │  │ EventSink        │  │
//! │  │ key set    │  │ (default 4)  │  │ callbacks        │  │
//! │  └────────────┘  └──────────────┘  └──────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//!          │                 │
//!          │                 ▼
//!          │          CommandRunner ──► ParserRegistry ──► ResultStore
//! ```
//!
//! # Core Concepts
//!
//! - **Job**: one scheduled run of (artifact, command, parameters). The
//!   parameter-inclusive triple is the job's [`JobKey`]; at most one job per
//!   key is in flight, and a key already resolved in the result store is
//!   rejected with the existing key so the caller can re-surface it.
//!
//! - **Lifecycle**: Queued → Running → {Completed, Failed, Cancelled}.
//!   Terminal states are final; exactly one completion callback fires per
//!   job. A retry is a fresh submit, never implicit.
//!
//! - **Cancellation**: [`JobDispatcher::cancel`] signals the job's token;
//!   the runner terminates the external process and the job completes as
//!   Cancelled.
//!
//! - **Drain barrier**: [`JobDispatcher::wait_idle`] resolves once every
//!   submitted job has reached a terminal state.

mod core;
mod events;
mod handle;
mod job;
mod worker;

pub use self::core::{DispatcherConfig, JobDispatcher};
pub use events::{EventSink, NullEventSink, TracingEventSink};
pub use handle::JobHandle;
pub use job::{DuplicateKind, JobId, JobKey, JobOutcome, JobState, SubmitError};
