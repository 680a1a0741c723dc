//! External analysis tool invocation.
//!
//! The tool contract is `<entry> -f <artifactPath> <commandName> <params...>`
//! with stdout and stderr captured separately and decoded tolerantly. The
//! [`CommandRunner`] trait is the dispatcher's seam: [`ToolRunner`] is the
//! production implementation, tests substitute fakes.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Placeholder text when the tool produced no stdout.
pub const NO_OUTPUT: &str = "No output received.";

/// Errors from a single tool run.
///
/// These cover failures to execute the tool at all; a run that produced
/// output - even a non-zero exit with stderr - completes with that output,
/// the stderr appended under an `Error:` banner.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RunError {
    /// The tool entry point does not exist.
    #[error("analysis tool not found at {path}")]
    ToolNotFound { path: PathBuf },

    /// The tool process could not be spawned.
    #[error("failed to spawn analysis tool: {0}")]
    Spawn(String),

    /// Reading the tool's output failed.
    #[error("failed reading tool output: {0}")]
    Io(String),

    /// The run was cancelled before the tool finished.
    #[error("run cancelled")]
    Cancelled,
}

/// One requested tool invocation.
#[derive(Clone, Debug)]
pub struct RunRequest {
    /// Evidence file passed via `-f`.
    pub artifact: PathBuf,
    /// Command name, passed verbatim.
    pub command: String,
    /// Extra parameters, whitespace-separated.
    pub params: String,
}

/// Seam between the dispatcher and the external tool.
pub trait CommandRunner: Send + Sync {
    /// Runs the tool once, returning the assembled output text.
    ///
    /// Implementations must honor `cancel` by terminating the underlying
    /// process and returning [`RunError::Cancelled`].
    fn run<'a>(
        &'a self,
        request: &'a RunRequest,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<String, RunError>> + Send + 'a>>;
}

/// Production runner spawning the configured tool entry point.
pub struct ToolRunner {
    entry: PathBuf,
}

impl ToolRunner {
    /// Creates a runner for the given tool entry point.
    pub fn new(entry: impl Into<PathBuf>) -> Self {
        Self {
            entry: entry.into(),
        }
    }

    /// Returns the configured entry point.
    pub fn entry(&self) -> &Path {
        &self.entry
    }
}

impl CommandRunner for ToolRunner {
    fn run<'a>(
        &'a self,
        request: &'a RunRequest,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<String, RunError>> + Send + 'a>> {
        Box::pin(async move {
            if !self.entry.is_file() {
                return Err(RunError::ToolNotFound {
                    path: self.entry.clone(),
                });
            }

            let mut cmd = Command::new(&self.entry);
            cmd.arg("-f")
                .arg(&request.artifact)
                .arg(&request.command)
                .args(request.params.split_whitespace())
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);

            debug!(
                entry = %self.entry.display(),
                artifact = %request.artifact.display(),
                command = %request.command,
                params = %request.params,
                "Spawning analysis tool"
            );

            let child = cmd.spawn().map_err(|e| RunError::Spawn(e.to_string()))?;

            // On cancellation the child future is dropped, which kills the
            // process via kill_on_drop.
            let output = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(command = %request.command, "Tool run cancelled");
                    return Err(RunError::Cancelled);
                }
                result = child.wait_with_output() => {
                    result.map_err(|e| RunError::Io(e.to_string()))?
                }
            };

            if !output.status.success() {
                warn!(
                    command = %request.command,
                    status = %output.status,
                    "Analysis tool exited with non-zero status"
                );
            }

            Ok(assemble_output(&output.stdout, &output.stderr))
        })
    }
}

/// Assembles the result text from captured stdout/stderr.
///
/// Empty stdout becomes a placeholder line; non-empty stderr is appended
/// under an `Error:` banner so it reaches the analyst alongside the data.
fn assemble_output(stdout: &[u8], stderr: &[u8]) -> String {
    let stdout = String::from_utf8_lossy(stdout);
    let stderr = String::from_utf8_lossy(stderr);

    let mut text = if stdout.trim().is_empty() {
        NO_OUTPUT.to_string()
    } else {
        stdout.into_owned()
    };
    if !stderr.trim().is_empty() {
        text.push_str("\nError:\n");
        text.push_str(&stderr);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_entry_is_a_typed_error() {
        let runner = ToolRunner::new("/definitely/not/here/vol.py");
        let request = RunRequest {
            artifact: PathBuf::from("/evidence/img.vmem"),
            command: "windows.pslist".to_string(),
            params: String::new(),
        };
        let result =
            block_on(runner.run(&request, CancellationToken::new()));
        assert!(matches!(result, Err(RunError::ToolNotFound { .. })));
    }

    #[test]
    fn output_assembly_rules() {
        assert_eq!(assemble_output(b"", b""), NO_OUTPUT);
        assert_eq!(assemble_output(b"rows\n", b""), "rows\n");
        assert_eq!(
            assemble_output(b"", b"boom\n"),
            format!("{NO_OUTPUT}\nError:\nboom\n")
        );
        assert_eq!(
            assemble_output(b"rows\n", b"boom\n"),
            "rows\n\nError:\nboom\n"
        );
    }

    #[test]
    fn invalid_bytes_decode_tolerantly() {
        let text = assemble_output(&[0x66, 0xff, 0x6f], b"");
        assert!(text.contains('f'));
        assert!(text.contains('o'));
    }

    /// Minimal block_on for tests that don't need a full runtime.
    fn block_on<F: Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("test runtime")
            .block_on(fut)
    }
}
