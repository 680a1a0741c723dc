//! The export packager.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::artifact::Artifact;
use crate::dispatcher::EventSink;
use crate::store::{CommandResult, ResultStore};

use super::manifest::{ExportManifest, ManifestEntry};

/// Manifest file name at the archive root.
pub const MANIFEST_FILE: &str = "metadata.json";

/// User inclusion flags for an export.
#[derive(Clone, Copy, Debug)]
pub struct ExportOptions {
    /// Include a copy of the evidence artifact in the archive.
    pub include_artifact: bool,
    /// Include highlight metadata in the manifest.
    pub include_highlights: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_artifact: true,
            include_highlights: true,
        }
    }
}

/// Export failures, named by the failing step.
///
/// Staged files are left in place on failure so the analyst can inspect
/// what was produced.
#[derive(Debug, Error)]
pub enum ExportError {
    /// No command for the artifact produced output to export.
    #[error("nothing to export: no results for artifact '{0}'")]
    NoResults(String),

    /// The staging directory could not be created.
    #[error("failed to create staging directory {path}: {source}")]
    Staging { path: PathBuf, source: io::Error },

    /// A per-command output file could not be written.
    #[error("failed writing output file {path}: {source}")]
    StageOutput { path: PathBuf, source: io::Error },

    /// The manifest could not be serialized.
    #[error("failed encoding manifest: {source}")]
    EncodeManifest { source: serde_json::Error },

    /// The manifest file could not be written.
    #[error("failed writing manifest {path}: {source}")]
    WriteManifest { path: PathBuf, source: io::Error },

    /// The archive could not be built.
    #[error("failed building archive {path}: {source}")]
    Archive { path: PathBuf, source: ZipError },

    /// The blocking export task died.
    #[error("export task failed: {0}")]
    Task(String),
}

/// Outcome of a successful export.
#[derive(Clone, Debug)]
pub struct ExportReport {
    /// Path of the written archive.
    pub archive: PathBuf,
    /// Per-file warnings for entries skipped at archive time.
    pub warnings: Vec<String>,
}

/// Builds portable archives from the session's results.
pub struct ExportPackager {
    store: Arc<ResultStore>,
    events: Arc<dyn EventSink>,
}

impl ExportPackager {
    /// Creates a packager over the shared result store.
    pub fn new(store: Arc<ResultStore>, events: Arc<dyn EventSink>) -> Self {
        Self { store, events }
    }

    /// Exports the artifact's results to a zip at `destination`.
    ///
    /// A `None` destination is a cancelled path selection: a no-op that
    /// fires no callback and returns `None`. Otherwise the packaging runs
    /// on a blocking task, the completion callback fires with the result,
    /// and the result is also returned for direct callers.
    pub async fn export(
        &self,
        artifact: &Artifact,
        destination: Option<PathBuf>,
        options: ExportOptions,
    ) -> Option<Result<ExportReport, ExportError>> {
        let Some(destination) = destination else {
            debug!("Export destination selection cancelled");
            return None;
        };

        let results = self.store.results_for_artifact(&artifact.display_name());
        let artifact_name = artifact.display_name();
        let artifact_path = artifact.path().to_path_buf();

        let result = tokio::task::spawn_blocking(move || {
            build_package(results, artifact_name, artifact_path, destination, options)
        })
        .await
        .unwrap_or_else(|e| Err(ExportError::Task(e.to_string())));

        self.events.on_export_completed(&result);
        Some(result)
    }
}

/// Derives a filesystem-safe file name from a command identity.
///
/// Alphanumerics, `-` and `_` pass through; everything else (the `.` in
/// `windows.pslist` included) becomes `_`.
fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Output file name for one result; parameters are folded in so two runs of
/// the same command with different parameters stay distinct.
fn output_file_name(result: &CommandResult) -> String {
    let base = if result.key.params.is_empty() {
        sanitize_file_name(&result.key.command)
    } else {
        sanitize_file_name(&format!("{}_{}", result.key.command, result.key.params))
    };
    format!("{base}.txt")
}

/// Steps 1-5 of the export: stage, manifest, bundle.
fn build_package(
    mut results: Vec<CommandResult>,
    artifact_name: String,
    artifact_path: PathBuf,
    destination: PathBuf,
    options: ExportOptions,
) -> Result<ExportReport, ExportError> {
    // The manifest only references commands with non-empty output.
    results.retain(|r| !r.raw.trim().is_empty());
    if results.is_empty() {
        return Err(ExportError::NoResults(artifact_name));
    }

    let stem = destination
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    let staging = destination
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{stem}_staging"));
    fs::create_dir_all(&staging).map_err(|source| ExportError::Staging {
        path: staging.clone(),
        source,
    })?;
    debug!(staging = %staging.display(), "Staging export files");

    // Step 1: write each included result to a per-command file.
    let mut staged = Vec::with_capacity(results.len());
    for result in &results {
        let file_name = output_file_name(result);
        let path = staging.join(&file_name);
        fs::write(&path, result.raw.as_bytes()).map_err(|source| ExportError::StageOutput {
            path: path.clone(),
            source,
        })?;
        staged.push((result, file_name, path));
    }

    // Steps 2-3: build and serialize the manifest.
    let manifest = ExportManifest {
        artifact: options.include_artifact.then(|| artifact_name.clone()),
        created_at: Utc::now(),
        commands: staged
            .iter()
            .map(|(result, file_name, _)| ManifestEntry {
                command: result.key.command.clone(),
                highlights: if options.include_highlights {
                    result.highlights.clone()
                } else {
                    Vec::new()
                },
                output_file: file_name.clone(),
            })
            .collect(),
    };
    let manifest_bytes = serde_json::to_vec_pretty(&manifest)
        .map_err(|source| ExportError::EncodeManifest { source })?;
    let manifest_path = staging.join(MANIFEST_FILE);
    fs::write(&manifest_path, &manifest_bytes).map_err(|source| ExportError::WriteManifest {
        path: manifest_path.clone(),
        source,
    })?;

    // Steps 4-5: bundle manifest + output files + optional artifact.
    let mut warnings = Vec::new();
    let archive_err = |source: ZipError| ExportError::Archive {
        path: destination.clone(),
        source,
    };

    let file = File::create(&destination).map_err(|e| archive_err(e.into()))?;
    let mut archive = ZipWriter::new(file);
    let zip_options =
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    archive
        .start_file(MANIFEST_FILE, zip_options)
        .map_err(archive_err)?;
    archive
        .write_all(&manifest_bytes)
        .map_err(|e| archive_err(e.into()))?;

    for (_, file_name, path) in &staged {
        // A staged file can vanish between staging and archiving; skip it
        // with a warning rather than aborting the whole export.
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Skipping missing output file");
                warnings.push(format!("skipped missing file {}", path.display()));
                continue;
            }
        };
        archive
            .start_file(file_name.as_str(), zip_options)
            .map_err(archive_err)?;
        archive.write_all(&bytes).map_err(|e| archive_err(e.into()))?;
    }

    if options.include_artifact {
        match File::open(&artifact_path) {
            Ok(mut artifact_file) => {
                archive
                    .start_file(artifact_name.as_str(), zip_options)
                    .map_err(archive_err)?;
                io::copy(&mut artifact_file, &mut archive)
                    .map_err(|e| archive_err(e.into()))?;
            }
            Err(err) => {
                warn!(path = %artifact_path.display(), error = %err, "Skipping missing artifact");
                warnings.push(format!(
                    "skipped missing artifact {}",
                    artifact_path.display()
                ));
            }
        }
    }

    archive.finish().map_err(archive_err)?;

    // Staged files are only kept for inspection when the export fails.
    if let Err(err) = fs::remove_dir_all(&staging) {
        warn!(staging = %staging.display(), error = %err, "Could not remove staging directory");
        warnings.push(format!(
            "staging directory left behind at {}",
            staging.display()
        ));
    }

    info!(
        archive = %destination.display(),
        commands = manifest.commands.len(),
        warnings = warnings.len(),
        "Export package written"
    );
    Ok(ExportReport {
        archive: destination,
        warnings,
    })
}
