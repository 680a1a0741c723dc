//! Export packaging: bundle a session's results into a portable archive.
//!
//! An export stages each included result to a per-command text file, writes
//! a `metadata.json` manifest describing the package, and bundles manifest,
//! output files, and (optionally) a copy of the evidence artifact into one
//! zip at the user-chosen path. Packaging runs on a blocking task off the
//! async runtime; completion is reported through
//! [`EventSink::on_export_completed`](crate::dispatcher::EventSink).

mod manifest;
mod packager;

pub use manifest::{ExportManifest, ManifestEntry};
pub use packager::{
    ExportError, ExportOptions, ExportPackager, ExportReport, MANIFEST_FILE,
};
