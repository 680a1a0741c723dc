//! The export manifest document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::annotate::Highlight;

/// One manifest record per included command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Command name.
    pub command: String,
    /// Highlights over the command's output; empty when highlight metadata
    /// was excluded from the export.
    pub highlights: Vec<Highlight>,
    /// Name of the output text file inside the archive.
    pub output_file: String,
}

/// The structured description of an export archive's contents.
///
/// Serialized as `metadata.json` at the archive root. Built transiently
/// during export; references only commands with non-empty output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportManifest {
    /// Display name of the exported artifact, when its copy is included.
    pub artifact: Option<String>,
    /// Package creation time.
    pub created_at: DateTime<Utc>,
    /// One record per included command.
    pub commands: Vec<ManifestEntry>,
}
