//! Loaded evidence artifacts and the selection model.
//!
//! An [`Artifact`] is one loaded evidence file (typically a memory image).
//! The [`ArtifactList`] keeps the ordered set of loaded artifacts together
//! with the single active selection the rest of the engine operates on:
//! loading an artifact selects it, removing the selected artifact moves the
//! selection to the last remaining entry.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from artifact list operations.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// An index outside the list of loaded artifacts.
    #[error("artifact index {index} out of range (loaded: {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// One loaded evidence file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    path: PathBuf,
}

impl Artifact {
    /// Creates an artifact for the given evidence file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the full path of the evidence file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the display name: the file name without any directory part.
    ///
    /// Result keys and export manifests reference artifacts by this name.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }

    /// Returns the display name with the file extension stripped.
    pub fn stem_name(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.display_name())
    }
}

/// Ordered list of loaded artifacts with a single active selection.
#[derive(Debug, Default)]
pub struct ArtifactList {
    loaded: Vec<Artifact>,
    selected: Option<usize>,
}

impl ArtifactList {
    /// Creates an empty artifact list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads an evidence file and selects it.
    pub fn load(&mut self, path: impl Into<PathBuf>) -> &Artifact {
        self.loaded.push(Artifact::new(path));
        self.selected = Some(self.loaded.len() - 1);
        &self.loaded[self.loaded.len() - 1]
    }

    /// Removes the artifact at `index`.
    ///
    /// If the selection pointed past the shortened list it is clamped to the
    /// last remaining entry; removing the final artifact clears it.
    pub fn remove(&mut self, index: usize) -> Result<Artifact, ArtifactError> {
        if index >= self.loaded.len() {
            return Err(ArtifactError::IndexOutOfRange {
                index,
                len: self.loaded.len(),
            });
        }
        let removed = self.loaded.remove(index);
        self.selected = match self.selected {
            Some(_) if self.loaded.is_empty() => None,
            Some(sel) if sel >= self.loaded.len() => Some(self.loaded.len() - 1),
            other => other,
        };
        Ok(removed)
    }

    /// Selects the artifact at `index`.
    pub fn select(&mut self, index: usize) -> Result<(), ArtifactError> {
        if index >= self.loaded.len() {
            return Err(ArtifactError::IndexOutOfRange {
                index,
                len: self.loaded.len(),
            });
        }
        self.selected = Some(index);
        Ok(())
    }

    /// Clears the active selection.
    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Returns the currently selected artifact, if any.
    pub fn selected(&self) -> Option<&Artifact> {
        self.selected.and_then(|i| self.loaded.get(i))
    }

    /// Returns all loaded artifacts in load order.
    pub fn loaded(&self) -> &[Artifact] {
        &self.loaded
    }

    /// Returns the display names of all loaded artifacts.
    pub fn names(&self) -> Vec<String> {
        self.loaded.iter().map(Artifact::display_name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_selects_newest() {
        let mut list = ArtifactList::new();
        list.load("/evidence/one.vmem");
        list.load("/evidence/two.vmem");
        assert_eq!(list.selected().unwrap().display_name(), "two.vmem");
    }

    #[test]
    fn remove_clamps_selection_to_last_entry() {
        let mut list = ArtifactList::new();
        list.load("/evidence/one.vmem");
        list.load("/evidence/two.vmem");
        list.remove(1).unwrap();
        assert_eq!(list.selected().unwrap().display_name(), "one.vmem");
        list.remove(0).unwrap();
        assert!(list.selected().is_none());
        assert!(list.loaded().is_empty());
    }

    #[test]
    fn remove_out_of_range_is_rejected() {
        let mut list = ArtifactList::new();
        list.load("/evidence/one.vmem");
        let err = list.remove(3).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::IndexOutOfRange { index: 3, len: 1 }
        ));
    }

    #[test]
    fn display_and_stem_names() {
        let artifact = Artifact::new("/evidence/memory.dmp");
        assert_eq!(artifact.display_name(), "memory.dmp");
        assert_eq!(artifact.stem_name(), "memory");
    }
}
