//! Highlight overlays on stored command results.
//!
//! A [`Highlight`] is a colored range over a result's output text. Offsets
//! are logical character positions into the immutable text, which keeps the
//! annotation model independent of any rendering surface: the same list
//! drives the interactive view and the exported replay.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::dispatcher::JobKey;
use crate::store::ResultStore;

/// Annotation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnnotationError {
    /// No stored result for the given key.
    #[error("no result stored for {0}")]
    UnknownResult(JobKey),

    /// Range is empty, inverted, or outside the result text.
    #[error("invalid highlight range {start}..{end} (text length {len})")]
    InvalidRange {
        start: usize,
        end: usize,
        len: usize,
    },
}

/// A colored annotation over a sub-range of a result's text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    /// Display color (e.g. `#ff0000` or a named color).
    pub color: String,
    /// Start offset, in characters, inclusive.
    pub start: usize,
    /// End offset, in characters, exclusive.
    pub end: usize,
}

impl Highlight {
    /// Returns true if this highlight intersects the given range.
    fn intersects(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}

/// Manages highlight overlays on [`ResultStore`] entries.
///
/// Mutations run under the store's per-entry lock, the same discipline the
/// dispatcher's completion path uses for the underlying results.
pub struct AnnotationEngine {
    store: Arc<ResultStore>,
}

impl AnnotationEngine {
    /// Creates an annotation engine over the given store.
    pub fn new(store: Arc<ResultStore>) -> Self {
        Self { store }
    }

    /// Adds a highlight to the result for `key`, returning its index.
    ///
    /// The range must be non-empty and within the result text's character
    /// count.
    pub fn add_highlight(
        &self,
        key: &JobKey,
        color: impl Into<String>,
        start: usize,
        end: usize,
    ) -> Result<usize, AnnotationError> {
        let color = color.into();
        self.store
            .with_entry_mut(key, |result| {
                let len = result.raw.chars().count();
                if start >= end || end > len {
                    return Err(AnnotationError::InvalidRange { start, end, len });
                }
                result.highlights.push(Highlight { color, start, end });
                Ok(result.highlights.len() - 1)
            })
            .ok_or_else(|| AnnotationError::UnknownResult(key.clone()))?
    }

    /// Removes every highlight intersecting the given range, returning the
    /// number removed.
    pub fn remove_highlights_in_range(
        &self,
        key: &JobKey,
        start: usize,
        end: usize,
    ) -> Result<usize, AnnotationError> {
        self.store
            .with_entry_mut(key, |result| {
                let before = result.highlights.len();
                result.highlights.retain(|h| !h.intersects(start, end));
                before - result.highlights.len()
            })
            .ok_or_else(|| AnnotationError::UnknownResult(key.clone()))
    }

    /// Returns the highlights for `key` in insertion order.
    pub fn list_highlights(&self, key: &JobKey) -> Result<Vec<Highlight>, AnnotationError> {
        self.store
            .get(key)
            .map(|result| result.highlights)
            .ok_or_else(|| AnnotationError::UnknownResult(key.clone()))
    }
}
