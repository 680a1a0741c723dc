//! Thread-safe store of completed command results.
//!
//! Results are keyed by [`JobKey`] - the parameter-inclusive identity of a
//! job - so two runs of the same command with different parameters are
//! independent entries. The store is the hand-off point between the
//! dispatcher's completion path and everything downstream (annotation,
//! export, presentation): a worker writes its entry before the completion
//! callback fires, so callbacks always observe their own result.

use std::sync::Arc;

use dashmap::DashMap;

use crate::annotate::Highlight;
use crate::dispatcher::JobKey;
use crate::parser::Parsed;

/// Stored output of one completed job.
#[derive(Clone, Debug)]
pub struct CommandResult {
    /// Owning job key.
    pub key: JobKey,
    /// Immutable raw output text (stderr section included when present).
    pub raw: Arc<str>,
    /// Structured rows, or the raw fallback for schema-less commands.
    pub parsed: Parsed,
    /// Analyst highlights, in insertion order.
    pub highlights: Vec<Highlight>,
}

impl CommandResult {
    /// Creates a result with no highlights.
    pub fn new(key: JobKey, raw: impl Into<Arc<str>>, parsed: Parsed) -> Self {
        Self {
            key,
            raw: raw.into(),
            parsed,
            highlights: Vec::new(),
        }
    }
}

/// Thread-safe map of completed results.
///
/// Concurrent workers touch disjoint keys; per-entry mutation (annotation)
/// happens under the map's entry lock.
#[derive(Debug, Default)]
pub struct ResultStore {
    entries: DashMap<JobKey, CommandResult>,
}

impl ResultStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry for `result.key`.
    pub fn put(&self, result: CommandResult) {
        self.entries.insert(result.key.clone(), result);
    }

    /// Returns true if the key already has a stored result.
    pub fn contains(&self, key: &JobKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns a snapshot clone of the entry for `key`.
    pub fn get(&self, key: &JobKey) -> Option<CommandResult> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Removes the entry for `key` (result view closed).
    pub fn remove(&self, key: &JobKey) -> Option<CommandResult> {
        self.entries.remove(key).map(|(_, result)| result)
    }

    /// Returns all stored keys, sorted for deterministic enumeration.
    pub fn list(&self) -> Vec<JobKey> {
        let mut keys: Vec<JobKey> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Returns snapshot clones of every result for the named artifact,
    /// sorted by (command, params) for deterministic export enumeration.
    pub fn results_for_artifact(&self, artifact: &str) -> Vec<CommandResult> {
        let mut results: Vec<CommandResult> = self
            .entries
            .iter()
            .filter(|e| e.key().artifact == artifact)
            .map(|e| e.value().clone())
            .collect();
        results.sort_by(|a, b| a.key.cmp(&b.key));
        results
    }

    /// Clears every entry (session reset).
    pub fn reset(&self) {
        self.entries.clear();
    }

    /// Number of stored results.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no results are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs `f` against the entry for `key` under the map's entry lock.
    ///
    /// This is the mutation path used by the annotation engine so highlight
    /// edits share the store's locking discipline.
    pub(crate) fn with_entry_mut<T>(
        &self,
        key: &JobKey,
        f: impl FnOnce(&mut CommandResult) -> T,
    ) -> Option<T> {
        self.entries.get_mut(key).map(|mut entry| f(entry.value_mut()))
    }
}
