//! A single layer of the transaction stack.

use std::collections::{HashMap, HashSet};

/// One transaction layer: local overrides plus deletions owed to the parent.
///
/// A record only ever answers for itself. Looking through to ancestors is the
/// stack's job.
///
/// A key is never in `overrides` and `pending_deletions` at the same time:
/// [`write`](Self::write) clears the deletion marker and
/// [`mark_deleted`](Self::mark_deleted) removes the override.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionRecord {
    /// Values set directly within this layer.
    overrides: HashMap<String, String>,
    /// Keys to remove from the parent's visible state on merge.
    pending_deletions: HashSet<String>,
}

impl TransactionRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the local override for `key`.
    #[must_use]
    pub fn read(&self, key: &str) -> Option<&str> {
        self.overrides.get(key).map(String::as_str)
    }

    /// Sets `key` locally and cancels any pending deletion of it.
    pub fn write(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.pending_deletions.remove(&key);
        self.overrides.insert(key, value.into());
    }

    /// Drops any local override and marks `key` for deletion upstream.
    ///
    /// The marker is recorded even if this layer had overridden the key, so
    /// the parent's value stays hidden after merge.
    pub fn mark_deleted(&mut self, key: impl Into<String>) {
        let key = key.into();
        self.overrides.remove(&key);
        self.pending_deletions.insert(key);
    }

    /// Counts local overrides equal to `value`.
    #[must_use]
    pub fn occurrences(&self, value: &str) -> usize {
        self.overrides.values().filter(|v| v.as_str() == value).count()
    }

    /// Returns true if `key` is marked for deletion upstream.
    #[must_use]
    pub fn is_pending_deletion(&self, key: &str) -> bool {
        self.pending_deletions.contains(key)
    }

    /// Returns the local overrides.
    #[must_use]
    pub fn overrides(&self) -> &HashMap<String, String> {
        &self.overrides
    }

    /// Returns the keys marked for deletion upstream.
    #[must_use]
    pub fn pending_deletions(&self) -> &HashSet<String> {
        &self.pending_deletions
    }

    /// Returns true if the record holds no overrides and no deletion markers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty() && self.pending_deletions.is_empty()
    }

    /// Folds `child` into this record.
    ///
    /// Deletions the child owes are applied to this record's overrides. Those
    /// that find nothing to remove here are carried forward and replace this
    /// record's own markers, so they reach the next ancestor on its commit.
    /// The child's overrides win on key collisions.
    pub(crate) fn absorb(&mut self, child: TransactionRecord) {
        let TransactionRecord {
            overrides,
            pending_deletions,
        } = child;

        let carried: HashSet<String> = pending_deletions
            .into_iter()
            .filter(|key| self.overrides.remove(key).is_none())
            .collect();

        self.overrides.extend(overrides);
        self.pending_deletions = carried;
    }
}
