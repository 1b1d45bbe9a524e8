//! The ordered stack of transaction records.

use crate::error::{StoreError, StoreResult};
use crate::transaction::record::TransactionRecord;
use std::collections::HashMap;

/// Non-empty stack of [`TransactionRecord`]s.
///
/// The first element is the root record holding the committed global state.
/// It is never popped. Every `begin` pushes a fresh record on top.
///
/// Reads only consult the top record and its immediate parent. A value that
/// lives two or more levels below the top is not visible until the
/// intervening transactions are committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionStack {
    records: Vec<TransactionRecord>,
}

impl Default for TransactionStack {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionStack {
    /// Creates a stack holding only an empty root record.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: vec![TransactionRecord::new()],
        }
    }

    /// Returns the number of open (uncommitted) transactions.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.records.len() - 1
    }

    /// Returns true if at least one transaction is open.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.records.len() > 1
    }

    /// Returns the innermost record.
    #[must_use]
    pub fn top(&self) -> &TransactionRecord {
        // The root is never popped, so `last` is always present.
        &self.records[self.records.len() - 1]
    }

    fn top_mut(&mut self) -> &mut TransactionRecord {
        let last = self.records.len() - 1;
        &mut self.records[last]
    }

    /// Returns the record directly below the top, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&TransactionRecord> {
        self.records.len().checked_sub(2).map(|i| &self.records[i])
    }

    /// Returns the root record.
    #[must_use]
    pub fn root(&self) -> &TransactionRecord {
        &self.records[0]
    }

    /// Looks up `key` in the top record, then its immediate parent.
    ///
    /// A deletion marker in the top record hides the parent's value.
    pub fn get(&self, key: &str) -> StoreResult<&str> {
        let top = self.top();
        if let Some(value) = top.read(key) {
            return Ok(value);
        }
        if top.is_pending_deletion(key) {
            return Err(StoreError::value_not_found(key));
        }
        self.parent()
            .and_then(|parent| parent.read(key))
            .ok_or_else(|| StoreError::value_not_found(key))
    }

    /// Sets `key` in the top record.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.top_mut().write(key, value);
    }

    /// Deletes `key` in the top record.
    pub fn delete(&mut self, key: impl Into<String>) {
        self.top_mut().mark_deleted(key);
    }

    /// Counts visible values equal to `value` across the top two records.
    #[must_use]
    pub fn count(&self, value: &str) -> usize {
        let top = self.top();
        let Some(parent) = self.parent() else {
            return top.occurrences(value);
        };

        let mut merged: HashMap<&str, &str> = parent
            .overrides()
            .iter()
            .filter(|(key, _)| !top.is_pending_deletion(key))
            .map(|(key, val)| (key.as_str(), val.as_str()))
            .collect();
        merged.extend(
            top.overrides()
                .iter()
                .map(|(key, val)| (key.as_str(), val.as_str())),
        );

        merged.values().filter(|v| **v == value).count()
    }

    /// Opens a nested transaction.
    pub fn begin(&mut self) {
        self.records.push(TransactionRecord::new());
    }

    /// Merges the top record into its parent and pops it.
    pub fn commit(&mut self) -> StoreResult<()> {
        if !self.in_transaction() {
            return Err(StoreError::nothing_to_commit());
        }
        let top = self
            .records
            .pop()
            .ok_or_else(StoreError::nothing_to_commit)?;
        self.top_mut().absorb(top);
        Ok(())
    }

    /// Pops the top record without merging it.
    pub fn rollback(&mut self) -> StoreResult<()> {
        if !self.in_transaction() {
            return Err(StoreError::nothing_to_rollback());
        }
        self.records.pop();
        Ok(())
    }
}
