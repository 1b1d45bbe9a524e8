//! Synchronous reference model.
//!
//! [`ReferenceStore`] applies operations immediately on the calling thread.
//! It follows the same visibility rules as the engine (top record plus its
//! immediate parent) and serves as an oracle for property tests that submit
//! operations from a single thread.

use std::collections::{BTreeMap, BTreeSet};
use txstore_core::{StoreError, StoreResult};

#[derive(Debug, Clone, Default)]
struct Layer {
    values: BTreeMap<String, String>,
    deleted: BTreeSet<String>,
}

/// Single-threaded oracle for the engine's observable behavior.
#[derive(Debug, Clone)]
pub struct ReferenceStore {
    layers: Vec<Layer>,
}

impl Default for ReferenceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceStore {
    /// Creates a model with only the committed layer.
    pub fn new() -> Self {
        Self {
            layers: vec![Layer::default()],
        }
    }

    /// Number of open transactions.
    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    fn top(&self) -> &Layer {
        &self.layers[self.layers.len() - 1]
    }

    fn top_mut(&mut self) -> &mut Layer {
        let last = self.layers.len() - 1;
        &mut self.layers[last]
    }

    fn below_top(&self) -> Option<&Layer> {
        if self.layers.len() < 2 {
            None
        } else {
            Some(&self.layers[self.layers.len() - 2])
        }
    }

    /// Visible value of `key`.
    pub fn get(&self, key: &str) -> StoreResult<String> {
        let top = self.top();
        if let Some(value) = top.values.get(key) {
            return Ok(value.clone());
        }
        if top.deleted.contains(key) {
            return Err(StoreError::value_not_found(key));
        }
        match self.below_top().and_then(|layer| layer.values.get(key)) {
            Some(value) => Ok(value.clone()),
            None => Err(StoreError::value_not_found(key)),
        }
    }

    /// Sets `key` in the top layer.
    pub fn set(&mut self, key: &str, value: &str) {
        let top = self.top_mut();
        top.deleted.remove(key);
        top.values.insert(key.to_owned(), value.to_owned());
    }

    /// Deletes `key` in the top layer.
    pub fn delete(&mut self, key: &str) {
        let top = self.top_mut();
        top.values.remove(key);
        top.deleted.insert(key.to_owned());
    }

    /// Visible occurrences of `value`.
    pub fn count(&self, value: &str) -> usize {
        let top = self.top();
        let Some(parent) = self.below_top() else {
            return top.values.values().filter(|v| *v == value).count();
        };

        let mut visible = BTreeMap::new();
        for (key, val) in &parent.values {
            if !top.deleted.contains(key) {
                visible.insert(key, val);
            }
        }
        for (key, val) in &top.values {
            visible.insert(key, val);
        }
        visible.values().filter(|v| v.as_str() == value).count()
    }

    /// Opens a layer.
    pub fn begin(&mut self) {
        self.layers.push(Layer::default());
    }

    /// Folds the top layer into the one below.
    pub fn commit(&mut self) -> StoreResult<()> {
        if self.layers.len() < 2 {
            return Err(StoreError::nothing_to_commit());
        }
        let Some(top) = self.layers.pop() else {
            return Err(StoreError::nothing_to_commit());
        };
        let parent = self.top_mut();

        let mut still_pending = BTreeSet::new();
        for key in top.deleted {
            if parent.values.remove(&key).is_none() {
                still_pending.insert(key);
            }
        }
        for (key, value) in top.values {
            parent.values.insert(key, value);
        }
        parent.deleted = still_pending;
        Ok(())
    }

    /// Drops the top layer.
    pub fn rollback(&mut self) -> StoreResult<()> {
        if self.layers.len() < 2 {
            return Err(StoreError::nothing_to_rollback());
        }
        self.layers.pop();
        Ok(())
    }
}
