//! Engine statistics.
//!
//! Counters are updated by the worker that executes an operation, so they
//! reflect executed operations, not submitted ones.
//!
//! # Usage
//!
//! ```rust,ignore
//! use txstore_core::{EngineConfig, StoreEngine};
//!
//! let engine = StoreEngine::new(EngineConfig::default());
//! engine.set("k", "v");
//!
//! let stats = engine.stats();
//! println!("Sets: {}", stats.sets);
//! println!("Open transactions: {}", stats.depth);
//! ```

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared by the engine's workers.
#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    gets: AtomicU64,
    get_misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    counts: AtomicU64,
    begins: AtomicU64,
    commits: AtomicU64,
    rollbacks: AtomicU64,
    failed_commits: AtomicU64,
    failed_rollbacks: AtomicU64,
    depth: AtomicU64,
}

impl StatsRecorder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_get(&self, hit: bool) {
        self.gets.fetch_add(1, Ordering::Relaxed);
        if !hit {
            self.get_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_set(&self) {
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_count(&self) {
        self.counts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_begin(&self, depth: usize) {
        self.begins.fetch_add(1, Ordering::Relaxed);
        self.set_depth(depth);
    }

    pub(crate) fn record_commit(&self, ok: bool, depth: usize) {
        if ok {
            self.commits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_commits.fetch_add(1, Ordering::Relaxed);
        }
        self.set_depth(depth);
    }

    pub(crate) fn record_rollback(&self, ok: bool, depth: usize) {
        if ok {
            self.rollbacks.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_rollbacks.fetch_add(1, Ordering::Relaxed);
        }
        self.set_depth(depth);
    }

    fn set_depth(&self, depth: usize) {
        self.depth.store(depth as u64, Ordering::Relaxed);
    }

    /// Takes a point-in-time copy of all counters.
    pub(crate) fn snapshot(&self) -> EngineStats {
        EngineStats {
            gets: self.gets.load(Ordering::Relaxed),
            get_misses: self.get_misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            counts: self.counts.load(Ordering::Relaxed),
            begins: self.begins.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
            rollbacks: self.rollbacks.load(Ordering::Relaxed),
            failed_commits: self.failed_commits.load(Ordering::Relaxed),
            failed_rollbacks: self.failed_rollbacks.load(Ordering::Relaxed),
            depth: self.depth.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of engine statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    /// Executed `get` operations.
    pub gets: u64,
    /// `get` operations that found no value.
    pub get_misses: u64,
    /// Executed `set` operations.
    pub sets: u64,
    /// Executed `delete` operations.
    pub deletes: u64,
    /// Executed `count` operations.
    pub counts: u64,
    /// Executed `begin` operations.
    pub begins: u64,
    /// Successful commits.
    pub commits: u64,
    /// Successful rollbacks.
    pub rollbacks: u64,
    /// Commits rejected for lack of an open transaction.
    pub failed_commits: u64,
    /// Rollbacks rejected for lack of an open transaction.
    pub failed_rollbacks: u64,
    /// Open transactions after the last lifecycle operation.
    pub depth: u64,
}

impl EngineStats {
    /// Total executed operations.
    #[must_use]
    pub fn total_operations(&self) -> u64 {
        self.gets
            + self.sets
            + self.deletes
            + self.counts
            + self.begins
            + self.commits
            + self.rollbacks
            + self.failed_commits
            + self.failed_rollbacks
    }

    /// Operations that completed with an error.
    #[must_use]
    pub fn errors(&self) -> u64 {
        self.get_misses + self.failed_commits + self.failed_rollbacks
    }
}
