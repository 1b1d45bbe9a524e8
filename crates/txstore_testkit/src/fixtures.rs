//! Test fixtures and engine helpers.
//!
//! The engine only reports results asynchronously. These helpers submit an
//! operation, wait for its completion with a timeout and assert on the
//! outcome, so tests read as a straight sequence of steps.

use std::sync::mpsc::Receiver;
use std::time::Duration;
use txstore_core::{EngineConfig, ErrorKind, StoreEngine, StoreResult};

/// How long helpers wait for a completion by default.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// An engine with synchronous expectation helpers.
pub struct TestEngine {
    /// The engine instance.
    pub engine: StoreEngine,
    timeout: Duration,
}

impl TestEngine {
    /// Creates an engine with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Creates an engine with the given configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            engine: StoreEngine::new(config),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Changes how long helpers wait for a completion.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Waits for a result channel to deliver.
    pub fn wait<T>(&self, receiver: Receiver<T>) -> T {
        receiver
            .recv_timeout(self.timeout)
            .expect("completion was not delivered in time")
    }

    /// Submits a `get` and waits for its result.
    pub fn get_now(&self, key: &str) -> StoreResult<String> {
        self.wait(self.engine.get(key))
    }

    /// Submits a `count` and waits for its result.
    pub fn count_now(&self, value: &str) -> usize {
        self.wait(self.engine.count(value))
    }

    /// Submits a `commit` and waits for its result.
    pub fn commit_now(&self) -> StoreResult<()> {
        self.wait(self.engine.commit())
    }

    /// Submits a `rollback` and waits for its result.
    pub fn rollback_now(&self) -> StoreResult<()> {
        self.wait(self.engine.rollback())
    }

    /// Asserts that `key` currently reads as `expected`.
    #[track_caller]
    pub fn expect_value(&self, key: &str, expected: &str) {
        match self.get_now(key) {
            Ok(value) => assert_eq!(value, expected, "unexpected value for key {key:?}"),
            Err(err) => panic!("expected {expected:?} for key {key:?}, got error: {err}"),
        }
    }

    /// Asserts that `key` is not visible.
    #[track_caller]
    pub fn expect_missing(&self, key: &str) {
        match self.get_now(key) {
            Ok(value) => panic!("expected key {key:?} to be missing, got {value:?}"),
            Err(err) => {
                assert_eq!(err.kind(), ErrorKind::ValueNotFound);
                assert_eq!(err.key(), Some(key));
            }
        }
    }

    /// Asserts the visible occurrence count of `value`.
    #[track_caller]
    pub fn expect_count(&self, value: &str, expected: usize) {
        assert_eq!(
            self.count_now(value),
            expected,
            "unexpected count for value {value:?}"
        );
    }

    /// Asserts whether a `commit` succeeds.
    #[track_caller]
    pub fn expect_commit(&self, success: bool) {
        match self.commit_now() {
            Ok(()) => assert!(success, "commit succeeded unexpectedly"),
            Err(err) => {
                assert!(!success, "commit failed: {err}");
                assert_eq!(err.kind(), ErrorKind::NothingToCommit);
            }
        }
    }

    /// Asserts whether a `rollback` succeeds.
    #[track_caller]
    pub fn expect_rollback(&self, success: bool) {
        match self.rollback_now() {
            Ok(()) => assert!(success, "rollback succeeded unexpectedly"),
            Err(err) => {
                assert!(!success, "rollback failed: {err}");
                assert_eq!(err.kind(), ErrorKind::NothingToRollback);
            }
        }
    }
}

impl Default for TestEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestEngine {
    type Target = StoreEngine;

    fn deref(&self) -> &Self::Target {
        &self.engine
    }
}

/// Runs a test with a fresh engine.
///
/// # Example
///
/// ```rust,ignore
/// use txstore_testkit::with_engine;
///
/// #[test]
/// fn my_test() {
///     with_engine(|engine| {
///         engine.set("k", "v");
///         engine.expect_value("k", "v");
///     });
/// }
/// ```
pub fn with_engine<F, R>(f: F) -> R
where
    F: FnOnce(&TestEngine) -> R,
{
    let engine = TestEngine::new();
    f(&engine)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates an engine with `count` committed keys `key-0..` all set to `value`.
    pub fn populated_engine(count: usize, value: &str) -> TestEngine {
        let engine = TestEngine::new();
        for i in 0..count {
            engine.set(format!("key-{i}"), value);
        }
        engine
    }

    /// Creates an engine with `depth` open transactions, each setting
    /// `level-<n>` to its own depth.
    pub fn nested_engine(depth: usize) -> TestEngine {
        let engine = TestEngine::new();
        for level in 1..=depth {
            engine.begin();
            engine.set(format!("level-{level}"), level.to_string());
        }
        engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_round_trip() {
        with_engine(|engine| {
            engine.expect_missing("k");
            engine.set("k", "v");
            engine.expect_value("k", "v");
            engine.expect_count("v", 1);
            engine.expect_commit(false);
            engine.expect_rollback(false);
        });
    }

    #[test]
    fn populated_scenario() {
        let engine = scenarios::populated_engine(10, "x");
        engine.expect_count("x", 10);
        engine.expect_value("key-9", "x");
    }

    #[test]
    fn nested_scenario() {
        let engine = scenarios::nested_engine(3);
        engine.expect_value("level-3", "3");
        engine.expect_value("level-2", "2");
        // Two levels below the top is out of view.
        engine.expect_missing("level-1");
        assert_eq!(engine.stats().depth, 3);
    }
}
