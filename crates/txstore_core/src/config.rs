//! Engine configuration.

use std::borrow::Cow;

/// Configuration for a [`StoreEngine`](crate::StoreEngine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of worker threads executing admitted operations.
    pub worker_threads: usize,

    /// Prefix for worker thread names.
    pub thread_name: Cow<'static, str>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_threads: 4,
            thread_name: Cow::Borrowed("txstore-worker"),
        }
    }
}

impl EngineConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of worker threads.
    #[must_use]
    pub const fn worker_threads(mut self, count: usize) -> Self {
        self.worker_threads = count;
        self
    }

    /// Sets the worker thread name prefix.
    #[must_use]
    pub fn thread_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Worker count actually used; never less than one.
    #[must_use]
    pub(crate) fn effective_workers(&self) -> usize {
        self.worker_threads.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.worker_threads, 4);
        assert_eq!(config.thread_name, "txstore-worker");
    }

    #[test]
    fn builder_pattern() {
        let config = EngineConfig::new().worker_threads(8).thread_name("kv");

        assert_eq!(config.worker_threads, 8);
        assert_eq!(config.thread_name, "kv");
    }

    #[test]
    fn zero_workers_clamped() {
        let config = EngineConfig::new().worker_threads(0);
        assert_eq!(config.effective_workers(), 1);
    }
}
