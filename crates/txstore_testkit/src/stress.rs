//! Stress runners for the engine.
//!
//! These exercise the engine under concurrent submission from many threads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use txstore_core::StoreEngine;

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Operations whose completion arrived with the expected outcome.
    pub successful_ops: usize,
    /// Operations that failed or never completed.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the run.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress runs.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations to perform.
    pub operations: usize,
    /// Number of submitting threads.
    pub threads: usize,
    /// Number of distinct keys.
    pub key_count: usize,
    /// How long to wait for any single completion.
    pub timeout: Duration,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 10_000,
            threads: 4,
            key_count: 100,
            timeout: Duration::from_secs(5),
        }
    }
}

fn populate(engine: &StoreEngine, config: &StressConfig) {
    for i in 0..config.key_count {
        engine.set(format!("key-{i}"), "seed");
    }
}

/// Many threads reading a fixed, committed key set.
///
/// Every read must find its key.
pub fn stress_concurrent_reads(engine: Arc<StoreEngine>, config: &StressConfig) -> StressTestResult {
    populate(&engine, config);

    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let ops_per_thread = config.operations / config.threads.max(1);

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let engine = Arc::clone(&engine);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let key_count = config.key_count.max(1);
            let timeout = config.timeout;

            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    let key = format!("key-{}", (t * ops_per_thread + i) % key_count);
                    match engine.get(key).recv_timeout(timeout) {
                        Ok(Ok(_)) => successful.fetch_add(1, Ordering::Relaxed),
                        _ => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }
            })
        })
        .collect();

    for handle in handles {
        let _ = handle.join();
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Threads interleaving sets, deletes, gets and counts on a shared key set.
///
/// Values may legitimately be missing here, so only completions that fail to
/// arrive count as failures.
pub fn stress_mixed_operations(engine: Arc<StoreEngine>, config: &StressConfig) -> StressTestResult {
    populate(&engine, config);

    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let ops_per_thread = config.operations / config.threads.max(1);

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let engine = Arc::clone(&engine);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let key_count = config.key_count.max(1);
            let timeout = config.timeout;

            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    let key = format!("key-{}", (t + i) % key_count);
                    let delivered = match i % 4 {
                        0 => {
                            engine.set(key, format!("t{t}"));
                            true
                        }
                        1 => engine.get(key).recv_timeout(timeout).is_ok(),
                        2 => {
                            engine.delete(key);
                            true
                        }
                        _ => engine.count(format!("t{t}")).recv_timeout(timeout).is_ok(),
                    };
                    if delivered {
                        successful.fetch_add(1, Ordering::Relaxed);
                    } else {
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        let _ = handle.join();
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Repeated begin / set / commit cycles from a single thread, racing
/// concurrent readers.
///
/// The writer's commits must all succeed; readers only need their
/// completions to arrive.
pub fn stress_nested_commits(engine: Arc<StoreEngine>, config: &StressConfig) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let cycles = config.operations / 3;
    let readers = config.threads.saturating_sub(1).max(1);

    let start = Instant::now();

    let writer = {
        let engine = Arc::clone(&engine);
        let successful = Arc::clone(&successful);
        let failed = Arc::clone(&failed);
        let timeout = config.timeout;
        thread::spawn(move || {
            for i in 0..cycles {
                engine.begin();
                engine.set("counter", i.to_string());
                match engine.commit().recv_timeout(timeout) {
                    Ok(Ok(())) => successful.fetch_add(3, Ordering::Relaxed),
                    _ => failed.fetch_add(3, Ordering::Relaxed),
                };
            }
        })
    };

    let reader_handles: Vec<_> = (0..readers)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let timeout = config.timeout;
            let reads = cycles;
            thread::spawn(move || {
                for _ in 0..reads {
                    match engine.get("counter").recv_timeout(timeout) {
                        Ok(_) => successful.fetch_add(1, Ordering::Relaxed),
                        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }
            })
        })
        .collect();

    let _ = writer.join();
    for handle in reader_handles {
        let _ = handle.join();
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use txstore_core::EngineConfig;

    fn small_config() -> StressConfig {
        StressConfig {
            operations: 400,
            threads: 4,
            key_count: 16,
            timeout: Duration::from_secs(5),
        }
    }

    fn engine() -> Arc<StoreEngine> {
        Arc::new(StoreEngine::new(EngineConfig::new().worker_threads(4)))
    }

    #[test]
    fn concurrent_reads_all_hit() {
        let result = stress_concurrent_reads(engine(), &small_config());
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.total_ops, 400);
    }

    #[test]
    fn mixed_operations_all_complete() {
        let result = stress_mixed_operations(engine(), &small_config());
        assert_eq!(result.failed_ops, 0);
    }

    #[test]
    fn nested_commits_all_succeed() {
        let engine = engine();
        let result = stress_nested_commits(Arc::clone(&engine), &small_config());
        assert_eq!(result.failed_ops, 0);
        assert_eq!(engine.stats().commits, 133);
        assert_eq!(engine.stats().depth, 0);
    }
}
