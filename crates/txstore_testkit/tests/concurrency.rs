//! Ordering and isolation guarantees under concurrent submission.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use txstore_core::{
    CompletionContext, EngineConfig, InlineContext, Operation, StoreEngine, Task,
};
use txstore_testkit::prelude::*;

const TIMEOUT: Duration = Duration::from_secs(5);

#[test]
fn write_results_arrive_in_submission_order() {
    let engine = StoreEngine::new(EngineConfig::new().worker_threads(8));
    let (sender, receiver) = mpsc::channel();

    for i in 0..50 {
        engine.begin();
        let sender = sender.clone();
        engine.perform(Operation::commit(move |result| {
            sender.send((i, result.is_ok())).unwrap();
        }));
    }
    drop(sender);

    let order: Vec<_> = receiver.iter().take(50).collect();
    assert_eq!(order.len(), 50);
    for (expected, (i, ok)) in order.into_iter().enumerate() {
        assert_eq!(i, expected);
        assert!(ok);
    }
}

#[test]
fn reads_observe_every_earlier_write() {
    let engine = StoreEngine::new(EngineConfig::new().worker_threads(8));
    let receivers: Vec<_> = (0..200)
        .map(|i| {
            engine.set("k", i.to_string());
            engine.get("k")
        })
        .collect();

    for (i, receiver) in receivers.into_iter().enumerate() {
        let value = receiver.recv_timeout(TIMEOUT).unwrap().unwrap();
        assert_eq!(value, i.to_string());
    }
}

#[test]
fn counts_between_writes_are_stable() {
    let engine = StoreEngine::new(EngineConfig::new().worker_threads(8));
    let mut expected = Vec::new();
    let mut receivers = Vec::new();

    for i in 0..20 {
        engine.set(format!("k{i}"), "v");
        // Several reads in a row may run together; all see i + 1 entries.
        for _ in 0..5 {
            receivers.push(engine.count("v"));
            expected.push(i + 1);
        }
    }

    let actual: Vec<_> = receivers
        .into_iter()
        .map(|r| r.recv_timeout(TIMEOUT).unwrap())
        .collect();
    assert_eq!(actual, expected);
}

/// Delivers on the calling worker while counting concurrent deliveries.
struct OverlapProbe {
    inside: AtomicUsize,
    max_inside: AtomicUsize,
}

impl CompletionContext for OverlapProbe {
    fn dispatch(&self, task: Task) {
        let now = self.inside.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_inside.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        task();
        self.inside.fetch_sub(1, Ordering::SeqCst);
    }
}

#[test]
fn reads_run_concurrently() {
    let probe = Arc::new(OverlapProbe {
        inside: AtomicUsize::new(0),
        max_inside: AtomicUsize::new(0),
    });
    let engine = StoreEngine::with_context(
        EngineConfig::new().worker_threads(4),
        Arc::clone(&probe) as Arc<dyn CompletionContext>,
    );

    let receivers: Vec<_> = (0..8).map(|_| engine.count("v")).collect();
    for receiver in receivers {
        receiver.recv_timeout(TIMEOUT).unwrap();
    }

    // Reads deliver while holding their gate pass, so overlap here means
    // the reads themselves overlapped.
    assert!(probe.max_inside.load(Ordering::SeqCst) > 1);
}

#[test]
fn writes_run_alone() {
    let probe = Arc::new(OverlapProbe {
        inside: AtomicUsize::new(0),
        max_inside: AtomicUsize::new(0),
    });
    let engine = StoreEngine::with_context(
        EngineConfig::new().worker_threads(4),
        Arc::clone(&probe) as Arc<dyn CompletionContext>,
    );

    let mut receivers = Vec::new();
    for _ in 0..4 {
        receivers.push(engine.commit());
        receivers.push(engine.rollback());
    }
    for receiver in receivers {
        assert!(receiver.recv_timeout(TIMEOUT).unwrap().is_err());
    }

    assert_eq!(probe.max_inside.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_submitters_keep_per_thread_order() {
    let engine = Arc::new(StoreEngine::with_context(
        EngineConfig::new().worker_threads(4),
        Arc::new(InlineContext),
    ));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let key = format!("thread-{t}");
                for i in 0..100 {
                    engine.set(key.as_str(), i.to_string());
                    let seen = engine.get(key.as_str()).recv_timeout(TIMEOUT).unwrap();
                    assert_eq!(seen, Ok(i.to_string()));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn stress_runners_complete_without_failures() {
    let config = StressConfig {
        operations: 2_000,
        threads: 4,
        key_count: 32,
        timeout: TIMEOUT,
    };
    let engine = Arc::new(StoreEngine::new(EngineConfig::default()));

    let reads = stress_concurrent_reads(Arc::clone(&engine), &config);
    assert_eq!(reads.failed_ops, 0);

    let mixed = stress_mixed_operations(Arc::clone(&engine), &config);
    assert_eq!(mixed.failed_ops, 0);

    let nested = stress_nested_commits(engine, &config);
    assert_eq!(nested.failed_ops, 0);
}
