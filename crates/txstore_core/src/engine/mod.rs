//! The store engine: submission, admission and execution of operations.

mod gate;

pub use gate::{ConcurrencyGate, GatePass, Ticket};

use crate::completion::{Completion, CompletionContext, SerialContext};
use crate::config::EngineConfig;
use crate::error::StoreResult;
use crate::operation::Operation;
use crate::stats::{EngineStats, StatsRecorder};
use crate::transaction::TransactionStack;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// An admitted operation waiting for a worker.
struct Job {
    admission: Admission,
    operation: Operation,
}

/// A ticket that has been issued but has not entered the gate yet.
///
/// Dropping it unused abandons the ticket, so a job lost from the queue
/// never holds back the operations admitted after it.
struct Admission {
    ticket: Option<Ticket>,
    shared: Arc<Shared>,
}

impl Drop for Admission {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            tracing::warn!(seq = ticket.seq(), "operation dropped before it ran");
            self.shared.gate.abandon(ticket);
        }
    }
}

/// State shared between the engine handle and its workers.
struct Shared {
    stack: RwLock<TransactionStack>,
    gate: ConcurrencyGate,
    stats: StatsRecorder,
    context: Arc<dyn CompletionContext>,
}

/// Nested-transaction key-value engine.
///
/// All access goes through [`perform`](Self::perform). Submitting never
/// blocks: the operation is given a place in line by the
/// [`ConcurrencyGate`] and executed by a worker thread. Results are delivered
/// through the operation's [`Completion`] on the engine's
/// [`CompletionContext`].
///
/// `get` and `count` are reads and may run concurrently. `set`, `delete`,
/// `begin`, `commit` and `rollback` are writes: each one waits for
/// everything submitted before it and holds back everything submitted after.
///
/// # Example
///
/// ```rust,ignore
/// use txstore_core::{EngineConfig, StoreEngine};
///
/// let engine = StoreEngine::new(EngineConfig::default());
/// engine.set("k", "a");
/// engine.begin();
/// engine.set("k", "b");
/// engine.rollback();
///
/// let value = engine.get("k").recv()?;
/// assert_eq!(value?, "a");
/// ```
pub struct StoreEngine {
    shared: Arc<Shared>,
    /// Submission side of the job queue. Locked so that ticket order and
    /// queue order agree.
    submit: Mutex<Option<Sender<Job>>>,
    workers: Vec<JoinHandle<()>>,
    config: EngineConfig,
}

impl StoreEngine {
    /// Starts an engine that delivers results on a [`SerialContext`].
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_context(config, Arc::new(SerialContext::new()))
    }

    /// Starts an engine that delivers results on `context`.
    #[must_use]
    pub fn with_context(config: EngineConfig, context: Arc<dyn CompletionContext>) -> Self {
        let shared = Arc::new(Shared {
            stack: RwLock::new(TransactionStack::new()),
            gate: ConcurrencyGate::new(),
            stats: StatsRecorder::new(),
            context,
        });

        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));

        let workers: Vec<_> = (0..config.effective_workers())
            .filter_map(|index| {
                let shared = Arc::clone(&shared);
                let receiver = Arc::clone(&receiver);
                thread::Builder::new()
                    .name(format!("{}-{index}", config.thread_name))
                    .spawn(move || worker_loop(&shared, &receiver))
                    .map_err(|err| tracing::error!(%err, index, "failed to spawn worker"))
                    .ok()
            })
            .collect();

        // Without any worker nothing would ever run; keep the queue closed so
        // submissions execute on the caller instead.
        let submit = (!workers.is_empty()).then_some(sender);

        tracing::info!(workers = workers.len(), "store engine started");

        Self {
            shared,
            submit: Mutex::new(submit),
            workers,
            config,
        }
    }

    /// Submits an operation.
    ///
    /// Returns once the operation has its place in line; it runs later on a
    /// worker thread.
    pub fn perform(&self, operation: Operation) {
        let submit = self.submit.lock();
        let admission = Admission {
            ticket: Some(self.shared.gate.admit(operation.access())),
            shared: Arc::clone(&self.shared),
        };
        let job = Job {
            admission,
            operation,
        };

        let rejected = match submit.as_ref() {
            Some(sender) => sender.send(job).err().map(|mpsc::SendError(job)| job),
            None => Some(job),
        };
        drop(submit);

        if let Some(job) = rejected {
            tracing::warn!("no worker available, executing on the submitting thread");
            run_job(&self.shared, job);
        }
    }

    /// Submits a `get` and returns a channel for its result.
    pub fn get(&self, key: impl Into<String>) -> Receiver<StoreResult<String>> {
        let (on_result, receiver) = Completion::channel();
        self.perform(Operation::Get {
            key: key.into(),
            on_result,
        });
        receiver
    }

    /// Submits a `set`.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.perform(Operation::set(key, value));
    }

    /// Submits a `delete`.
    pub fn delete(&self, key: impl Into<String>) {
        self.perform(Operation::delete(key));
    }

    /// Submits a `count` and returns a channel for its result.
    pub fn count(&self, value: impl Into<String>) -> Receiver<usize> {
        let (on_result, receiver) = Completion::channel();
        self.perform(Operation::Count {
            value: value.into(),
            on_result,
        });
        receiver
    }

    /// Submits a `begin`.
    pub fn begin(&self) {
        self.perform(Operation::Begin);
    }

    /// Submits a `commit` and returns a channel for its result.
    pub fn commit(&self) -> Receiver<StoreResult<()>> {
        let (on_result, receiver) = Completion::channel();
        self.perform(Operation::Commit { on_result });
        receiver
    }

    /// Submits a `rollback` and returns a channel for its result.
    pub fn rollback(&self) -> Receiver<StoreResult<()>> {
        let (on_result, receiver) = Completion::channel();
        self.perform(Operation::Rollback { on_result });
        receiver
    }

    /// Returns a snapshot of the engine's counters.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        self.shared.stats.snapshot()
    }

    /// Returns the engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

fn worker_loop(shared: &Shared, receiver: &Mutex<Receiver<Job>>) {
    loop {
        let job = receiver.lock().recv();
        match job {
            Ok(job) => run_job(shared, job),
            Err(_) => break,
        }
    }
    tracing::debug!("worker exiting");
}

/// Executes `job`, containing a panic raised by its completion callback.
///
/// The gate pass is released while unwinding, so later operations proceed.
fn run_job(shared: &Shared, job: Job) {
    if panic::catch_unwind(AssertUnwindSafe(|| shared.execute(job))).is_err() {
        tracing::error!("completion callback panicked");
    }
}

impl Shared {
    fn execute(&self, job: Job) {
        let Job {
            mut admission,
            operation,
        } = job;
        let Some(ticket) = admission.ticket.take() else {
            return;
        };
        let seq = ticket.seq();
        let _pass = self.gate.enter(ticket);
        let context = self.context.as_ref();

        match operation {
            Operation::Get { key, on_result } => {
                let result = self.stack.read().get(&key).map(str::to_owned);
                self.stats.record_get(result.is_ok());
                tracing::debug!(seq, %key, found = result.is_ok(), "get");
                on_result.deliver_on(context, result);
            }
            Operation::Set { key, value } => {
                tracing::debug!(seq, %key, "set");
                self.stack.write().set(key, value);
                self.stats.record_set();
            }
            Operation::Delete { key } => {
                tracing::debug!(seq, %key, "delete");
                self.stack.write().delete(key);
                self.stats.record_delete();
            }
            Operation::Count { value, on_result } => {
                let count = self.stack.read().count(&value);
                self.stats.record_count();
                tracing::debug!(seq, count, "count");
                tracing::trace!(seq, %value, "count value");
                on_result.deliver_on(context, count);
            }
            Operation::Begin => {
                let depth = {
                    let mut stack = self.stack.write();
                    stack.begin();
                    stack.depth()
                };
                self.stats.record_begin(depth);
                tracing::debug!(seq, depth, "begin");
            }
            Operation::Commit { on_result } => {
                let (result, depth) = {
                    let mut stack = self.stack.write();
                    (stack.commit(), stack.depth())
                };
                self.stats.record_commit(result.is_ok(), depth);
                if result.is_err() {
                    tracing::warn!(seq, "commit without an open transaction");
                } else {
                    tracing::debug!(seq, depth, "commit");
                }
                on_result.deliver_on(context, result);
            }
            Operation::Rollback { on_result } => {
                let (result, depth) = {
                    let mut stack = self.stack.write();
                    (stack.rollback(), stack.depth())
                };
                self.stats.record_rollback(result.is_ok(), depth);
                if result.is_err() {
                    tracing::warn!(seq, "rollback without an open transaction");
                } else {
                    tracing::debug!(seq, depth, "rollback");
                }
                on_result.deliver_on(context, result);
            }
        }
    }
}

impl Drop for StoreEngine {
    fn drop(&mut self) {
        // Closing the queue lets workers finish what was already submitted.
        self.submit.lock().take();

        let current = thread::current().id();
        for handle in self.workers.drain(..) {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                tracing::error!("worker panicked");
            }
        }
        tracing::info!("store engine stopped");
    }
}

impl fmt::Debug for StoreEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreEngine")
            .field("workers", &self.workers.len())
            .field("gate", &self.shared.gate)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::InlineContext;
    use crate::error::{ErrorKind, StoreError};
    use crate::types::Access;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(1);

    fn engine() -> StoreEngine {
        StoreEngine::new(EngineConfig::new().worker_threads(2))
    }

    #[test]
    fn set_then_get() {
        let engine = engine();
        engine.set("k", "v");
        assert_eq!(engine.get("k").recv_timeout(TIMEOUT).unwrap(), Ok("v".into()));
    }

    #[test]
    fn get_missing() {
        let engine = engine();
        let result = engine.get("missing").recv_timeout(TIMEOUT).unwrap();
        assert_eq!(result, Err(StoreError::value_not_found("missing")));
    }

    #[test]
    fn perform_with_callback() {
        let engine = engine();
        let (sender, receiver) = mpsc::channel();
        engine.perform(Operation::set("k", "v"));
        engine.perform(Operation::get("k", move |result| {
            sender.send(result).unwrap();
        }));
        assert_eq!(receiver.recv_timeout(TIMEOUT).unwrap(), Ok("v".to_owned()));
    }

    #[test]
    fn commit_without_transaction_fails() {
        let engine = engine();
        let commit = engine.commit().recv_timeout(TIMEOUT).unwrap();
        let rollback = engine.rollback().recv_timeout(TIMEOUT).unwrap();
        assert_eq!(commit.unwrap_err().kind(), ErrorKind::NothingToCommit);
        assert_eq!(rollback.unwrap_err().kind(), ErrorKind::NothingToRollback);
    }

    #[test]
    fn nested_transactions() {
        let engine = engine();
        engine.set("k", "a");
        engine.begin();
        engine.set("k", "b");
        assert_eq!(engine.get("k").recv_timeout(TIMEOUT).unwrap(), Ok("b".into()));
        engine.rollback().recv_timeout(TIMEOUT).unwrap().unwrap();
        assert_eq!(engine.get("k").recv_timeout(TIMEOUT).unwrap(), Ok("a".into()));
    }

    #[test]
    fn stats_track_executed_operations() {
        let engine = engine();
        engine.set("k", "v");
        engine.begin();
        engine.get("nope").recv_timeout(TIMEOUT).unwrap().unwrap_err();
        engine.count("v").recv_timeout(TIMEOUT).unwrap();

        let stats = engine.stats();
        assert_eq!(stats.sets, 1);
        assert_eq!(stats.begins, 1);
        assert_eq!(stats.gets, 1);
        assert_eq!(stats.get_misses, 1);
        assert_eq!(stats.counts, 1);
        assert_eq!(stats.depth, 1);
    }

    #[test]
    fn inline_context_delivers_on_worker() {
        let engine =
            StoreEngine::with_context(EngineConfig::new().worker_threads(1), Arc::new(InlineContext));
        let (sender, receiver) = mpsc::channel();
        engine.perform(Operation::count("v", move |_| {
            let name = thread::current().name().map(str::to_owned);
            sender.send(name).unwrap();
        }));
        let name = receiver.recv_timeout(TIMEOUT).unwrap();
        assert_eq!(name.as_deref(), Some("txstore-worker-0"));
    }

    #[test]
    fn drop_finishes_submitted_operations() {
        let engine = engine();
        engine.set("k", "v");
        let pending = engine.get("k");
        drop(engine);
        assert_eq!(pending.recv_timeout(TIMEOUT).unwrap(), Ok("v".into()));
    }

    #[test]
    fn panicking_callback_leaves_engine_usable() {
        let engine =
            StoreEngine::with_context(EngineConfig::new().worker_threads(1), Arc::new(InlineContext));
        engine.perform(Operation::count("v", |_| panic!("callback failed")));
        engine.set("k", "v");

        let (sender, receiver) = mpsc::channel();
        let engine = Arc::new(engine);
        let submitter = {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let result = engine.get("k").recv_timeout(TIMEOUT);
                sender.send(result).unwrap();
            })
        };

        let result = receiver.recv_timeout(TIMEOUT).unwrap();
        assert_eq!(result.unwrap(), Ok("v".into()));
        submitter.join().unwrap();
        assert_eq!(engine.stats().counts, 1);
        assert_eq!(engine.stats().sets, 1);
    }

    #[test]
    fn panicking_callback_on_submitting_thread_is_contained() {
        let engine =
            StoreEngine::with_context(EngineConfig::new().worker_threads(1), Arc::new(InlineContext));
        // Route submissions to the caller, as when no worker could start.
        engine.submit.lock().take();

        engine.perform(Operation::get("missing", |_| panic!("callback failed")));
        engine.set("k", "v");
        assert_eq!(engine.get("k").recv_timeout(TIMEOUT).unwrap(), Ok("v".into()));
        assert_eq!(engine.shared.gate.outstanding(), 0);
    }

    #[test]
    fn dropped_job_releases_its_ticket() {
        let engine = engine();
        let job = Job {
            admission: Admission {
                ticket: Some(engine.shared.gate.admit(Access::Write)),
                shared: Arc::clone(&engine.shared),
            },
            operation: Operation::Begin,
        };
        assert_eq!(engine.shared.gate.outstanding(), 1);

        drop(job);
        assert_eq!(engine.shared.gate.outstanding(), 0);

        engine.set("k", "v");
        assert_eq!(engine.get("k").recv_timeout(TIMEOUT).unwrap(), Ok("v".into()));
        assert_eq!(engine.stats().begins, 0);
    }

    #[test]
    fn gate_is_empty_when_idle() {
        let engine = engine();
        engine.set("a", "1");
        engine.count("1").recv_timeout(TIMEOUT).unwrap();
        // Delivery happens while the pass is still held; give it a moment.
        thread::sleep(Duration::from_millis(20));
        assert_eq!(engine.shared.gate.outstanding(), 0);
    }
}
