//! Result delivery.
//!
//! Operations that produce a result carry a [`Completion`]. When the engine
//! finishes the operation it hands the completion, bound to its result, to a
//! [`CompletionContext`], which decides where the callback runs.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

/// A unit of work handed to a completion context.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Where completion callbacks are run.
pub trait CompletionContext: Send + Sync {
    /// Schedules `task` to run on this context.
    fn dispatch(&self, task: Task);
}

/// Runs every task on one dedicated delivery thread, in dispatch order.
///
/// This is the default context. Since writes finish in submission order and
/// tasks are delivered FIFO, write results reach callers in submission order.
pub struct SerialContext {
    sender: Option<Sender<Task>>,
    handle: Option<JoinHandle<()>>,
}

impl SerialContext {
    /// Starts a delivery thread with the default name.
    #[must_use]
    pub fn new() -> Self {
        Self::named("txstore-completion")
    }

    /// Starts a delivery thread with the given name.
    #[must_use]
    pub fn named(name: &str) -> Self {
        let (sender, receiver) = mpsc::channel::<Task>();
        let handle = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || deliver(receiver))
            .map_err(|err| tracing::error!(%err, "failed to spawn completion thread"))
            .ok();

        Self {
            sender: handle.as_ref().map(|_| sender),
            handle,
        }
    }
}

fn deliver(receiver: Receiver<Task>) {
    while let Ok(task) = receiver.recv() {
        if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
            tracing::error!("completion callback panicked");
        }
    }
}

impl Default for SerialContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionContext for SerialContext {
    fn dispatch(&self, task: Task) {
        match &self.sender {
            Some(sender) => {
                if let Err(mpsc::SendError(task)) = sender.send(task) {
                    tracing::warn!("completion thread gone, running callback inline");
                    task();
                }
            }
            // No delivery thread could be started.
            None => task(),
        }
    }
}

impl Drop for SerialContext {
    fn drop(&mut self) {
        // Closing the channel lets the thread drain what is queued and exit.
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

impl fmt::Debug for SerialContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialContext")
            .field("thread", &self.handle.as_ref().and_then(|h| h.thread().name()))
            .finish()
    }
}

/// Runs each task immediately on the thread that finished the operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineContext;

impl CompletionContext for InlineContext {
    fn dispatch(&self, task: Task) {
        task();
    }
}

/// One-shot receiver of an operation's result.
pub struct Completion<T> {
    callback: Box<dyn FnOnce(T) + Send + 'static>,
}

impl<T: Send + 'static> Completion<T> {
    /// Wraps a callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce(T) + Send + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Creates a completion that forwards its result into a channel.
    ///
    /// If the receiver has been dropped the result is discarded.
    #[must_use]
    pub fn channel() -> (Self, Receiver<T>) {
        let (sender, receiver) = mpsc::channel();
        let completion = Self::new(move |value| {
            let _ = sender.send(value);
        });
        (completion, receiver)
    }

    /// Invokes the callback with `value`.
    pub fn complete(self, value: T) {
        (self.callback)(value);
    }

    /// Binds `value` to the callback and dispatches it on `context`.
    pub(crate) fn deliver_on(self, context: &dyn CompletionContext, value: T) {
        context.dispatch(Box::new(move || self.complete(value)));
    }
}

impl<T> fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Completion")
    }
}
