//! # txstore core
//!
//! Nested-transaction, in-memory key-value engine.
//!
//! This crate provides:
//! - [`TransactionRecord`] and [`TransactionStack`]: the layered state behind
//!   `begin` / `commit` / `rollback`
//! - [`ConcurrencyGate`]: ordered single-writer / multi-reader admission
//! - [`StoreEngine`]: the asynchronous operation API
//! - [`CompletionContext`]: where results are delivered
//!
//! Keys and values are strings. Nothing is persisted.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod completion;
mod config;
mod engine;
mod error;
mod operation;
mod stats;
mod transaction;
mod types;

pub use completion::{Completion, CompletionContext, InlineContext, SerialContext, Task};
pub use config::EngineConfig;
pub use engine::{ConcurrencyGate, GatePass, StoreEngine, Ticket};
pub use error::{ErrorKind, StoreError, StoreResult, TransactionOp};
pub use operation::Operation;
pub use stats::EngineStats;
pub use transaction::{TransactionRecord, TransactionStack};
pub use types::{Access, OperationKind};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
