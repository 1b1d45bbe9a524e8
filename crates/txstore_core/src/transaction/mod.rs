//! Nested transaction layers.
//!
//! Each `begin` pushes a [`TransactionRecord`] onto the [`TransactionStack`].
//! `commit` folds the top record into its parent; `rollback` throws it away.
//! The root record is the committed global state and is never removed.

mod record;
mod stack;

pub use record::TransactionRecord;
pub use stack::TransactionStack;
