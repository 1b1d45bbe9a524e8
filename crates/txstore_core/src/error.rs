//! Error types for the transactional store.

use std::fmt;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Transaction lifecycle operation that can fail for lack of an open transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionOp {
    /// Merge the innermost transaction into its parent.
    Commit,
    /// Discard the innermost transaction.
    Rollback,
}

impl fmt::Display for TransactionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Commit => f.write_str("commit"),
            Self::Rollback => f.write_str("rollback"),
        }
    }
}

/// Stable identity of a [`StoreError`], independent of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A lookup found no visible value.
    ValueNotFound,
    /// `commit` was issued with only the root record on the stack.
    NothingToCommit,
    /// `rollback` was issued with only the root record on the stack.
    NothingToRollback,
}

/// Errors reported through an operation's completion.
///
/// None of these leave the engine in a bad state; each one is reported
/// exactly once to the caller that submitted the operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No value is visible for the key.
    #[error("No record is found for key '{key}'.")]
    ValueNotFound {
        /// The key that was looked up.
        key: String,
    },

    /// Commit or rollback was issued outside of any `begin`.
    #[error("{}", no_active_message(.operation))]
    NoActiveTransaction {
        /// Which lifecycle operation failed.
        operation: TransactionOp,
    },
}

fn no_active_message(operation: &TransactionOp) -> &'static str {
    match operation {
        TransactionOp::Commit => "Nothing to commit. No transaction(s) pending.",
        TransactionOp::Rollback => "Nothing to discard. No transaction(s) pending.",
    }
}

impl StoreError {
    /// Creates a value-not-found error.
    pub fn value_not_found(key: impl Into<String>) -> Self {
        Self::ValueNotFound { key: key.into() }
    }

    /// Creates a no-active-transaction error for `commit`.
    pub fn nothing_to_commit() -> Self {
        Self::NoActiveTransaction {
            operation: TransactionOp::Commit,
        }
    }

    /// Creates a no-active-transaction error for `rollback`.
    pub fn nothing_to_rollback() -> Self {
        Self::NoActiveTransaction {
            operation: TransactionOp::Rollback,
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ValueNotFound { .. } => ErrorKind::ValueNotFound,
            Self::NoActiveTransaction {
                operation: TransactionOp::Commit,
            } => ErrorKind::NothingToCommit,
            Self::NoActiveTransaction {
                operation: TransactionOp::Rollback,
            } => ErrorKind::NothingToRollback,
        }
    }

    /// Returns the offending key, if the error carries one.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::ValueNotFound { key } => Some(key),
            Self::NoActiveTransaction { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_not_found_message() {
        let err = StoreError::value_not_found("foo");
        assert_eq!(err.to_string(), "No record is found for key 'foo'.");
        assert_eq!(err.kind(), ErrorKind::ValueNotFound);
        assert_eq!(err.key(), Some("foo"));
    }

    #[test]
    fn no_active_transaction_variants_differ() {
        let commit = StoreError::nothing_to_commit();
        let rollback = StoreError::nothing_to_rollback();

        assert_ne!(commit, rollback);
        assert_eq!(commit.kind(), ErrorKind::NothingToCommit);
        assert_eq!(rollback.kind(), ErrorKind::NothingToRollback);
        assert_eq!(
            commit.to_string(),
            "Nothing to commit. No transaction(s) pending."
        );
        assert_eq!(
            rollback.to_string(),
            "Nothing to discard. No transaction(s) pending."
        );
        assert!(commit.key().is_none());
    }
}
