//! The operation envelope accepted by [`StoreEngine::perform`](crate::StoreEngine::perform).

use crate::completion::Completion;
use crate::error::StoreResult;
use crate::types::{Access, OperationKind};
use std::fmt;

/// A request to the engine.
///
/// `Get`, `Count`, `Commit` and `Rollback` carry a completion that receives
/// their result. `Set`, `Delete` and `Begin` are fire-and-forget.
pub enum Operation {
    /// Look up the visible value for `key`.
    Get {
        /// Key to look up.
        key: String,
        /// Receives the value or `ValueNotFound`.
        on_result: Completion<StoreResult<String>>,
    },
    /// Set `key` to `value` in the innermost transaction.
    Set {
        /// Key to set.
        key: String,
        /// New value.
        value: String,
    },
    /// Delete `key` in the innermost transaction.
    Delete {
        /// Key to delete.
        key: String,
    },
    /// Count visible entries equal to `value`.
    Count {
        /// Value to count.
        value: String,
        /// Receives the count.
        on_result: Completion<usize>,
    },
    /// Open a nested transaction.
    Begin,
    /// Merge the innermost transaction into its parent.
    Commit {
        /// Receives success or `NoActiveTransaction`.
        on_result: Completion<StoreResult<()>>,
    },
    /// Discard the innermost transaction.
    Rollback {
        /// Receives success or `NoActiveTransaction`.
        on_result: Completion<StoreResult<()>>,
    },
}

impl Operation {
    /// Builds a `Get` delivering to `callback`.
    pub fn get<F>(key: impl Into<String>, callback: F) -> Self
    where
        F: FnOnce(StoreResult<String>) + Send + 'static,
    {
        Self::Get {
            key: key.into(),
            on_result: Completion::new(callback),
        }
    }

    /// Builds a `Set`.
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Set {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Builds a `Delete`.
    pub fn delete(key: impl Into<String>) -> Self {
        Self::Delete { key: key.into() }
    }

    /// Builds a `Count` delivering to `callback`.
    pub fn count<F>(value: impl Into<String>, callback: F) -> Self
    where
        F: FnOnce(usize) + Send + 'static,
    {
        Self::Count {
            value: value.into(),
            on_result: Completion::new(callback),
        }
    }

    /// Builds a `Commit` delivering to `callback`.
    pub fn commit<F>(callback: F) -> Self
    where
        F: FnOnce(StoreResult<()>) + Send + 'static,
    {
        Self::Commit {
            on_result: Completion::new(callback),
        }
    }

    /// Builds a `Rollback` delivering to `callback`.
    pub fn rollback<F>(callback: F) -> Self
    where
        F: FnOnce(StoreResult<()>) + Send + 'static,
    {
        Self::Rollback {
            on_result: Completion::new(callback),
        }
    }

    /// Returns the operation kind.
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Get { .. } => OperationKind::Get,
            Self::Set { .. } => OperationKind::Set,
            Self::Delete { .. } => OperationKind::Delete,
            Self::Count { .. } => OperationKind::Count,
            Self::Begin => OperationKind::Begin,
            Self::Commit { .. } => OperationKind::Commit,
            Self::Rollback { .. } => OperationKind::Rollback,
        }
    }

    /// Returns how the operation touches the stack.
    #[must_use]
    pub fn access(&self) -> Access {
        self.kind().access()
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get { key, .. } => f.debug_struct("Get").field("key", key).finish(),
            Self::Set { key, .. } => f.debug_struct("Set").field("key", key).finish(),
            Self::Delete { key } => f.debug_struct("Delete").field("key", key).finish(),
            Self::Count { .. } => f.write_str("Count"),
            Self::Begin => f.write_str("Begin"),
            Self::Commit { .. } => f.write_str("Commit"),
            Self::Rollback { .. } => f.write_str("Rollback"),
        }
    }
}
