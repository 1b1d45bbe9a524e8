//! Core type definitions for the store.

use std::fmt;

/// The seven kinds of operation the engine accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Point lookup.
    Get,
    /// Insert or overwrite.
    Set,
    /// Delete.
    Delete,
    /// Value-occurrence count.
    Count,
    /// Open a nested transaction.
    Begin,
    /// Merge the innermost transaction into its parent.
    Commit,
    /// Discard the innermost transaction.
    Rollback,
}

impl OperationKind {
    /// All operation kinds.
    pub const ALL: [OperationKind; 7] = [
        Self::Get,
        Self::Set,
        Self::Delete,
        Self::Count,
        Self::Begin,
        Self::Commit,
        Self::Rollback,
    ];

    /// Returns how the operation touches the transaction stack.
    #[must_use]
    pub const fn access(self) -> Access {
        match self {
            Self::Get | Self::Count => Access::Read,
            Self::Set | Self::Delete | Self::Begin | Self::Commit | Self::Rollback => {
                Access::Write
            }
        }
    }

    /// Returns the upper-case command name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Set => "SET",
            Self::Delete => "DELETE",
            Self::Count => "COUNT",
            Self::Begin => "BEGIN",
            Self::Commit => "COMMIT",
            Self::Rollback => "ROLLBACK",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shared or exclusive access to the transaction stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    /// May run alongside other reads.
    Read,
    /// Runs alone, after everything submitted before it.
    Write,
}

impl Access {
    /// Returns true for exclusive access.
    #[must_use]
    pub const fn is_write(self) -> bool {
        matches!(self, Self::Write)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_are_get_and_count() {
        let reads: Vec<_> = OperationKind::ALL
            .iter()
            .filter(|kind| kind.access() == Access::Read)
            .collect();
        assert_eq!(reads, vec![&OperationKind::Get, &OperationKind::Count]);
    }

    #[test]
    fn display_uses_command_name() {
        assert_eq!(OperationKind::Rollback.to_string(), "ROLLBACK");
        assert!(OperationKind::Begin.access().is_write());
    }
}
