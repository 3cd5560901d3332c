//! Error types for index migration.

use thiserror::Error;

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Errors that can occur while reconciling indexes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrationError {
    /// The index store failed.
    #[error("Index store error: {0}")]
    Store(String),

    /// An index plan entry is malformed.
    #[error("Invalid index `{index}` on `{table}`: {message}")]
    InvalidIndex {
        /// Table name.
        table: String,
        /// Index name.
        index: String,
        /// What is wrong with it.
        message: String,
    },

    /// Two plan entries share a name.
    #[error("Index `{index}` is declared twice on `{table}`")]
    DuplicateIndex {
        /// Table name.
        table: String,
        /// Index name.
        index: String,
    },

    /// General migration error.
    #[error("Migration error: {0}")]
    Other(String),
}

impl MigrationError {
    /// Create a store error.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create an invalid index error.
    pub fn invalid_index(
        table: impl Into<String>,
        index: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidIndex {
            table: table.into(),
            index: index.into(),
            message: message.into(),
        }
    }

    /// Create an other error.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}
