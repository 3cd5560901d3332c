//! Build error types and result alias.

// These warnings are false positives - the fields are used by derive macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use tablewright_migrate::MigrationError;
use tablewright_schema::{CallbackError, LayerError, SchemaError, ValidatorError};
use thiserror::Error;

/// Result type alias for build operations.
pub type BuildResult<T> = Result<T, BuildError>;

/// The callback a [`BuildError::Callback`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackStage {
    /// The table's own `_on_define` callback.
    OnDefine,
    /// The group's post-definition-table callback.
    OnDefineTable,
    /// The group's post-definition-model callback.
    OnDefineModel,
}

impl CallbackStage {
    /// Get the stage name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnDefine => "_on_define",
            Self::OnDefineTable => "on_define_table",
            Self::OnDefineModel => "on_define_model",
        }
    }
}

impl std::fmt::Display for CallbackStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while compiling tables.
#[derive(Error, Debug, Diagnostic)]
pub enum BuildError {
    /// A description could not be classified.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaError),

    /// The relational layer refused a definition.
    #[error("Layer error: {0}")]
    #[diagnostic(code(tablewright::build::layer))]
    Layer(#[from] LayerError),

    /// A deferred validator could not be built.
    #[error("cannot build validators of `{table}.{field}`")]
    #[diagnostic(code(tablewright::build::validator))]
    Validator {
        table: String,
        field: String,
        #[source]
        source: ValidatorError,
    },

    /// Index migration was requested without a migrator.
    #[error("index migration requested for `{table}` but no index migrator was supplied")]
    #[diagnostic(
        code(tablewright::build::missing_index_migrator),
        help("pass an index migrator to the builder or disable index migration")
    )]
    MissingIndexMigrator { table: String },

    /// An index references a field the table does not have.
    #[error("index `{table}.{index}` references unknown field `{column}`")]
    #[diagnostic(code(tablewright::build::unknown_index_column))]
    UnknownIndexColumn {
        table: String,
        index: String,
        column: String,
    },

    /// A table option has a value of the wrong shape.
    #[error("invalid option `{option}` on `{table}`: {message}")]
    #[diagnostic(code(tablewright::build::invalid_option))]
    InvalidOption {
        table: String,
        option: String,
        message: String,
    },

    /// A post-definition callback failed.
    #[error("`{stage}` callback failed for `{table}`")]
    #[diagnostic(code(tablewright::build::callback))]
    Callback {
        table: String,
        stage: CallbackStage,
        #[source]
        source: CallbackError,
    },

    /// The index migrator failed.
    #[error("index migration failed for `{table}`")]
    #[diagnostic(code(tablewright::build::migration))]
    Migration {
        table: String,
        #[source]
        source: MigrationError,
    },
}

impl BuildError {
    /// Create an invalid option error.
    pub fn invalid_option(
        table: impl Into<String>,
        option: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidOption {
            table: table.into(),
            option: option.into(),
            message: message.into(),
        }
    }

    /// Create a callback error.
    pub fn callback(table: impl Into<String>, stage: CallbackStage, source: CallbackError) -> Self {
        Self::Callback {
            table: table.into(),
            stage,
            source,
        }
    }

    /// Check if this is a configuration error rather than a declaration error.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::MissingIndexMigrator { .. } | Self::Schema(SchemaError::ConfigError { .. })
        )
    }
}

/// Result type alias for in-memory table operations.
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Errors raised by the in-memory layer's row operations.
#[derive(Error, Debug)]
pub enum MemoryError {
    /// A row names a column the table does not store.
    #[error("table `{table}` has no stored column `{column}`")]
    UnknownColumn { table: String, column: String },

    /// A row id does not exist.
    #[error("row {id} not found in `{table}`")]
    RowNotFound { table: String, id: u64 },

    /// A row id is already taken.
    #[error("duplicate key {id} in `{table}`")]
    DuplicateKey { table: String, id: u64 },

    /// A value failed a field validator.
    #[error("`{table}.{column}` failed `{validator}`: {message}")]
    Validation {
        table: String,
        column: String,
        validator: String,
        message: String,
    },

    /// A row supplies an id that is not a usable row id.
    #[error("invalid row id `{value}` in `{table}`")]
    InvalidId { table: String, value: String },

    /// An update tried to change the `id` column.
    #[error("the `id` column of `{table}` cannot be updated")]
    KeyUpdate { table: String },

    /// A row method does not exist.
    #[error("table `{table}` has no row method `{method}`")]
    UnknownMethod { table: String, method: String },

    /// A hook or method failed.
    #[error(transparent)]
    Callback(#[from] CallbackError),
}
