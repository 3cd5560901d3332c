//! Error types for descriptions and configuration.

// These warnings are false positives - the fields are used by derive macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while reading descriptions or configuration.
#[derive(Error, Debug, Diagnostic)]
pub enum SchemaError {
    /// Error reading a file.
    #[error("failed to read file: {path}")]
    #[diagnostic(code(tablewright::schema::io_error))]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A member cannot be classified.
    #[error("invalid member `{table}.{member}`: {message}")]
    #[diagnostic(code(tablewright::schema::invalid_member))]
    InvalidMember {
        table: String,
        member: String,
        message: String,
    },

    /// A member named after a lifecycle phase is not a hook.
    #[error("member `{table}.{phase}` is named after a lifecycle phase but is a {kind}, not a hook")]
    #[diagnostic(
        code(tablewright::schema::invalid_hook),
        help("members named before_/after_ insert/update/delete must be hooks")
    )]
    InvalidHook {
        table: String,
        phase: String,
        kind: String,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    #[diagnostic(code(tablewright::schema::config_error))]
    ConfigError { message: String },

    /// TOML parsing error.
    #[error("failed to parse TOML")]
    #[diagnostic(code(tablewright::schema::toml_error))]
    TomlError {
        #[source]
        source: toml::de::Error,
    },
}

impl SchemaError {
    /// Create an invalid member error.
    pub fn invalid_member(
        table: impl Into<String>,
        member: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidMember {
            table: table.into(),
            member: member.into(),
            message: message.into(),
        }
    }

    /// Create an invalid hook error.
    pub fn invalid_hook(
        table: impl Into<String>,
        phase: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self::InvalidHook {
            table: table.into(),
            phase: phase.into(),
            kind: kind.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }
}
