//! Field validators and the deferral wrapper for database-dependent ones.
//!
//! Validator implementations live outside this crate. A field lists its
//! validators as [`Requirement`]s; a requirement that needs the target
//! database is declared as [`Requirement::Deferred`] and resolved once the
//! database is known, during classification.

use std::sync::Arc;

use thiserror::Error;

use crate::ast::Value;
use crate::layer::Database;

/// A validator attached to a field.
pub trait Validator: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Validate a value, returning an error message on failure.
    fn validate(&self, value: &Value) -> Result<(), String>;
}

/// Error raised while resolving a deferred validator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot resolve validator: {message}")]
pub struct ValidatorError {
    /// Error message.
    pub message: String,
}

impl ValidatorError {
    /// Create a new validator error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Type alias for deferred validator factories.
pub type ValidatorFactory =
    Arc<dyn Fn(&dyn Database) -> Result<Arc<dyn Validator>, ValidatorError> + Send + Sync>;

/// A validator that can only be built once the database exists.
#[derive(Clone)]
pub struct DeferredValidator {
    factory: ValidatorFactory,
}

impl DeferredValidator {
    /// Create a deferred validator from a factory.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&dyn Database) -> Result<Arc<dyn Validator>, ValidatorError> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(f),
        }
    }

    /// Build the concrete validator against a database.
    pub fn resolve(&self, db: &dyn Database) -> Result<Arc<dyn Validator>, ValidatorError> {
        (self.factory)(db)
    }
}

impl std::fmt::Debug for DeferredValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredValidator").finish_non_exhaustive()
    }
}

/// One entry of a field's `requires` list.
#[derive(Clone)]
pub enum Requirement {
    /// A validator available at declaration time.
    Ready(Arc<dyn Validator>),
    /// A validator that needs the database.
    Deferred(DeferredValidator),
}

impl Requirement {
    /// Wrap a concrete validator.
    pub fn ready<V: Validator + 'static>(validator: V) -> Self {
        Self::Ready(Arc::new(validator))
    }

    /// Check if this requirement still needs the database.
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    /// Resolve into a concrete validator. Ready validators are returned unchanged.
    pub fn resolve(&self, db: &dyn Database) -> Result<Arc<dyn Validator>, ValidatorError> {
        match self {
            Self::Ready(v) => Ok(Arc::clone(v)),
            Self::Deferred(d) => d.resolve(db),
        }
    }
}

impl std::fmt::Debug for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(v) => f.debug_tuple("Ready").field(&v.name()).finish(),
            Self::Deferred(d) => f.debug_tuple("Deferred").field(d).finish(),
        }
    }
}

impl From<DeferredValidator> for Requirement {
    fn from(d: DeferredValidator) -> Self {
        Self::Deferred(d)
    }
}

impl From<Arc<dyn Validator>> for Requirement {
    fn from(v: Arc<dyn Validator>) -> Self {
        Self::Ready(v)
    }
}

/// Resolve every requirement of a field, preserving order.
pub fn resolve_all(
    requirements: &[Requirement],
    db: &dyn Database,
) -> Result<Vec<Arc<dyn Validator>>, ValidatorError> {
    requirements.iter().map(|r| r.resolve(db)).collect()
}
