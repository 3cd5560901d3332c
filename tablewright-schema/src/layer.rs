//! Interfaces of the relational layer that compiled tables live in.
//!
//! The compiler never stores rows or generates SQL. It hands a
//! [`TableDefinition`] to a [`Database`] and decorates the returned
//! [`TableHandle`] with hooks and methods.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use indexmap::IndexMap;
use smol_str::SmolStr;
use thiserror::Error;

use crate::ast::{
    CallbackError, CallbackResult, Hook, Phase, RowMethod, TableMethod, Value, VirtualGetter,
    next_id,
};
use crate::validator::Validator;

/// Result type for relational layer operations.
pub type LayerResult<T> = Result<T, LayerError>;

/// Errors reported by the relational layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayerError {
    /// A table with this name exists with an incompatible definition.
    #[error("table `{table}` is already defined with an incompatible definition: {message}")]
    Incompatible { table: String, message: String },

    /// The layer refused the definition.
    #[error("table `{table}` was rejected: {message}")]
    Rejected { table: String, message: String },

    /// Any other layer failure.
    #[error("relational layer error: {0}")]
    Other(String),
}

impl LayerError {
    /// Create an incompatible definition error.
    pub fn incompatible(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Incompatible {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a rejected definition error.
    pub fn rejected(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            table: table.into(),
            message: message.into(),
        }
    }
}

static DATABASE_TOKENS: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a database instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatabaseToken(u64);

impl DatabaseToken {
    /// Allocate a fresh, process-unique token.
    pub fn next() -> Self {
        Self(next_id(&DATABASE_TOKENS))
    }

    /// Get the raw token value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// A stored column as handed to the layer.
#[derive(Clone)]
pub struct PlainField {
    /// Column name.
    pub name: SmolStr,
    /// Type arguments; the first one is the type tag.
    pub type_args: Vec<SmolStr>,
    /// Keyword options (`required`, `default`, `unique`, ...).
    pub options: IndexMap<SmolStr, Value>,
    /// Resolved validators.
    pub validators: Vec<Arc<dyn Validator>>,
}

impl PlainField {
    /// Type tag used when a field declares no type.
    pub const DEFAULT_TYPE: &'static str = "string";

    /// Get the type tag.
    pub fn field_type(&self) -> &str {
        self.type_args
            .first()
            .map(SmolStr::as_str)
            .unwrap_or(Self::DEFAULT_TYPE)
    }

    /// Get a keyword option.
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }
}

impl std::fmt::Debug for PlainField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let validators: Vec<&str> = self.validators.iter().map(|v| v.name()).collect();
        f.debug_struct("PlainField")
            .field("name", &self.name)
            .field("type_args", &self.type_args)
            .field("options", &self.options)
            .field("validators", &validators)
            .finish()
    }
}

/// A field definition accepted by the layer's field constructors.
#[derive(Debug, Clone)]
pub enum FieldDefinition {
    /// A stored column.
    Plain(PlainField),
    /// A computed, non-stored column.
    Virtual {
        /// Column name.
        name: SmolStr,
        /// Value producer.
        getter: VirtualGetter,
    },
    /// A row-bound method.
    Method {
        /// Method name.
        name: SmolStr,
        /// Callable.
        method: RowMethod,
    },
}

impl FieldDefinition {
    /// Construct a stored column.
    pub fn plain(
        name: impl Into<SmolStr>,
        type_args: Vec<SmolStr>,
        options: IndexMap<SmolStr, Value>,
        validators: Vec<Arc<dyn Validator>>,
    ) -> Self {
        Self::Plain(PlainField {
            name: name.into(),
            type_args,
            options,
            validators,
        })
    }

    /// Construct a computed column.
    pub fn virtual_field(name: impl Into<SmolStr>, getter: VirtualGetter) -> Self {
        Self::Virtual {
            name: name.into(),
            getter,
        }
    }

    /// Construct a row method.
    pub fn method(name: impl Into<SmolStr>, method: RowMethod) -> Self {
        Self::Method {
            name: name.into(),
            method,
        }
    }

    /// Get the field name.
    pub fn name(&self) -> &str {
        match self {
            Self::Plain(p) => p.name.as_str(),
            Self::Virtual { name, .. } | Self::Method { name, .. } => name.as_str(),
        }
    }

    /// Check if this is a stored column.
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Plain(_))
    }

    /// Get the stored column, if this is one.
    pub fn as_plain(&self) -> Option<&PlainField> {
        match self {
            Self::Plain(p) => Some(p),
            _ => None,
        }
    }

    /// Compare the shape (kind, name, type arguments, options) of two fields.
    ///
    /// Callables and validators are not comparable and are ignored.
    pub fn same_shape(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Plain(a), Self::Plain(b)) => {
                a.name == b.name && a.type_args == b.type_args && a.options == b.options
            }
            (Self::Virtual { name: a, .. }, Self::Virtual { name: b, .. })
            | (Self::Method { name: a, .. }, Self::Method { name: b, .. }) => a == b,
            _ => false,
        }
    }
}

/// Everything the layer needs to define or open one table.
#[derive(Debug, Clone)]
pub struct TableDefinition {
    /// Logical name used for lookups.
    pub name: SmolStr,
    /// Ordered fields: own fields first, then signature fields.
    pub fields: Vec<FieldDefinition>,
    /// Physical storage name override (`rname`).
    pub physical_name: Option<SmolStr>,
    /// Primary key override. `None` defers to the layer's default.
    pub primary_key: Option<Vec<SmolStr>>,
    /// Remaining opaque table options, passed through verbatim.
    pub options: IndexMap<SmolStr, Value>,
}

impl TableDefinition {
    /// Create a definition with no options.
    pub fn new(name: impl Into<SmolStr>, fields: Vec<FieldDefinition>) -> Self {
        Self {
            name: name.into(),
            fields,
            physical_name: None,
            primary_key: None,
            options: IndexMap::new(),
        }
    }

    /// Get the physical name, falling back to the logical name.
    pub fn physical_name(&self) -> &str {
        self.physical_name.as_deref().unwrap_or(&self.name)
    }

    /// Get a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Get all field names, in order.
    pub fn field_names(&self) -> Vec<SmolStr> {
        self.fields.iter().map(|f| SmolStr::new(f.name())).collect()
    }
}

/// A table handle owned by the relational layer.
///
/// Handles are shared (`Arc`), so mutation goes through `&self`.
pub trait TableHandle: Send + Sync {
    /// Logical table name.
    fn name(&self) -> &str;

    /// Physical storage name.
    fn physical_name(&self) -> &str;

    /// Names of all fields, in definition order.
    fn field_names(&self) -> Vec<SmolStr>;

    /// Primary key columns, or `None` for the layer's implicit key.
    fn primary_key(&self) -> Option<Vec<SmolStr>>;

    /// Append a hook to a phase. Existing hooks are never replaced.
    fn add_hook(&self, phase: Phase, hook: Hook);

    /// Hooks attached to a phase, in attachment order.
    fn hooks(&self, phase: Phase) -> Vec<Hook>;

    /// Register a table-level method under a name.
    fn register_method(&self, name: &str, method: TableMethod);

    /// Look up a registered table-level method.
    fn method(&self, name: &str) -> Option<TableMethod>;

    /// Names of all registered table-level methods.
    fn method_names(&self) -> Vec<SmolStr>;

    /// Downcast support for layer-specific access.
    fn as_any(&self) -> &dyn Any;
}

impl<'a> dyn TableHandle + 'a {
    /// Call a registered table method.
    pub fn call_method(&self, name: &str, args: &[Value]) -> CallbackResult<Value> {
        let method = self
            .method(name)
            .ok_or_else(|| CallbackError::new(format!("table `{}` has no method `{name}`", self.name())))?;
        method.call(self, args)
    }
}

impl std::fmt::Debug for dyn TableHandle + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableHandle")
            .field("name", &self.name())
            .field("physical_name", &self.physical_name())
            .finish_non_exhaustive()
    }
}

/// A database instance in the relational layer.
pub trait Database: Send + Sync {
    /// Stable identity of this instance.
    fn token(&self) -> DatabaseToken;

    /// Define a table, or open it if an equivalent definition already exists.
    fn define_table(&self, definition: TableDefinition) -> LayerResult<Arc<dyn TableHandle>>;

    /// Build a standalone field source that is not registered as a table.
    ///
    /// Returns the fields in the order other tables should receive them.
    fn define_field_source(&self, definition: TableDefinition) -> LayerResult<Vec<FieldDefinition>>;

    /// Look up a defined table by logical name.
    fn table(&self, name: &str) -> Option<Arc<dyn TableHandle>>;

    /// Downcast support for layer-specific access.
    fn as_any(&self) -> &dyn Any;
}
