//! Index declarations.
//!
//! An [`Index`] is plain data. It creates nothing by itself: the compiler
//! turns it into a plan entry for an external index migrator.

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::Value;

/// A column referenced by an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    /// A literal column name, used as given.
    Column(SmolStr),
    /// A reference to a field declared on the table, checked when the plan is extracted.
    Field(SmolStr),
}

impl ColumnRef {
    /// Create a reference to a declared field.
    pub fn field(name: impl Into<SmolStr>) -> Self {
        Self::Field(name.into())
    }

    /// Get the referenced column name.
    pub fn name(&self) -> &str {
        match self {
            Self::Column(name) | Self::Field(name) => name.as_str(),
        }
    }

    /// Check whether this reference must resolve to a declared field.
    pub fn is_field(&self) -> bool {
        matches!(self, Self::Field(_))
    }
}

impl From<&str> for ColumnRef {
    fn from(s: &str) -> Self {
        Self::Column(s.into())
    }
}

impl From<String> for ColumnRef {
    fn from(s: String) -> Self {
        Self::Column(s.into())
    }
}

impl From<SmolStr> for ColumnRef {
    fn from(s: SmolStr) -> Self {
        Self::Column(s)
    }
}

/// An index over one or more columns.
///
/// Indexes are unique unless [`Index::unique`] says otherwise, and the
/// `unique` option is always present in [`Index::options`].
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    /// Indexed columns, in order.
    pub columns: Vec<ColumnRef>,
    /// Index options.
    pub options: IndexMap<SmolStr, Value>,
}

impl Index {
    /// Option key holding the uniqueness flag.
    pub const UNIQUE: &'static str = "unique";

    /// Create a unique index over the given columns.
    pub fn new<I, C>(columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnRef>,
    {
        let mut options = IndexMap::new();
        options.insert(SmolStr::new(Self::UNIQUE), Value::Bool(true));
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            options,
        }
    }

    /// Set the uniqueness flag.
    pub fn unique(mut self, unique: bool) -> Self {
        self.options
            .insert(SmolStr::new(Self::UNIQUE), Value::Bool(unique));
        self
    }

    /// Set another index option.
    pub fn option(mut self, key: impl Into<SmolStr>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Check whether the index is unique.
    pub fn is_unique(&self) -> bool {
        self.options
            .get(Self::UNIQUE)
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    /// Get the referenced column names, in order.
    pub fn column_names(&self) -> Vec<SmolStr> {
        self.columns.iter().map(|c| SmolStr::new(c.name())).collect()
    }
}
