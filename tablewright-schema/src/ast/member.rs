//! Declared members of a table description.

use super::{Field, Hook, Index, RowMethod, TableMethod, Value, VirtualGetter};

/// Prefix of member names that carry metadata rather than schema.
pub const RESERVED_PREFIX: &str = "__";

/// Member name of the per-table post-definition callback.
pub const ON_DEFINE: &str = "_on_define";

/// Member name of free-form per-table metadata collected by the group driver.
pub const EXTRA: &str = "__extra__";

/// A member declared on a table description.
#[derive(Debug, Clone)]
pub enum Member {
    /// A stored field.
    Field(Field),
    /// A computed, read-only field.
    Virtual(VirtualGetter),
    /// A row-level method.
    Method(RowMethod),
    /// A lifecycle hook. Must be declared under a phase name.
    Hook(Hook),
    /// A table-level method.
    TableMethod(TableMethod),
    /// An index declaration.
    Index(Index),
    /// An opaque table option passed through to the layer.
    Option(Value),
}

/// The kind of a [`Member`], for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// [`Member::Field`]
    Field,
    /// [`Member::Virtual`]
    Virtual,
    /// [`Member::Method`]
    Method,
    /// [`Member::Hook`]
    Hook,
    /// [`Member::TableMethod`]
    TableMethod,
    /// [`Member::Index`]
    Index,
    /// [`Member::Option`]
    Option,
}

impl MemberKind {
    /// Get the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Field => "field",
            Self::Virtual => "virtual field",
            Self::Method => "method",
            Self::Hook => "hook",
            Self::TableMethod => "table method",
            Self::Index => "index",
            Self::Option => "option",
        }
    }
}

impl std::fmt::Display for MemberKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Member {
    /// Get the member kind.
    pub fn kind(&self) -> MemberKind {
        match self {
            Self::Field(_) => MemberKind::Field,
            Self::Virtual(_) => MemberKind::Virtual,
            Self::Method(_) => MemberKind::Method,
            Self::Hook(_) => MemberKind::Hook,
            Self::TableMethod(_) => MemberKind::TableMethod,
            Self::Index(_) => MemberKind::Index,
            Self::Option(_) => MemberKind::Option,
        }
    }

    /// Check whether the member is callable.
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Self::Virtual(_) | Self::Method(_) | Self::Hook(_) | Self::TableMethod(_)
        )
    }
}

impl From<Field> for Member {
    fn from(f: Field) -> Self {
        Self::Field(f)
    }
}

impl From<Index> for Member {
    fn from(i: Index) -> Self {
        Self::Index(i)
    }
}

impl From<Hook> for Member {
    fn from(h: Hook) -> Self {
        Self::Hook(h)
    }
}

/// Check whether a member name is reserved for metadata.
pub fn is_reserved_name(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX)
}
