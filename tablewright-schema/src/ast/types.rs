//! Core value types shared by descriptions, layers and compiled tables.

use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A single cell value.
pub type Value = serde_json::Value;

/// Timing half of a lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timing {
    /// Before the operation runs.
    Before,
    /// After the operation has run.
    After,
}

/// Event half of a lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Event {
    /// Row insertion.
    Insert,
    /// Row update.
    Update,
    /// Row deletion.
    Delete,
}

/// One of the six fixed lifecycle phases a hook can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// `before_insert`
    BeforeInsert,
    /// `after_insert`
    AfterInsert,
    /// `before_update`
    BeforeUpdate,
    /// `after_update`
    AfterUpdate,
    /// `before_delete`
    BeforeDelete,
    /// `after_delete`
    AfterDelete,
}

impl Phase {
    /// All phases, in the order common hooks are attached.
    pub const ALL: [Phase; 6] = [
        Phase::BeforeInsert,
        Phase::AfterInsert,
        Phase::BeforeUpdate,
        Phase::AfterUpdate,
        Phase::BeforeDelete,
        Phase::AfterDelete,
    ];

    /// Build a phase from its two halves.
    pub const fn new(timing: Timing, event: Event) -> Self {
        match (timing, event) {
            (Timing::Before, Event::Insert) => Self::BeforeInsert,
            (Timing::After, Event::Insert) => Self::AfterInsert,
            (Timing::Before, Event::Update) => Self::BeforeUpdate,
            (Timing::After, Event::Update) => Self::AfterUpdate,
            (Timing::Before, Event::Delete) => Self::BeforeDelete,
            (Timing::After, Event::Delete) => Self::AfterDelete,
        }
    }

    /// Parse a phase from its member name.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "before_insert" => Some(Self::BeforeInsert),
            "after_insert" => Some(Self::AfterInsert),
            "before_update" => Some(Self::BeforeUpdate),
            "after_update" => Some(Self::AfterUpdate),
            "before_delete" => Some(Self::BeforeDelete),
            "after_delete" => Some(Self::AfterDelete),
            _ => None,
        }
    }

    /// Get the member name of this phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeInsert => "before_insert",
            Self::AfterInsert => "after_insert",
            Self::BeforeUpdate => "before_update",
            Self::AfterUpdate => "after_update",
            Self::BeforeDelete => "before_delete",
            Self::AfterDelete => "after_delete",
        }
    }

    /// Get the timing half.
    pub fn timing(&self) -> Timing {
        match self {
            Self::BeforeInsert | Self::BeforeUpdate | Self::BeforeDelete => Timing::Before,
            Self::AfterInsert | Self::AfterUpdate | Self::AfterDelete => Timing::After,
        }
    }

    /// Get the event half.
    pub fn event(&self) -> Event {
        match self {
            Self::BeforeInsert | Self::AfterInsert => Event::Insert,
            Self::BeforeUpdate | Self::AfterUpdate => Event::Update,
            Self::BeforeDelete | Self::AfterDelete => Event::Delete,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Check whether a member name is one of the reserved hook phase names.
pub fn is_hook_name(name: &str) -> bool {
    Phase::from_str(name).is_some()
}

/// A row of named values, in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    values: IndexMap<SmolStr, Value>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by column name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Set a column value, returning the previous one.
    pub fn set(&mut self, column: impl Into<SmolStr>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(column.into(), value.into())
    }

    /// Builder-style [`Row::set`].
    pub fn with(mut self, column: impl Into<SmolStr>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    /// Check whether the row has a column.
    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    /// Merge another row into this one; columns in `other` win.
    pub fn merge(&mut self, other: &Row) {
        for (k, v) in &other.values {
            self.values.insert(k.clone(), v.clone());
        }
    }

    /// Iterate over `(column, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<SmolStr>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A process-unique identifier handed out from a shared counter.
pub(crate) fn next_id(counter: &AtomicU64) -> u64 {
    counter.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_phase_names_round_trip() {
        for phase in Phase::ALL {
            assert_eq!(Phase::from_str(phase.as_str()), Some(phase));
        }
        assert_eq!(Phase::from_str("on_insert"), None);
    }

    #[test]
    fn test_phase_halves() {
        assert_eq!(Phase::new(Timing::After, Event::Update), Phase::AfterUpdate);
        assert_eq!(Phase::BeforeDelete.timing(), Timing::Before);
        assert_eq!(Phase::BeforeDelete.event(), Event::Delete);
    }

    #[test]
    fn test_is_hook_name() {
        assert!(is_hook_name("before_insert"));
        assert!(is_hook_name("after_delete"));
        assert!(!is_hook_name("_before_insert"));
        assert!(!is_hook_name("format"));
    }

    #[test]
    fn test_row_set_and_merge() {
        let mut row = Row::new().with("name", "ball").with("owner", 1);
        assert_eq!(row.get("name"), Some(&json!("ball")));

        row.merge(&Row::new().with("name", "big ball"));
        assert_eq!(row.get("name"), Some(&json!("big ball")));
        assert_eq!(row.len(), 2);

        let columns: Vec<_> = row.iter().map(|(k, _)| k).collect();
        assert_eq!(columns, vec!["name", "owner"]);
    }
}
