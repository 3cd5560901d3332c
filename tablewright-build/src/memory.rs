//! An in-memory relational layer.
//!
//! [`MemoryDatabase`] implements [`Database`] without any storage engine. It
//! is the reference layer for tests and demos: tables are defined or opened
//! by logical name, rows live in memory, and hooks fire in attachment order.
//!
//! Opening an existing table returns a new handle over the same rows. The
//! new handle starts with no hooks and no table methods, so compiling a
//! description against an open table decorates it exactly once.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use indexmap::IndexMap;
use parking_lot::RwLock;
use smol_str::SmolStr;
use tablewright_schema::{
    Database, DatabaseToken, FieldDefinition, Hook, HookArgs, ID_FIELD, LayerError, LayerResult,
    Phase, Row, TableDefinition, TableHandle, TableMethod, Validator, Value,
};
use tracing::{debug, trace};

use crate::error::{MemoryError, MemoryResult};

/// A database whose tables live in memory.
#[derive(Debug)]
pub struct MemoryDatabase {
    token: DatabaseToken,
    tables: RwLock<IndexMap<SmolStr, Arc<MemoryTable>>>,
    define_calls: AtomicUsize,
    field_source_calls: AtomicUsize,
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDatabase {
    /// Create an empty database with a fresh token.
    pub fn new() -> Self {
        Self {
            token: DatabaseToken::next(),
            tables: RwLock::new(IndexMap::new()),
            define_calls: AtomicUsize::new(0),
            field_source_calls: AtomicUsize::new(0),
        }
    }

    /// Number of define-or-open calls received.
    pub fn define_count(&self) -> usize {
        self.define_calls.load(Ordering::Relaxed)
    }

    /// Number of field sources built.
    pub fn field_source_count(&self) -> usize {
        self.field_source_calls.load(Ordering::Relaxed)
    }

    /// Number of defined tables.
    pub fn table_count(&self) -> usize {
        self.tables.read().len()
    }

    /// Logical names of defined tables, in definition order.
    pub fn table_names(&self) -> Vec<SmolStr> {
        self.tables.read().keys().cloned().collect()
    }

    /// Look up a table with its concrete type.
    pub fn memory_table(&self, name: &str) -> Option<Arc<MemoryTable>> {
        self.tables.read().get(name).cloned()
    }
}

/// Check that a definition is internally consistent.
fn check_definition(definition: &TableDefinition) -> LayerResult<()> {
    let mut seen = std::collections::HashSet::new();
    for field in &definition.fields {
        if !seen.insert(field.name()) {
            return Err(LayerError::rejected(
                definition.name.as_str(),
                format!("duplicate field `{}`", field.name()),
            ));
        }
    }

    if let Some(key) = &definition.primary_key {
        for column in key {
            let stored = definition
                .field(column)
                .is_some_and(FieldDefinition::is_stored);
            if !stored {
                return Err(LayerError::rejected(
                    definition.name.as_str(),
                    format!("primary key column `{column}` is not a stored field"),
                ));
            }
        }
    }

    Ok(())
}

/// Describe the first layout difference between two definitions of a table.
fn layout_difference(existing: &TableDefinition, new: &TableDefinition) -> Option<String> {
    if existing.physical_name() != new.physical_name() {
        return Some(format!(
            "stored as `{}`, not `{}`",
            existing.physical_name(),
            new.physical_name()
        ));
    }
    if existing.primary_key != new.primary_key {
        return Some(format!(
            "primary key {:?} differs from {:?}",
            existing.primary_key, new.primary_key
        ));
    }
    if existing.fields.len() != new.fields.len() {
        return Some(format!(
            "has {} fields, not {}",
            existing.fields.len(),
            new.fields.len()
        ));
    }
    if let Some((_, field)) = existing
        .fields
        .iter()
        .zip(&new.fields)
        .find(|(a, b)| !a.same_shape(b))
    {
        return Some(format!("field `{}` changed", field.name()));
    }
    if existing.options != new.options {
        return Some("table options changed".to_string());
    }
    None
}

impl Database for MemoryDatabase {
    fn token(&self) -> DatabaseToken {
        self.token
    }

    fn define_table(&self, definition: TableDefinition) -> LayerResult<Arc<dyn TableHandle>> {
        self.define_calls.fetch_add(1, Ordering::Relaxed);
        check_definition(&definition)?;

        let mut tables = self.tables.write();
        let storage = match tables.get(definition.name.as_str()) {
            Some(existing) => {
                if let Some(message) = layout_difference(&existing.definition, &definition) {
                    return Err(LayerError::incompatible(definition.name.as_str(), message));
                }
                debug!(table = %definition.name, rows = existing.len(), "Opening existing table");
                Arc::clone(&existing.storage)
            }
            None => {
                debug!(
                    table = %definition.name,
                    physical_name = definition.physical_name(),
                    "Defining table"
                );
                Arc::new(Storage::default())
            }
        };

        let table = Arc::new(MemoryTable::new(definition, storage));
        tables.insert(table.definition.name.clone(), Arc::clone(&table));
        Ok(table)
    }

    fn define_field_source(&self, definition: TableDefinition) -> LayerResult<Vec<FieldDefinition>> {
        self.field_source_calls.fetch_add(1, Ordering::Relaxed);
        check_definition(&definition)?;
        trace!(source = %definition.name, fields = definition.fields.len(), "Built field source");
        Ok(definition.fields)
    }

    fn table(&self, name: &str) -> Option<Arc<dyn TableHandle>> {
        self.tables
            .read()
            .get(name)
            .map(|t| Arc::clone(t) as Arc<dyn TableHandle>)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A table of a [`MemoryDatabase`].
///
/// Rows are keyed by an integer id exposed as the `id` column. Ids are
/// serial unless the inserted row supplies one.
pub struct MemoryTable {
    definition: TableDefinition,
    hooks: RwLock<HashMap<Phase, Vec<Hook>>>,
    methods: RwLock<IndexMap<SmolStr, TableMethod>>,
    storage: Arc<Storage>,
}

/// Rows of a table, shared by every handle opened on it.
#[derive(Debug)]
struct Storage {
    rows: RwLock<IndexMap<u64, Row>>,
    next_id: AtomicU64,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            rows: RwLock::new(IndexMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl MemoryTable {
    fn new(definition: TableDefinition, storage: Arc<Storage>) -> Self {
        Self {
            definition,
            hooks: RwLock::new(HashMap::new()),
            methods: RwLock::new(IndexMap::new()),
            storage,
        }
    }

    /// Get the definition the table was created from.
    pub fn definition(&self) -> &TableDefinition {
        &self.definition
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.storage.rows.read().len()
    }

    /// Check if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.storage.rows.read().is_empty()
    }

    /// Insert a row.
    ///
    /// Returns the new id, or `None` when a `before_insert` hook aborted.
    pub fn insert(&self, values: Row) -> MemoryResult<Option<u64>> {
        self.check_columns(&values)?;
        let mut row = self.with_defaults(values);
        self.check_required(&row)?;
        self.validate(&row)?;
        let explicit = self.explicit_id(&row)?;

        if self.run_before(Phase::BeforeInsert, &HookArgs::insert(row.clone()))? {
            return Ok(None);
        }

        let id = {
            let mut rows = self.storage.rows.write();
            let id = match explicit {
                Some((id, next)) => {
                    if rows.contains_key(&id) {
                        return Err(MemoryError::DuplicateKey {
                            table: self.definition.name.to_string(),
                            id,
                        });
                    }
                    self.storage.next_id.fetch_max(next, Ordering::Relaxed);
                    id
                }
                None => self.storage.next_id.fetch_add(1, Ordering::Relaxed),
            };
            row.set(ID_FIELD, id);
            rows.insert(id, row.clone());
            id
        };

        self.run_after(Phase::AfterInsert, &HookArgs::inserted(row, id))?;
        Ok(Some(id))
    }

    /// Update rows by id, returning how many were changed.
    ///
    /// Unknown ids are ignored. A `before_update` hook may abort the update.
    /// The `id` column cannot be updated.
    pub fn update(&self, ids: &[u64], values: Row) -> MemoryResult<usize> {
        if values.contains(ID_FIELD) {
            return Err(MemoryError::KeyUpdate {
                table: self.definition.name.to_string(),
            });
        }
        self.check_columns(&values)?;
        self.validate(&values)?;

        let ids = self.existing_ids(ids);
        if ids.is_empty() {
            return Ok(0);
        }

        let args = HookArgs::update(ids.clone(), values.clone());
        if self.run_before(Phase::BeforeUpdate, &args)? {
            return Ok(0);
        }

        {
            let mut rows = self.storage.rows.write();
            for id in &ids {
                if let Some(row) = rows.get_mut(id) {
                    row.merge(&values);
                }
            }
        }

        self.run_after(Phase::AfterUpdate, &args)?;
        Ok(ids.len())
    }

    /// Delete rows by id, returning how many were removed.
    pub fn delete(&self, ids: &[u64]) -> MemoryResult<usize> {
        let ids = self.existing_ids(ids);
        if ids.is_empty() {
            return Ok(0);
        }

        let args = HookArgs::delete(ids.clone());
        if self.run_before(Phase::BeforeDelete, &args)? {
            return Ok(0);
        }

        {
            let mut rows = self.storage.rows.write();
            for id in &ids {
                rows.shift_remove(id);
            }
        }

        self.run_after(Phase::AfterDelete, &args)?;
        Ok(ids.len())
    }

    /// Get a row by id, with virtual fields evaluated.
    pub fn get(&self, id: u64) -> Option<Row> {
        let row = self.storage.rows.read().get(&id).cloned()?;
        Some(self.with_virtuals(row))
    }

    /// Get every row matching a filter, in insertion order.
    ///
    /// The filter sees virtual fields.
    pub fn select<F>(&self, filter: F) -> Vec<Row>
    where
        F: Fn(&Row) -> bool,
    {
        let rows: Vec<Row> = self.storage.rows.read().values().cloned().collect();
        rows.into_iter()
            .map(|row| self.with_virtuals(row))
            .filter(|row| filter(row))
            .collect()
    }

    /// Call a row method on a stored row.
    pub fn call_row_method(&self, id: u64, name: &str, args: &[Value]) -> MemoryResult<Value> {
        let method = self
            .definition
            .fields
            .iter()
            .find_map(|field| match field {
                FieldDefinition::Method { name: n, method } if n == name => Some(method.clone()),
                _ => None,
            })
            .ok_or_else(|| MemoryError::UnknownMethod {
                table: self.definition.name.to_string(),
                method: name.to_string(),
            })?;

        let row = self.get(id).ok_or_else(|| MemoryError::RowNotFound {
            table: self.definition.name.to_string(),
            id,
        })?;
        Ok(method.call(&row, args)?)
    }

    /// Read the id a row supplies, with the serial id that follows it.
    ///
    /// A missing or null id means none. The id must be an unsigned integer
    /// below `u64::MAX`.
    fn explicit_id(&self, row: &Row) -> MemoryResult<Option<(u64, u64)>> {
        let value = match row.get(ID_FIELD) {
            None | Some(Value::Null) => return Ok(None),
            Some(value) => value,
        };
        value
            .as_u64()
            .and_then(|id| Some((id, id.checked_add(1)?)))
            .map(Some)
            .ok_or_else(|| MemoryError::InvalidId {
                table: self.definition.name.to_string(),
                value: value.to_string(),
            })
    }

    fn check_columns(&self, values: &Row) -> MemoryResult<()> {
        for (column, _) in values.iter() {
            let stored = column == ID_FIELD
                || self
                    .definition
                    .field(column)
                    .is_some_and(FieldDefinition::is_stored);
            if !stored {
                return Err(MemoryError::UnknownColumn {
                    table: self.definition.name.to_string(),
                    column: column.to_string(),
                });
            }
        }
        Ok(())
    }

    fn with_defaults(&self, mut row: Row) -> Row {
        for field in self.definition.fields.iter().filter_map(FieldDefinition::as_plain) {
            if !row.contains(&field.name) {
                if let Some(default) = field.option("default") {
                    row.set(field.name.clone(), default.clone());
                }
            }
        }
        row
    }

    fn check_required(&self, row: &Row) -> MemoryResult<()> {
        for field in self.definition.fields.iter().filter_map(FieldDefinition::as_plain) {
            let required = field.option("required").and_then(Value::as_bool) == Some(true);
            let missing = row.get(&field.name).is_none_or(Value::is_null);
            if required && missing {
                return Err(MemoryError::Validation {
                    table: self.definition.name.to_string(),
                    column: field.name.to_string(),
                    validator: "required".to_string(),
                    message: "value is required".to_string(),
                });
            }
        }
        Ok(())
    }

    fn validate(&self, row: &Row) -> MemoryResult<()> {
        for (column, value) in row.iter() {
            let Some(field) = self.definition.field(column).and_then(FieldDefinition::as_plain)
            else {
                continue;
            };
            for validator in &field.validators {
                validator
                    .validate(value)
                    .map_err(|message| MemoryError::Validation {
                        table: self.definition.name.to_string(),
                        column: column.to_string(),
                        validator: validator.name().to_string(),
                        message,
                    })?;
            }
        }
        Ok(())
    }

    fn with_virtuals(&self, mut row: Row) -> Row {
        let stored = row.clone();
        for field in &self.definition.fields {
            if let FieldDefinition::Virtual { name, getter } = field {
                row.set(name.clone(), getter.get(&stored));
            }
        }
        row
    }

    fn existing_ids(&self, ids: &[u64]) -> Vec<u64> {
        let rows = self.storage.rows.read();
        ids.iter().copied().filter(|id| rows.contains_key(id)).collect()
    }

    /// Run a phase's before hooks; returns `true` if one aborted.
    fn run_before(&self, phase: Phase, args: &HookArgs) -> MemoryResult<bool> {
        for hook in self.hooks(phase) {
            if hook.call(args)?.is_abort() {
                debug!(table = %self.definition.name, %phase, "Operation aborted by hook");
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn run_after(&self, phase: Phase, args: &HookArgs) -> MemoryResult<()> {
        for hook in self.hooks(phase) {
            hook.call(args)?;
        }
        Ok(())
    }
}

impl TableHandle for MemoryTable {
    fn name(&self) -> &str {
        self.definition.name.as_str()
    }

    fn physical_name(&self) -> &str {
        self.definition.physical_name()
    }

    fn field_names(&self) -> Vec<SmolStr> {
        self.definition.field_names()
    }

    fn primary_key(&self) -> Option<Vec<SmolStr>> {
        self.definition.primary_key.clone()
    }

    fn add_hook(&self, phase: Phase, hook: Hook) {
        self.hooks.write().entry(phase).or_default().push(hook);
    }

    fn hooks(&self, phase: Phase) -> Vec<Hook> {
        self.hooks.read().get(&phase).cloned().unwrap_or_default()
    }

    fn register_method(&self, name: &str, method: TableMethod) {
        self.methods.write().insert(SmolStr::new(name), method);
    }

    fn method(&self, name: &str) -> Option<TableMethod> {
        self.methods.read().get(name).cloned()
    }

    fn method_names(&self) -> Vec<SmolStr> {
        self.methods.read().keys().cloned().collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl std::fmt::Debug for MemoryTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTable")
            .field("name", &self.definition.name)
            .field("physical_name", &self.definition.physical_name())
            .field("fields", &self.definition.field_names())
            .field("rows", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;
    use tablewright_schema::{HookFlow, RowMethod, VirtualGetter};

    struct MaxLen(usize);

    impl Validator for MaxLen {
        fn name(&self) -> &str {
            "max_len"
        }

        fn validate(&self, value: &Value) -> Result<(), String> {
            match value.as_str() {
                Some(s) if s.len() > self.0 => Err(format!("longer than {}", self.0)),
                _ => Ok(()),
            }
        }
    }

    fn plain(name: &str, field_type: &str) -> FieldDefinition {
        FieldDefinition::plain(name, vec![field_type.into()], IndexMap::new(), vec![])
    }

    fn person_definition() -> TableDefinition {
        let mut required = IndexMap::new();
        required.insert(SmolStr::new("required"), json!(true));
        let mut active = IndexMap::new();
        active.insert(SmolStr::new("default"), json!(true));

        TableDefinition::new(
            "person",
            vec![
                FieldDefinition::plain(
                    "name",
                    vec!["string".into()],
                    required,
                    vec![Arc::new(MaxLen(8)) as Arc<dyn Validator>],
                ),
                FieldDefinition::plain("active", vec!["boolean".into()], active, vec![]),
                FieldDefinition::virtual_field(
                    "greeting",
                    VirtualGetter::new(|row| {
                        json!(format!(
                            "hello {}",
                            row.get("name").and_then(Value::as_str).unwrap_or("?")
                        ))
                    }),
                ),
                FieldDefinition::method(
                    "shout",
                    RowMethod::new(|row, args| {
                        let name = row.get("name").and_then(Value::as_str).unwrap_or("");
                        let times = args.first().and_then(Value::as_u64).unwrap_or(1) as usize;
                        Ok(json!(name.to_uppercase().repeat(times)))
                    }),
                ),
            ],
        )
    }

    fn person(db: &MemoryDatabase) -> Arc<MemoryTable> {
        db.define_table(person_definition()).unwrap();
        db.memory_table("person").unwrap()
    }

    #[test]
    fn test_define_or_open() {
        let db = MemoryDatabase::new();
        let first = person(&db);
        first.add_hook(Phase::BeforeInsert, Hook::new(|_| Ok(HookFlow::Continue)));
        first.register_method("count", TableMethod::new(|_, _| Ok(json!(0))));
        first.insert(Row::new().with("name", "ada")).unwrap();

        db.define_table(person_definition()).unwrap();
        let second = db.memory_table("person").unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert!(second.hooks(Phase::BeforeInsert).is_empty());
        assert!(second.method_names().is_empty());
        assert_eq!(second.len(), 1);
        assert_eq!(db.define_count(), 2);
        assert_eq!(db.table_count(), 1);

        // both handles see the same rows
        second.insert(Row::new().with("name", "bob")).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first.get(2).unwrap().get("name"), Some(&json!("bob")));
    }

    #[test]
    fn test_define_incompatible() {
        let db = MemoryDatabase::new();
        db.define_table(TableDefinition::new("thing", vec![plain("name", "string")]))
            .unwrap();

        let err = db
            .define_table(TableDefinition::new("thing", vec![plain("name", "text")]))
            .unwrap_err();
        assert_eq!(
            err,
            LayerError::incompatible("thing", "field `name` changed")
        );

        let mut renamed = TableDefinition::new("thing", vec![plain("name", "string")]);
        renamed.physical_name = Some("test_thing".into());
        assert!(matches!(
            db.define_table(renamed),
            Err(LayerError::Incompatible { .. })
        ));
    }

    #[test]
    fn test_define_rejects_bad_definitions() {
        let db = MemoryDatabase::new();
        let dup = TableDefinition::new("thing", vec![plain("a", "string"), plain("a", "text")]);
        assert!(matches!(
            db.define_table(dup),
            Err(LayerError::Rejected { .. })
        ));

        let mut bad_key = TableDefinition::new("color", vec![plain("name", "string")]);
        bad_key.primary_key = Some(vec!["id".into()]);
        assert!(matches!(
            db.define_table(bad_key),
            Err(LayerError::Rejected { .. })
        ));
        assert_eq!(db.table_count(), 0);
    }

    #[test]
    fn test_field_source_not_registered() {
        let db = MemoryDatabase::new();
        let fields = db
            .define_field_source(TableDefinition::new("sign_created", vec![plain("created_on", "datetime")]))
            .unwrap();

        assert_eq!(fields.len(), 1);
        assert_eq!(db.field_source_count(), 1);
        assert!(db.table("sign_created").is_none());
    }

    #[test]
    fn test_insert_get_select() {
        let db = MemoryDatabase::new();
        let table = person(&db);

        let id = table
            .insert(Row::new().with("name", "ada"))
            .unwrap()
            .unwrap();
        assert_eq!(id, 1);
        table.insert(Row::new().with("name", "bob")).unwrap();

        let row = table.get(id).unwrap();
        assert_eq!(row.get("id"), Some(&json!(1)));
        assert_eq!(row.get("active"), Some(&json!(true)));
        assert_eq!(row.get("greeting"), Some(&json!("hello ada")));

        let bobs = table.select(|row| row.get("greeting") == Some(&json!("hello bob")));
        assert_eq!(bobs.len(), 1);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_insert_with_explicit_id() {
        let db = MemoryDatabase::new();
        let table = person(&db);

        let id = table
            .insert(Row::new().with("id", 10).with("name", "ada"))
            .unwrap();
        assert_eq!(id, Some(10));
        let next = table.insert(Row::new().with("name", "bob")).unwrap();
        assert_eq!(next, Some(11));

        let err = table
            .insert(Row::new().with("id", 10).with("name", "eve"))
            .unwrap_err();
        assert!(matches!(err, MemoryError::DuplicateKey { id: 10, .. }));
    }

    #[test]
    fn test_insert_rejects_unusable_ids() {
        let db = MemoryDatabase::new();
        let table = person(&db);

        for bad in [json!(u64::MAX), json!("abc"), json!(-1), json!(1.5)] {
            let err = table
                .insert(Row::new().with("id", bad).with("name", "ada"))
                .unwrap_err();
            assert!(matches!(err, MemoryError::InvalidId { .. }), "{err}");
        }
        assert!(table.is_empty());

        let id = table
            .insert(Row::new().with("id", Value::Null).with("name", "ada"))
            .unwrap();
        assert_eq!(id, Some(1));
    }

    #[test]
    fn test_update_rejects_id_column() {
        let db = MemoryDatabase::new();
        let table = person(&db);
        let id = table.insert(Row::new().with("name", "ada")).unwrap().unwrap();

        let err = table.update(&[id], Row::new().with("id", 5)).unwrap_err();
        assert!(matches!(err, MemoryError::KeyUpdate { .. }));
        assert_eq!(table.get(id).unwrap().get("id"), Some(&json!(id)));
        assert!(table.get(5).is_none());
    }

    #[test]
    fn test_insert_validation() {
        let db = MemoryDatabase::new();
        let table = person(&db);

        let err = table.insert(Row::new()).unwrap_err();
        assert!(matches!(err, MemoryError::Validation { ref validator, .. } if validator == "required"));

        let err = table
            .insert(Row::new().with("name", "much too long"))
            .unwrap_err();
        assert!(matches!(err, MemoryError::Validation { ref validator, .. } if validator == "max_len"));

        let err = table
            .insert(Row::new().with("name", "ada").with("greeting", "hi"))
            .unwrap_err();
        assert!(matches!(err, MemoryError::UnknownColumn { .. }));
        assert!(table.is_empty());
    }

    #[test]
    fn test_update_and_delete() {
        let db = MemoryDatabase::new();
        let table = person(&db);
        let id = table.insert(Row::new().with("name", "ada")).unwrap().unwrap();

        assert_eq!(table.update(&[id, 99], Row::new().with("active", false)).unwrap(), 1);
        assert_eq!(table.get(id).unwrap().get("active"), Some(&json!(false)));

        assert_eq!(table.delete(&[99]).unwrap(), 0);
        assert_eq!(table.delete(&[id]).unwrap(), 1);
        assert!(table.get(id).is_none());
    }

    #[test]
    fn test_hooks_fire_in_attachment_order() {
        let db = MemoryDatabase::new();
        let table = person(&db);
        let log = Arc::new(Mutex::new(Vec::<String>::new()));

        for label in ["first", "second"] {
            let log = Arc::clone(&log);
            table.add_hook(
                Phase::BeforeInsert,
                Hook::observe(move |_| log.lock().unwrap().push(label.to_string())),
            );
        }
        let after = Arc::clone(&log);
        table.add_hook(
            Phase::AfterInsert,
            Hook::observe(move |args| {
                after.lock().unwrap().push(format!("after:{:?}", args.ids));
            }),
        );

        table.insert(Row::new().with("name", "ada")).unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["first".to_string(), "second".to_string(), "after:[1]".to_string()]
        );
    }

    #[test]
    fn test_before_hook_aborts() {
        let db = MemoryDatabase::new();
        let table = person(&db);
        table.add_hook(Phase::BeforeInsert, Hook::new(|_| Ok(HookFlow::Abort)));
        table.add_hook(Phase::BeforeDelete, Hook::new(|_| Ok(HookFlow::Abort)));

        assert_eq!(table.insert(Row::new().with("name", "ada")).unwrap(), None);
        assert!(table.is_empty());
        assert_eq!(table.delete(&[1]).unwrap(), 0);
    }

    #[test]
    fn test_row_and_table_methods() {
        let db = MemoryDatabase::new();
        let table = person(&db);
        let id = table.insert(Row::new().with("name", "ada")).unwrap().unwrap();

        assert_eq!(
            table.call_row_method(id, "shout", &[json!(2)]).unwrap(),
            json!("ADAADA")
        );
        assert!(matches!(
            table.call_row_method(id, "whisper", &[]),
            Err(MemoryError::UnknownMethod { .. })
        ));

        table.register_method(
            "count",
            TableMethod::new(|table, _| {
                let memory = table
                    .as_any()
                    .downcast_ref::<MemoryTable>()
                    .ok_or_else(|| tablewright_schema::CallbackError::new("not a memory table"))?;
                Ok(json!(memory.len()))
            }),
        );
        let handle: Arc<dyn TableHandle> = table;
        assert_eq!(handle.call_method("count", &[]).unwrap(), json!(1));
        assert_eq!(handle.method_names(), vec![SmolStr::new("count")]);
        assert!(format!("{handle:?}").contains("\"person\""));
    }
}
