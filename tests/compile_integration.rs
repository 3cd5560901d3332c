//! Integration tests for compiling single tables.

use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use serde_json::json;
use smol_str::SmolStr;
use tablewright::SchemaError;
use tablewright::prelude::*;

fn compile_fresh(
    db: &MemoryDatabase,
    desc: &TableDescription,
    options: &CompileOptions,
) -> BuildResult<Arc<dyn TableHandle>> {
    compile(db, desc, options, &SignatureCache::new())
}

fn hook_counts(table: &dyn TableHandle) -> Vec<usize> {
    Phase::ALL.iter().map(|p| table.hooks(*p).len()).collect()
}

#[test]
fn test_compile_twice_yields_equivalent_handles() {
    let fresh_db = MemoryDatabase::new();
    let reopened_db = MemoryDatabase::new();
    let cache = SignatureCache::new();

    let desc = TableDescription::builder("person")
        .field("name", Field::new("string").required())
        .field("age", Field::new("integer").default_value(0))
        .virtual_field("greeting", |row| {
            json!(format!("hello {}", row.get("name").and_then(Value::as_str).unwrap_or("")))
        })
        .method("shout", |row, _| {
            Ok(json!(row.get("name").and_then(Value::as_str).unwrap_or("").to_uppercase()))
        })
        .table_method("adults", |_, _| Ok(json!([])))
        .hook(Phase::BeforeInsert, |_| Ok(HookFlow::Continue))
        .build();
    let options =
        CompileOptions::new().common_hook(CommonHook::new(|_, _, _| Ok(HookFlow::Continue)));

    let fresh = compile(&fresh_db, &desc, &options, &cache).unwrap();

    compile(&reopened_db, &desc, &options, &cache).unwrap();
    let reopened = compile(&reopened_db, &desc, &options, &cache).unwrap();

    assert_eq!(reopened_db.table_count(), 1);
    assert_eq!(fresh.field_names(), reopened.field_names());
    assert_eq!(fresh.method_names(), reopened.method_names());
    assert_eq!(hook_counts(fresh.as_ref()), hook_counts(reopened.as_ref()));
    assert_eq!(hook_counts(fresh.as_ref()), vec![2, 1, 1, 1, 1, 1]);
    assert_eq!(fresh.primary_key(), reopened.primary_key());
}

#[test]
fn test_shared_mixin_resolved_once() {
    let db = MemoryDatabase::new();
    let cache = SignatureCache::new();

    let created = TableDescription::builder("sign_created")
        .field("created_on", Field::new("datetime"))
        .field("created_by", Field::new("reference person"))
        .build();

    let person = TableDescription::builder("person")
        .field("name", Field::new("string"))
        .mixin(Arc::clone(&created))
        .build();
    let thing = TableDescription::builder("thing")
        .field("label", Field::new("string"))
        .mixin(Arc::clone(&created))
        .build();

    let person = compile(&db, &person, &CompileOptions::new(), &cache).unwrap();
    let thing = compile(&db, &thing, &CompileOptions::new(), &cache).unwrap();

    assert_eq!(db.field_source_count(), 1);
    assert_eq!(cache.stats().misses, 1);
    assert_eq!(cache.stats().hits, 1);

    let mixin_fields = |table: &dyn TableHandle| -> Vec<SmolStr> {
        table.field_names().into_iter().skip(1).collect()
    };
    assert_eq!(mixin_fields(person.as_ref()), mixin_fields(thing.as_ref()));

    let defs = |name: &str| db.memory_table(name).unwrap().definition().fields.clone();
    let person_defs = defs("person");
    let thing_defs = defs("thing");
    for (a, b) in person_defs[1..].iter().zip(&thing_defs[1..]) {
        assert!(a.same_shape(b));
    }
}

#[test]
fn test_auto_primary_key_policy() {
    let auto = CompileOptions::new().auto_pk(true);

    let integer_id = TableDescription::builder("color")
        .field("id", Field::new("integer"))
        .field("name", Field::new("string"))
        .build();
    let db = MemoryDatabase::new();
    let table = compile_fresh(&db, &integer_id, &auto).unwrap();
    assert_eq!(table.primary_key(), Some(vec![SmolStr::new("id")]));

    let id_typed = TableDescription::builder("color")
        .field("id", Field::new("id"))
        .field("name", Field::new("string"))
        .build();
    let db = MemoryDatabase::new();
    let table = compile_fresh(&db, &id_typed, &auto).unwrap();
    assert_eq!(table.primary_key(), None);

    let explicit = TableDescription::builder("color")
        .field("id", Field::new("integer"))
        .field("code", Field::new("string"))
        .option("primarykey", json!(["code"]))
        .build();
    let db = MemoryDatabase::new();
    let table = compile_fresh(&db, &explicit, &auto).unwrap();
    assert_eq!(table.primary_key(), Some(vec![SmolStr::new("code")]));
}

#[test]
fn test_prefix_keeps_logical_name() {
    let db = MemoryDatabase::new();
    let desc = TableDescription::builder("thing")
        .field("name", Field::new("string"))
        .build();

    let table = compile_fresh(&db, &desc, &CompileOptions::new().prefix("test_")).unwrap();

    assert_eq!(table.name(), "thing");
    assert_eq!(table.physical_name(), "test_thing");
    let by_name = db.table("thing").unwrap();
    assert_eq!(by_name.physical_name(), "test_thing");
}

#[test]
fn test_specific_hook_runs_before_common_hook() {
    let db = MemoryDatabase::new();
    let specific_log = Arc::new(Mutex::new(Vec::new()));
    let common_log = Arc::new(Mutex::new(Vec::new()));
    let order = Arc::new(Mutex::new(Vec::new()));

    let (specific, specific_order) = (Arc::clone(&specific_log), Arc::clone(&order));
    let desc = TableDescription::builder("thing")
        .field("name", Field::new("string"))
        .hook(Phase::BeforeInsert, move |args| {
            specific.lock().unwrap().push(args.fields.clone());
            specific_order.lock().unwrap().push("specific");
            Ok(HookFlow::Continue)
        })
        .build();

    let (common, common_order) = (Arc::clone(&common_log), Arc::clone(&order));
    let options = CompileOptions::new().common_hook(CommonHook::new(move |table, phase, _| {
        common.lock().unwrap().push((SmolStr::new(table.name()), phase));
        common_order.lock().unwrap().push("common");
        Ok(HookFlow::Continue)
    }));

    compile_fresh(&db, &desc, &options).unwrap();
    let id = db
        .memory_table("thing")
        .unwrap()
        .insert(Row::new().with("name", "widget"))
        .unwrap();

    assert!(id.is_some());
    assert_eq!(specific_log.lock().unwrap().len(), 1);
    assert_eq!(
        *common_log.lock().unwrap(),
        vec![
            (SmolStr::new("thing"), Phase::BeforeInsert),
            (SmolStr::new("thing"), Phase::AfterInsert),
        ]
    );
    assert_eq!(*order.lock().unwrap(), vec!["specific", "common", "common"]);
}

#[test]
fn test_index_plan_handed_to_migrator() {
    let db = MemoryDatabase::new();
    let calls = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&calls);

    let desc = TableDescription::builder("thing")
        .field("col_1", Field::new("string"))
        .field("col_2", Field::new("integer"))
        .index("foo_idx", Index::new(["col_1", "col_2"]).unique(true))
        .build();

    let migrator = move |table: &dyn TableHandle, plan: &[IndexPlanEntry]| -> MigrateResult<()> {
        let triples: Vec<_> = plan
            .iter()
            .map(|entry| {
                let (name, columns, options) = entry.as_triple();
                (
                    name.to_string(),
                    columns.iter().map(|c| c.to_string()).collect::<Vec<_>>(),
                    serde_json::to_value(options).unwrap(),
                )
            })
            .collect();
        recorder
            .lock()
            .unwrap()
            .push((table.name().to_string(), triples));
        Ok(())
    };
    let options = CompileOptions::new()
        .migrate_indexes(true)
        .index_migrator(Arc::new(migrator));

    compile_fresh(&db, &desc, &options).unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0],
        (
            "thing".to_string(),
            vec![(
                "foo_idx".to_string(),
                vec!["col_1".to_string(), "col_2".to_string()],
                json!({"unique": true}),
            )]
        )
    );
}

#[test]
fn test_missing_migrator_fails_before_define() {
    let db = MemoryDatabase::new();
    let desc = TableDescription::builder("thing")
        .field("col_1", Field::new("string"))
        .index("foo_idx", Index::new(["col_1"]))
        .build();

    let err = compile_fresh(&db, &desc, &CompileOptions::new().migrate_indexes(true)).unwrap_err();

    assert!(matches!(err, BuildError::MissingIndexMigrator { ref table } if table == "thing"));
    assert!(err.is_config_error());
    assert_eq!(db.define_count(), 0);
    assert!(db.table("thing").is_none());
}

#[test]
fn test_invalid_hook_member_rejected() {
    let db = MemoryDatabase::new();
    let desc = TableDescription::builder("thing")
        .field("name", Field::new("string"))
        .option("before_insert", json!(true))
        .build();

    let err = compile_fresh(&db, &desc, &CompileOptions::new()).unwrap_err();
    assert!(matches!(err, BuildError::Schema(SchemaError::InvalidHook { .. })));
    assert_eq!(db.define_count(), 0);
}
