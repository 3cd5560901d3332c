//! # Tablewright
//!
//! Compiles declarative table descriptions into tables of a pluggable
//! relational layer.
//!
//! Tablewright provides:
//! - A description DSL for fields, virtual fields, methods, hooks and indexes
//! - Mixins ("signatures") whose fields are appended to a table
//! - Primary-key and physical-name policies driven by group configuration
//! - Index plans handed to an external index migrator
//! - An in-memory relational layer for tests and prototyping
//!
//! ## Quick Start
//!
//! ```rust
//! use tablewright::prelude::*;
//!
//! let person = TableDescription::builder("person")
//!     .field("name", Field::new("string").required())
//!     .build();
//! let color = TableDescription::builder("color")
//!     .field("id", Field::new("integer"))
//!     .field("name", Field::new("string"))
//!     .build();
//!
//! let group = ModelGroup::new("demo")
//!     .with_config(GroupConfig::new(Some("test_"), true))
//!     .table(person)
//!     .table(color);
//!
//! let db = MemoryDatabase::new();
//! let tables = ModelBuilder::new(&db).build(&group).unwrap();
//!
//! assert_eq!(tables["person"].physical_name(), "test_person");
//! let primary_key = tables["color"].primary_key().unwrap();
//! assert_eq!(primary_key[0], "id");
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod logging;

/// Table descriptions, member kinds and layer interfaces.
pub mod schema {
    pub use tablewright_schema::*;
}

/// Index plans and index migrators.
pub mod migrate {
    pub use tablewright_migrate::*;
}

/// The table compiler and group driver.
pub mod build {
    pub use tablewright_build::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::build::{
        BuildError, BuildResult, CompileOptions, MemoryDatabase, MigrateIndexes, ModelBuilder,
        ModelGroup, SignatureCache, TableMap, compile,
    };
    pub use crate::migrate::{
        IndexMigrator, IndexPlanEntry, MemoryIndexStore, MigrateResult, StoreMigrator,
    };
    pub use crate::schema::{
        CallbackError, CommonHook, Database, Field, GroupConfig, Hook, HookArgs, HookFlow, Index,
        Phase, Row, TableDescription, TableHandle, TablewrightConfig, Value,
    };
}

pub use build::{BuildError, ModelBuilder, ModelGroup};
pub use schema::{SchemaError, TableDescription};
