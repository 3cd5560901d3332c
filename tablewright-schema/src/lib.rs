//! # tablewright-schema
//!
//! Declarative table descriptions for the Tablewright schema compiler.
//!
//! This crate provides:
//! - The description DSL: [`TableDescription`] and its builder
//! - Member kinds: fields, virtual fields, row methods, hooks, table methods, indexes
//! - Validators, including ones deferred until the database is known
//! - The interfaces of the relational layer compiled tables live in
//! - Configuration parser for `tablewright.toml` files
//!
//! ## Example
//!
//! ```rust
//! use tablewright_schema::{Field, Index, TableDescription};
//!
//! let created = TableDescription::builder("sign_created")
//!     .field("created", Field::new("datetime"))
//!     .build();
//!
//! let thing = TableDescription::builder("thing")
//!     .field("owner", Field::new("reference person").required())
//!     .field("name", Field::new("string").required())
//!     .index("name_idx", Index::new(["name"]))
//!     .mixin(created)
//!     .build();
//!
//! assert_eq!(thing.member_count(), 3);
//! ```

pub mod ast;
pub mod config;
pub mod error;
pub mod layer;
pub mod validator;

pub use ast::*;
pub use config::{GroupConfig, IndexConfig, MigrateSetting, TablewrightConfig};
pub use error::{SchemaError, SchemaResult};
pub use layer::{
    Database, DatabaseToken, FieldDefinition, LayerError, LayerResult, PlainField,
    TableDefinition, TableHandle,
};
pub use validator::{DeferredValidator, Requirement, Validator, ValidatorError};
