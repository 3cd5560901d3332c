//! # tablewright-build
//!
//! The table compiler of Tablewright.
//!
//! This crate turns [`TableDescription`](tablewright_schema::TableDescription)s
//! into tables of a relational layer:
//! - Member classification ([`classify`])
//! - Signature (mixin) resolution, cached per database ([`SignatureCache`])
//! - Primary-key and naming policies ([`policy`])
//! - The ordered table compiler ([`compile`])
//! - Index plan extraction for an external migrator ([`extract_plan`])
//! - The group driver ([`ModelBuilder`], [`ModelGroup`])
//! - An in-memory reference layer ([`MemoryDatabase`])
//!
//! ## Example
//!
//! ```rust
//! use tablewright_build::{CompileOptions, MemoryDatabase, SignatureCache, compile};
//! use tablewright_schema::{Field, TableDescription, TableHandle};
//!
//! let db = MemoryDatabase::new();
//! let thing = TableDescription::builder("thing")
//!     .field("name", Field::new("string"))
//!     .build();
//!
//! let options = CompileOptions::new().prefix("test_");
//! let table = compile(&db, &thing, &options, &SignatureCache::new()).unwrap();
//! assert_eq!(table.name(), "thing");
//! assert_eq!(table.physical_name(), "test_thing");
//! ```

pub mod classify;
pub mod compiler;
pub mod error;
pub mod index_plan;
pub mod memory;
pub mod model;
pub mod policy;
pub mod signature;

pub use classify::{Classification, classify};
pub use compiler::{CompileOptions, OnDefineTable, compile};
pub use error::{BuildError, BuildResult, CallbackStage, MemoryError, MemoryResult};
pub use index_plan::extract_plan;
pub use memory::{MemoryDatabase, MemoryTable};
pub use model::{MigrateIndexes, ModelBuilder, ModelGroup, OnDefineModel, TableMap};
pub use signature::{CacheStats, CompiledSignature, SignatureCache};
