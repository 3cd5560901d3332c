//! # tablewright-migrate
//!
//! Index migration for the Tablewright schema compiler.
//!
//! The compiler never creates indexes itself. For every table whose indexes
//! should be migrated it extracts an index plan and hands it to an
//! [`IndexMigrator`]. This crate provides:
//! - The plan entry type and the migrator trait (closures implement it too)
//! - An [`IndexDiffer`] comparing a plan with persisted index state
//! - A store-backed migrator and an in-memory [`IndexStore`]
//!
//! ```text
//! ┌────────────┐     ┌──────────────┐     ┌─────────────┐
//! │ Index Plan │────▶│ Index Differ │────▶│ Index Store │
//! └────────────┘     └──────────────┘     └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use tablewright_migrate::{MemoryIndexStore, StoreMigrator};
//!
//! let migrator = StoreMigrator::new(MemoryIndexStore::new());
//! migrator.migrate(table.as_ref(), &plan)?;
//! ```

pub mod diff;
pub mod error;
pub mod plan;
pub mod store;

pub use diff::{IndexDiff, IndexDiffer, IndexInfo};
pub use error::{MigrateResult, MigrationError};
pub use plan::{IndexMigrator, IndexPlanEntry, validate_plan};
pub use store::{IndexStore, MemoryIndexStore, StoreMigrator};
