//! Description types: the declarative input to the compiler.
//!
//! A [`TableDescription`] is an ordered set of named [`Member`]s plus mixins.
//! Everything here is plain data or shared callbacks; nothing talks to a
//! database until the compiler runs.

mod callback;
mod description;
mod field;
mod index;
mod member;
mod types;

pub use callback::*;
pub use description::*;
pub use field::*;
pub use index::*;
pub use member::*;
pub use types::*;
