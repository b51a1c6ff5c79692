//! Statement builders for entitystore.
//!
//! This crate turns registered entity metadata into SQL: a fluent SELECT
//! builder with FK-derived joins, a boolean filter tree with positional
//! parameter binding, and metadata-driven INSERT/UPDATE/DELETE builders.

pub mod builder;
pub mod clause;
pub mod condition;
pub mod join;
pub mod select;
pub mod statement;

pub use builder::{DeleteBuilder, InsertBuilder, UpdateBuilder, UpdateSet};
pub use clause::{OrderBy, Top};
pub use condition::{ColumnRef, CompareOp, Filter};
pub use join::{Join, JoinKind};
pub use select::SelectQuery;
pub use statement::Statement;
