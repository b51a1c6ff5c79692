//! Schema reconciliation for entitystore.
//!
//! This crate compares declared entity metadata against the physical store
//! and issues the missing DDL:
//!
//! - DDL text generation from metadata (`ddl`)
//! - The per-constraint state machine and shared reconciliation flow
//!   (`checker`)
//! - Per-engine checkers with their existence probes (`sqlite`,
//!   `sqlserverce`)

pub mod checker;
pub mod ddl;
pub mod sqlite;
pub mod sqlserverce;

pub use checker::{
    ConstraintState, SchemaChecker, SchemaItem, SchemaReport, checker_for, ensure_compatibility,
};
pub use ddl::{add_fk_sql, add_pk_sql, create_index_sql, create_table_sql};
pub use sqlite::SqliteChecker;
pub use sqlserverce::SqlServerCeChecker;
