//! SQLite schema checker.
//!
//! SQLite cannot add key constraints to an existing table; they travel
//! inline with CREATE TABLE. Existence probes go through `sqlite_master`.

use entitystore_core::{Engine, Result, StoreBackend, Value};

use crate::checker::SchemaChecker;

/// Schema checker for SQLite stores.
pub struct SqliteChecker;

impl SchemaChecker for SqliteChecker {
    fn engine(&self) -> Engine {
        Engine::Sqlite
    }

    fn table_exists(&self, backend: &mut dyn StoreBackend, table: &str) -> Result<bool> {
        let rows = backend.query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = @p0",
            &[Value::Text(table.to_string())],
        )?;
        Ok(!rows.is_empty())
    }

    fn constraint_exists(
        &self,
        _backend: &mut dyn StoreBackend,
        table: &str,
        name: &str,
    ) -> Result<bool> {
        // SQLite has no constraint catalog; key constraints are only ever
        // emitted inline at table creation, so this probe is never consulted.
        tracing::warn!(table, constraint = name, "sqlite cannot probe constraints");
        Ok(false)
    }

    fn index_exists(
        &self,
        backend: &mut dyn StoreBackend,
        _table: &str,
        name: &str,
    ) -> Result<bool> {
        let rows = backend.query(
            "SELECT name FROM sqlite_master WHERE type = 'index' AND name = @p0",
            &[Value::Text(name.to_string())],
        )?;
        Ok(!rows.is_empty())
    }

    fn supports_add_constraint(&self) -> bool {
        false
    }
}
