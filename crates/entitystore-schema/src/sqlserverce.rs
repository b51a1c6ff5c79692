//! SQL Server Compact schema checker.
//!
//! Tables are created bare; key constraints are added with ALTER statements.
//! Existence probes go through the INFORMATION_SCHEMA views.

use entitystore_core::{Engine, Result, Row, StoreBackend, Value};

use crate::checker::SchemaChecker;

/// Schema checker for SQL Server Compact stores.
pub struct SqlServerCeChecker;

fn scalar_count(rows: &[Row]) -> i64 {
    rows.first()
        .and_then(|row| row.get(0))
        .and_then(Value::as_i64)
        .unwrap_or(0)
}

impl SchemaChecker for SqlServerCeChecker {
    fn engine(&self) -> Engine {
        Engine::SqlServerCe
    }

    fn table_exists(&self, backend: &mut dyn StoreBackend, table: &str) -> Result<bool> {
        let rows = backend.query(
            "SELECT COUNT(*) FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_NAME = @p0",
            &[Value::Text(table.to_string())],
        )?;
        Ok(scalar_count(&rows) > 0)
    }

    fn constraint_exists(
        &self,
        backend: &mut dyn StoreBackend,
        table: &str,
        name: &str,
    ) -> Result<bool> {
        let rows = backend.query(
            "SELECT COUNT(*) FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS \
             WHERE TABLE_NAME = @p0 AND CONSTRAINT_NAME = @p1",
            &[Value::Text(table.to_string()), Value::Text(name.to_string())],
        )?;
        Ok(scalar_count(&rows) > 0)
    }

    fn index_exists(
        &self,
        backend: &mut dyn StoreBackend,
        table: &str,
        name: &str,
    ) -> Result<bool> {
        let rows = backend.query(
            "SELECT COUNT(*) FROM INFORMATION_SCHEMA.INDEXES \
             WHERE TABLE_NAME = @p0 AND INDEX_NAME = @p1",
            &[Value::Text(table.to_string()), Value::Text(name.to_string())],
        )?;
        Ok(scalar_count(&rows) > 0)
    }

    fn supports_add_constraint(&self) -> bool {
        true
    }
}
