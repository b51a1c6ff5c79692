//! Collaborator traits for the underlying store engine.
//!
//! Concrete drivers and connection management live outside this workspace.
//! The mapper reaches the physical store through `StoreBackend`: a command
//! execution surface returning affected-row counts and a row-reading surface
//! returning [`Row`]s whose null marker is `Value::Null`.

use crate::error::Result;
use crate::row::Row;
use crate::value::Value;

/// The embedded store engine a backend talks to.
///
/// The engine decides placeholder style, identifier quoting, result
/// cardinality syntax and column type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Engine {
    /// SQLite
    #[default]
    Sqlite,
    /// SQL Server Compact
    SqlServerCe,
}

impl Engine {
    /// Generate a positional parameter placeholder (0-based): `@p0`, `@p1`, …
    ///
    /// Both supported engines accept the `@`-prefixed form.
    pub fn placeholder(self, index: usize) -> String {
        format!("@p{index}")
    }

    /// Quote an identifier in the bracket style shared by both engines.
    ///
    /// Embedded closing brackets are doubled.
    pub fn quote(self, name: &str) -> String {
        format!("[{}]", name.replace(']', "]]"))
    }

    /// The engine name used in log output.
    pub const fn name(self) -> &'static str {
        match self {
            Engine::Sqlite => "sqlite",
            Engine::SqlServerCe => "sqlserverce",
        }
    }
}

/// Command-execution and row-reading surface of a concrete store.
///
/// All calls are synchronous and blocking for the duration of I/O; callers
/// that need timeouts must wrap calls themselves. Constraint and DDL errors
/// raised by the engine are surfaced as `Error::Store` untouched.
pub trait StoreBackend {
    /// Which engine this backend talks to.
    fn engine(&self) -> Engine;

    /// Execute a statement, returning the affected-row count.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Execute a query, returning the full result set.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;
}
