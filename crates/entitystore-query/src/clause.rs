//! Ordering and cardinality clauses.

use entitystore_core::{Engine, SortDirection};

use crate::condition::ColumnRef;

/// ORDER BY clause element.
#[derive(Debug, Clone)]
pub struct OrderBy {
    column: ColumnRef,
    direction: SortDirection,
}

impl OrderBy {
    /// Ascending order on a column.
    pub fn asc(column: impl Into<ColumnRef>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Ascending,
        }
    }

    /// Descending order on a column.
    pub fn desc(column: impl Into<ColumnRef>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Descending,
        }
    }

    /// Render `Column ASC` / `[Entity].Column DESC`.
    pub fn build(&self, engine: Engine) -> String {
        format!("{} {}", self.column.render(engine), self.direction.as_sql())
    }
}

/// Result cardinality bound. Renders as `TOP (n)` on SQL Server CE and as a
/// trailing `LIMIT n` on SQLite.
#[derive(Debug, Clone, Copy)]
pub struct Top(pub u64);
