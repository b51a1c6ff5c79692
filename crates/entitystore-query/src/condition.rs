//! Boolean filter trees for WHERE clauses.
//!
//! Filters form a tree of comparison, LIKE, IN and null-test leaves combined
//! with AND/OR/NOT. Every leaf literal binds as a positional parameter
//! (`@p0`, `@p1`, …) rather than being inlined, preventing injection and
//! allowing plan caching.

use entitystore_core::{Engine, Value};

use crate::statement::Statement;

/// A column reference, optionally qualified with its entity name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    /// Entity name; rendered bracket-quoted when present
    pub entity: Option<String>,
    /// Column name; rendered bare
    pub field: String,
}

impl ColumnRef {
    /// An unqualified column reference.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            entity: None,
            field: field.into(),
        }
    }

    /// A column qualified with its entity name.
    pub fn qualified(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            entity: Some(entity.into()),
            field: field.into(),
        }
    }

    /// Render `[Entity].Field` or the bare field name.
    pub fn render(&self, engine: Engine) -> String {
        match &self.entity {
            Some(entity) => format!("{}.{}", engine.quote(entity), self.field),
            None => self.field.clone(),
        }
    }
}

impl From<&str> for ColumnRef {
    fn from(field: &str) -> Self {
        ColumnRef::new(field)
    }
}

impl From<String> for ColumnRef {
    fn from(field: String) -> Self {
        ColumnRef::new(field)
    }
}

impl From<(&str, &str)> for ColumnRef {
    fn from((entity, field): (&str, &str)) -> Self {
        ColumnRef::qualified(entity, field)
    }
}

/// Comparison operators for filter leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
}

impl CompareOp {
    /// SQL text for this operator.
    pub const fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Like => "LIKE",
        }
    }
}

/// A boolean filter expression tree.
#[derive(Debug, Clone)]
pub enum Filter {
    /// `<column> <op> <bound value>`
    Compare {
        column: ColumnRef,
        op: CompareOp,
        value: Value,
    },
    /// `<column> IN (<bound values>)`
    In { column: ColumnRef, values: Vec<Value> },
    /// `<column> IS [NOT] NULL`
    IsNull { column: ColumnRef, negated: bool },
    /// Both sides must hold
    And(Box<Filter>, Box<Filter>),
    /// Either side must hold
    Or(Box<Filter>, Box<Filter>),
    /// Negation; renders exactly `NOT(<inner>)`
    Not(Box<Filter>),
}

impl Filter {
    fn compare(column: impl Into<ColumnRef>, op: CompareOp, value: impl Into<Value>) -> Self {
        Filter::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// Equality leaf.
    pub fn eq(column: impl Into<ColumnRef>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Eq, value)
    }

    /// Inequality leaf.
    pub fn ne(column: impl Into<ColumnRef>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Ne, value)
    }

    /// Less-than leaf.
    pub fn lt(column: impl Into<ColumnRef>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Lt, value)
    }

    /// Less-or-equal leaf.
    pub fn le(column: impl Into<ColumnRef>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Le, value)
    }

    /// Greater-than leaf.
    pub fn gt(column: impl Into<ColumnRef>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Gt, value)
    }

    /// Greater-or-equal leaf.
    pub fn ge(column: impl Into<ColumnRef>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Ge, value)
    }

    /// LIKE pattern leaf; the pattern binds as a parameter.
    pub fn like(column: impl Into<ColumnRef>, pattern: impl Into<String>) -> Self {
        Self::compare(column, CompareOp::Like, Value::Text(pattern.into()))
    }

    /// IN-list leaf. An empty list renders as a never-true predicate.
    pub fn any_of(column: impl Into<ColumnRef>, values: Vec<Value>) -> Self {
        Filter::In {
            column: column.into(),
            values,
        }
    }

    /// `IS NULL` leaf.
    pub fn is_null(column: impl Into<ColumnRef>) -> Self {
        Filter::IsNull {
            column: column.into(),
            negated: false,
        }
    }

    /// `IS NOT NULL` leaf.
    pub fn is_not_null(column: impl Into<ColumnRef>) -> Self {
        Filter::IsNull {
            column: column.into(),
            negated: true,
        }
    }

    /// Logical AND.
    pub fn and(self, other: Filter) -> Self {
        Filter::And(Box::new(self), Box::new(other))
    }

    /// Logical OR.
    pub fn or(self, other: Filter) -> Self {
        Filter::Or(Box::new(self), Box::new(other))
    }

    /// Logical NOT.
    pub fn not(self) -> Self {
        Filter::Not(Box::new(self))
    }

    /// Render SQL, appending bound values to `params`.
    ///
    /// Placeholder indexes continue from `offset + params.len()`, so filters
    /// compose with clauses that already bound parameters.
    pub fn build(&self, engine: Engine, params: &mut Vec<Value>, offset: usize) -> String {
        match self {
            Filter::Compare { column, op, value } => {
                let index = offset + params.len();
                params.push(value.clone());
                format!(
                    "{} {} {}",
                    column.render(engine),
                    op.as_sql(),
                    engine.placeholder(index)
                )
            }
            Filter::In { column, values } => {
                if values.is_empty() {
                    return "1 = 0".to_string();
                }
                let placeholders: Vec<String> = values
                    .iter()
                    .map(|value| {
                        let index = offset + params.len();
                        params.push(value.clone());
                        engine.placeholder(index)
                    })
                    .collect();
                format!("{} IN ({})", column.render(engine), placeholders.join(", "))
            }
            Filter::IsNull { column, negated } => {
                let not = if *negated { " NOT" } else { "" };
                format!("{} IS{} NULL", column.render(engine), not)
            }
            Filter::And(left, right) => {
                let left_sql = left.build(engine, params, offset);
                let right_sql = right.build(engine, params, offset);
                format!("{left_sql} AND {right_sql}")
            }
            Filter::Or(left, right) => {
                let left_sql = left.build(engine, params, offset);
                let right_sql = right.build(engine, params, offset);
                format!("{left_sql} OR {right_sql}")
            }
            Filter::Not(inner) => {
                let inner_sql = inner.build(engine, params, offset);
                format!("NOT({inner_sql})")
            }
        }
    }

    /// Render as a standalone statement.
    pub fn to_statement(&self, engine: Engine) -> Statement {
        let mut params = Vec::new();
        let sql = self.build(engine, &mut params, 0);
        Statement::new(sql, params)
    }
}
