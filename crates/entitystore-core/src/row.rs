//! Raw result rows.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result, TypeError};
use crate::value::Value;

/// Column metadata shared across all rows in a result set.
///
/// Wrapped in `Arc` so rows from the same query share one copy.
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    names: Vec<String>,
    name_to_index: HashMap<String, usize>,
}

impl ColumnInfo {
    /// Create new column info from a list of column names.
    pub fn new(names: Vec<String>) -> Self {
        let name_to_index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            names,
            name_to_index,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Get the index of a column by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// Check if a column exists.
    pub fn contains(&self, name: &str) -> bool {
        self.name_to_index.contains_key(name)
    }

    /// Get all column names.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// A single row returned from the store.
///
/// Provides both ordinal and name-based access; `Value::Null` is the null
/// marker, distinguishable from any real value.
#[derive(Debug, Clone)]
pub struct Row {
    values: Vec<Value>,
    columns: Arc<ColumnInfo>,
}

impl Row {
    /// Create a new row with the given columns and values.
    pub fn new(column_names: Vec<String>, values: Vec<Value>) -> Self {
        Self {
            values,
            columns: Arc::new(ColumnInfo::new(column_names)),
        }
    }

    /// Create a new row sharing column metadata with its result set.
    pub fn with_columns(columns: Arc<ColumnInfo>, values: Vec<Value>) -> Self {
        Self { values, columns }
    }

    /// The shared column metadata.
    pub fn column_info(&self) -> Arc<ColumnInfo> {
        Arc::clone(&self.columns)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a value by column ordinal.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get a value by column name.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns.index_of(name).and_then(|i| self.values.get(i))
    }

    /// Check if a column exists by name.
    pub fn contains_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }

    /// Get a typed value by column name.
    pub fn get_named<T>(&self, name: &str) -> Result<T>
    where
        T: TryFrom<Value, Error = Error>,
    {
        let value = self.get_by_name(name).ok_or_else(|| {
            Error::Type(TypeError {
                expected: std::any::type_name::<T>(),
                actual: format!("column '{}' not found", name),
                column: Some(name.to_string()),
            })
        })?;
        T::try_from(value.clone()).map_err(|e| match e {
            Error::Type(mut te) => {
                te.column = Some(name.to_string());
                Error::Type(te)
            }
            e => e,
        })
    }

    /// Iterate over (column name, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> Row {
        Row::new(
            vec!["Id".to_string(), "Name".to_string()],
            vec![Value::Int(1), Value::Text("Dumas".to_string())],
        )
    }

    #[test]
    fn ordinal_and_name_access() {
        let row = sample_row();
        assert_eq!(row.len(), 2);
        assert_eq!(row.get(0), Some(&Value::Int(1)));
        assert_eq!(row.get(5), None);
        assert_eq!(row.get_by_name("Name"), Some(&Value::Text("Dumas".into())));
        assert_eq!(row.get_by_name("Missing"), None);
        assert!(row.contains_column("Id"));
    }

    #[test]
    fn typed_access_attaches_column_context() {
        let row = sample_row();
        assert_eq!(row.get_named::<i64>("Id").unwrap(), 1);
        assert_eq!(row.get_named::<String>("Name").unwrap(), "Dumas");

        let err = row.get_named::<i64>("Name").unwrap_err();
        assert!(err.to_string().contains("Name"));

        assert!(row.get_named::<i64>("Missing").is_err());
    }

    #[test]
    fn null_columns_read_as_optional() {
        let row = Row::new(vec!["Age".to_string()], vec![Value::Null]);
        assert_eq!(row.get_named::<Option<i32>>("Age").unwrap(), None);
        assert!(row.get_named::<i32>("Age").is_err());
    }

    #[test]
    fn rows_share_column_metadata() {
        let columns = Arc::new(ColumnInfo::new(vec!["Id".to_string()]));
        let first = Row::with_columns(Arc::clone(&columns), vec![Value::Int(1)]);
        let second = Row::with_columns(Arc::clone(&columns), vec![Value::Int(2)]);

        assert!(Arc::ptr_eq(&first.column_info(), &second.column_info()));
        assert_eq!(second.get_named::<i32>("Id").unwrap(), 2);
    }
}
