//! Statement builders for INSERT, UPDATE and DELETE.
//!
//! All builders are metadata-driven: the column lists come from the entity's
//! declared fields, never from the instance. Set-scoped update/delete reuse
//! the same [`Filter`] composition the SELECT builder uses.

use entitystore_core::{
    Engine, Entity, EntityInfo, Error, MetadataErrorKind, Result, Value,
};

use crate::condition::Filter;
use crate::statement::Statement;

/// INSERT builder for one entity instance.
#[derive(Debug)]
pub struct InsertBuilder<'a, E: Entity> {
    info: &'a EntityInfo,
    entity: &'a E,
}

impl<'a, E: Entity> InsertBuilder<'a, E> {
    pub fn new(info: &'a EntityInfo, entity: &'a E) -> Self {
        Self { info, entity }
    }

    /// Render `INSERT INTO [Entity] (cols…) VALUES (@p0…)`.
    ///
    /// Identity-scheme keys and row version columns are store-generated and
    /// skipped.
    pub fn to_statement(&self, engine: Engine) -> Statement {
        let mut columns = Vec::new();
        let mut params = Vec::new();

        for field in self.info.fields() {
            if field.skip_on_insert() {
                continue;
            }
            columns.push(field.name);
            params.push(self.entity.field_value(field.name));
        }

        let placeholders: Vec<String> = (0..params.len()).map(|i| engine.placeholder(i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            engine.quote(self.info.entity_name()),
            columns.join(", "),
            placeholders.join(", ")
        );
        Statement::new(sql, params)
    }
}

/// UPDATE builder for one entity instance, scoped to its primary key.
#[derive(Debug)]
pub struct UpdateBuilder<'a, E: Entity> {
    info: &'a EntityInfo,
    entity: &'a E,
    only: Option<Vec<&'static str>>,
}

impl<'a, E: Entity> UpdateBuilder<'a, E> {
    pub fn new(info: &'a EntityInfo, entity: &'a E) -> Self {
        Self {
            info,
            entity,
            only: None,
        }
    }

    /// Restrict the SET list to the given fields.
    pub fn set_only(mut self, fields: &[&'static str]) -> Self {
        self.only = Some(fields.to_vec());
        self
    }

    /// Render `UPDATE [Entity] SET … WHERE <pk> = @pN`.
    ///
    /// Fails for entities without a declared primary key; there is nothing to
    /// bind the row identity to.
    pub fn to_statement(&self, engine: Engine) -> Result<Statement> {
        let pk = self.info.primary_key().ok_or_else(|| {
            Error::metadata(
                MetadataErrorKind::MissingPrimaryKey,
                self.info.entity_name(),
                "update by instance requires a primary key",
            )
        })?;

        let mut assignments = Vec::new();
        let mut params = Vec::new();
        for field in self.info.fields() {
            if field.is_primary_key() || field.row_version {
                continue;
            }
            if let Some(only) = &self.only {
                if !only.contains(&field.name) {
                    continue;
                }
            }
            assignments.push(format!("{} = {}", field.name, engine.placeholder(params.len())));
            params.push(self.entity.field_value(field.name));
        }

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = {}",
            engine.quote(self.info.entity_name()),
            assignments.join(", "),
            pk.name,
            engine.placeholder(params.len())
        );
        params.push(self.entity.field_value(pk.name));
        Ok(Statement::new(sql, params))
    }
}

/// Set-scoped UPDATE: explicit assignments over a filtered row set.
#[derive(Debug)]
pub struct UpdateSet<'a> {
    info: &'a EntityInfo,
    assignments: Vec<(String, Value)>,
    filter: Option<Filter>,
}

impl<'a> UpdateSet<'a> {
    pub fn new(info: &'a EntityInfo) -> Self {
        Self {
            info,
            assignments: Vec::new(),
            filter: None,
        }
    }

    /// Assign a value to a column.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assignments.push((field.into(), value.into()));
        self
    }

    /// Scope the affected row set; successive calls AND-combine.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(match self.filter {
            Some(existing) => existing.and(filter),
            None => filter,
        });
        self
    }

    /// Render `UPDATE [Entity] SET … [WHERE …]`.
    pub fn to_statement(&self, engine: Engine) -> Result<Statement> {
        if self.assignments.is_empty() {
            return Err(Error::Custom(format!(
                "update on '{}' assigns no columns",
                self.info.entity_name()
            )));
        }

        let mut params = Vec::new();
        let assignments: Vec<String> = self
            .assignments
            .iter()
            .map(|(field, value)| {
                let clause = format!("{} = {}", field, engine.placeholder(params.len()));
                params.push(value.clone());
                clause
            })
            .collect();

        let mut sql = format!(
            "UPDATE {} SET {}",
            engine.quote(self.info.entity_name()),
            assignments.join(", ")
        );
        if let Some(filter) = &self.filter {
            sql.push_str(" WHERE ");
            sql.push_str(&filter.build(engine, &mut params, 0));
        }
        Ok(Statement::new(sql, params))
    }
}

/// DELETE builder: whole-table, filter-scoped, by key, or by key list.
#[derive(Debug)]
pub struct DeleteBuilder<'a> {
    info: &'a EntityInfo,
    filter: Option<Filter>,
}

impl<'a> DeleteBuilder<'a> {
    pub fn new(info: &'a EntityInfo) -> Self {
        Self { info, filter: None }
    }

    /// Scope the affected row set; successive calls AND-combine.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(match self.filter {
            Some(existing) => existing.and(filter),
            None => filter,
        });
        self
    }

    /// Delete the single row carrying the given primary key value.
    pub fn by_key(info: &'a EntityInfo, key: Value) -> Result<Self> {
        let pk = require_pk(info, "delete by key")?;
        Ok(Self::new(info).filter(Filter::eq(pk, key)))
    }

    /// Delete every row whose primary key is in the list.
    pub fn by_keys(info: &'a EntityInfo, keys: Vec<Value>) -> Result<Self> {
        let pk = require_pk(info, "delete by key list")?;
        Ok(Self::new(info).filter(Filter::any_of(pk, keys)))
    }

    /// Render `DELETE FROM [Entity] [WHERE …]`.
    pub fn to_statement(&self, engine: Engine) -> Statement {
        let mut params = Vec::new();
        let mut sql = format!("DELETE FROM {}", engine.quote(self.info.entity_name()));
        if let Some(filter) = &self.filter {
            sql.push_str(" WHERE ");
            sql.push_str(&filter.build(engine, &mut params, 0));
        }
        Statement::new(sql, params)
    }
}

fn require_pk<'i>(info: &'i EntityInfo, operation: &str) -> Result<&'i str> {
    info.primary_key().map(|f| f.name).ok_or_else(|| {
        Error::metadata(
            MetadataErrorKind::MissingPrimaryKey,
            info.entity_name(),
            format!("{operation} requires a primary key"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use entitystore_core::{EntityInfoBuilder, FieldInfo, KeyScheme, StoreType};

    struct Book {
        id: i32,
        title: String,
        author_id: i32,
    }

    impl Entity for Book {
        fn declare() -> EntityInfoBuilder {
            EntityInfo::builder("Book")
                .field(FieldInfo::new("Id", StoreType::Integer).primary_key(KeyScheme::Identity))
                .field(FieldInfo::new("Title", StoreType::NVarChar(200)))
                .field(FieldInfo::new("Version", StoreType::RowVersion).row_version(true))
                .foreign_key(FieldInfo::new("AuthorId", StoreType::Integer), "Author", "Id")
        }

        fn default_instance() -> Self {
            Self {
                id: 0,
                title: String::new(),
                author_id: 0,
            }
        }

        fn field_value(&self, field: &str) -> Value {
            match field {
                "Id" => Value::Int(self.id),
                "Title" => Value::Text(self.title.clone()),
                "AuthorId" => Value::Int(self.author_id),
                _ => Value::Null,
            }
        }

        fn set_field(&mut self, field: &str, value: Value) -> Result<()> {
            match field {
                "Id" => self.id = value.try_into()?,
                "Title" => self.title = value.try_into()?,
                "AuthorId" => self.author_id = value.try_into()?,
                _ => return Err(Error::Custom(format!("unknown field '{field}'"))),
            }
            Ok(())
        }
    }

    fn info() -> EntityInfo {
        Book::declare().build().unwrap()
    }

    fn sample() -> Book {
        Book {
            id: 9,
            title: "Le Comte de Monte-Cristo".to_string(),
            author_id: 3,
        }
    }

    #[test]
    fn insert_skips_identity_key_and_row_version() {
        let info = info();
        let book = sample();
        let statement = InsertBuilder::new(&info, &book).to_statement(Engine::Sqlite);

        assert_eq!(
            statement.sql,
            "INSERT INTO [Book] (Title, AuthorId) VALUES (@p0, @p1)"
        );
        assert_eq!(
            statement.params,
            vec![
                Value::Text("Le Comte de Monte-Cristo".to_string()),
                Value::Int(3)
            ]
        );
    }

    #[test]
    fn update_binds_key_last() {
        let info = info();
        let book = sample();
        let statement = UpdateBuilder::new(&info, &book)
            .to_statement(Engine::Sqlite)
            .unwrap();

        assert_eq!(
            statement.sql,
            "UPDATE [Book] SET Title = @p0, AuthorId = @p1 WHERE Id = @p2"
        );
        assert_eq!(statement.params[2], Value::Int(9));
    }

    #[test]
    fn update_set_only_restricts_columns() {
        let info = info();
        let book = sample();
        let statement = UpdateBuilder::new(&info, &book)
            .set_only(&["Title"])
            .to_statement(Engine::Sqlite)
            .unwrap();

        assert_eq!(statement.sql, "UPDATE [Book] SET Title = @p0 WHERE Id = @p1");
    }

    #[test]
    fn update_without_primary_key_is_rejected() {
        struct Log;
        impl Entity for Log {
            fn declare() -> EntityInfoBuilder {
                EntityInfo::builder("Log").field(FieldInfo::new("Line", StoreType::NText))
            }
            fn default_instance() -> Self {
                Log
            }
            fn field_value(&self, _field: &str) -> Value {
                Value::Null
            }
            fn set_field(&mut self, _field: &str, _value: Value) -> Result<()> {
                Ok(())
            }
        }

        let info = Log::declare().build().unwrap();
        let err = UpdateBuilder::new(&info, &Log)
            .to_statement(Engine::Sqlite)
            .unwrap_err();
        assert!(err.is_metadata(MetadataErrorKind::MissingPrimaryKey));
    }

    #[test]
    fn update_set_scopes_by_filter() {
        let info = info();
        let statement = UpdateSet::new(&info)
            .set("Title", "n/a")
            .filter(Filter::lt("AuthorId", 5))
            .to_statement(Engine::Sqlite)
            .unwrap();

        assert_eq!(
            statement.sql,
            "UPDATE [Book] SET Title = @p0 WHERE AuthorId < @p1"
        );
        assert_eq!(
            statement.params,
            vec![Value::Text("n/a".to_string()), Value::Int(5)]
        );
    }

    #[test]
    fn delete_by_keys_renders_in_list() {
        let info = info();
        let statement = DeleteBuilder::by_keys(
            &info,
            vec![Value::Int(1), Value::Int(2), Value::Int(3)],
        )
        .unwrap()
        .to_statement(Engine::Sqlite);

        assert_eq!(statement.sql, "DELETE FROM [Book] WHERE Id IN (@p0, @p1, @p2)");
        assert_eq!(statement.params.len(), 3);
    }

    #[test]
    fn unfiltered_delete_clears_the_table() {
        let info = info();
        let statement = DeleteBuilder::new(&info).to_statement(Engine::Sqlite);
        assert_eq!(statement.sql, "DELETE FROM [Book]");
    }
}
