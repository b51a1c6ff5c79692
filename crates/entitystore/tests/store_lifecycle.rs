//! End-to-end store behavior over an in-memory backend: schema
//! reconciliation idempotence, identity-map reads, and joined fetches.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use entitystore::ConstraintState;
use entitystore::prelude::*;

/// In-memory backend: a tiny schema catalog for the checker's probes plus a
/// queue of scripted result sets for SELECTs.
struct MemoryBackend {
    engine: Engine,
    tables: HashSet<String>,
    constraints: HashSet<(String, String)>,
    indexes: HashSet<String>,
    executed: Vec<(String, Vec<Value>)>,
    select_results: VecDeque<Vec<Row>>,
}

impl MemoryBackend {
    fn new(engine: Engine) -> Self {
        Self {
            engine,
            tables: HashSet::new(),
            constraints: HashSet::new(),
            indexes: HashSet::new(),
            executed: Vec::new(),
            select_results: VecDeque::new(),
        }
    }

    fn push_rows(&mut self, rows: Vec<Row>) {
        self.select_results.push_back(rows);
    }

    fn bracketed(sql: &str, after: &str) -> Option<String> {
        let rest = &sql[sql.find(after)? + after.len()..];
        let start = rest.find('[')? + 1;
        let end = rest.find(']')?;
        Some(rest[start..end].to_string())
    }

    fn count_row(n: i64) -> Vec<Row> {
        vec![Row::new(vec!["Count".to_string()], vec![Value::BigInt(n)])]
    }
}

impl StoreBackend for MemoryBackend {
    fn engine(&self) -> Engine {
        self.engine
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        self.executed.push((sql.to_string(), params.to_vec()));
        if sql.starts_with("CREATE TABLE") {
            let table = Self::bracketed(sql, "CREATE TABLE").unwrap();
            self.tables.insert(table);
        } else if sql.contains("ADD CONSTRAINT") {
            let table = Self::bracketed(sql, "ALTER TABLE").unwrap();
            let name = sql
                .split("ADD CONSTRAINT ")
                .nth(1)
                .and_then(|rest| rest.split_whitespace().next())
                .unwrap()
                .to_string();
            self.constraints.insert((table, name));
        } else if sql.starts_with("CREATE") && sql.contains("INDEX") {
            let name = sql
                .split("INDEX ")
                .nth(1)
                .and_then(|rest| rest.split_whitespace().next())
                .unwrap()
                .to_string();
            self.indexes.insert(name);
        }
        Ok(1)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let arg = |i: usize| {
            params
                .get(i)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        if sql.contains("sqlite_master") && sql.contains("'table'") {
            return Ok(if self.tables.contains(&arg(0)) {
                Self::count_row(1)
            } else {
                Vec::new()
            });
        }
        if sql.contains("sqlite_master") && sql.contains("'index'") {
            return Ok(if self.indexes.contains(&arg(0)) {
                Self::count_row(1)
            } else {
                Vec::new()
            });
        }
        if sql.contains("INFORMATION_SCHEMA.TABLES") {
            return Ok(Self::count_row(i64::from(self.tables.contains(&arg(0)))));
        }
        if sql.contains("INFORMATION_SCHEMA.TABLE_CONSTRAINTS") {
            let hit = self.constraints.contains(&(arg(0), arg(1)));
            return Ok(Self::count_row(i64::from(hit)));
        }
        if sql.contains("INFORMATION_SCHEMA.INDEXES") {
            return Ok(Self::count_row(i64::from(self.indexes.contains(&arg(1)))));
        }

        Ok(self.select_results.pop_front().unwrap_or_default())
    }
}

#[derive(Debug)]
struct Author {
    id: i32,
    name: String,
}

impl Entity for Author {
    fn declare() -> EntityInfoBuilder {
        EntityInfo::builder("Author")
            .field(FieldInfo::new("Id", StoreType::Integer).primary_key(KeyScheme::Identity))
            .field(
                FieldInfo::new("Name", StoreType::NVarChar(200))
                    .searchable(SortDirection::Ascending),
            )
    }

    fn default_instance() -> Self {
        Self {
            id: 0,
            name: String::new(),
        }
    }

    fn field_value(&self, field: &str) -> Value {
        match field {
            "Id" => Value::Int(self.id),
            "Name" => Value::Text(self.name.clone()),
            _ => Value::Null,
        }
    }

    fn set_field(&mut self, field: &str, value: Value) -> Result<()> {
        match field {
            "Id" => self.id = value.try_into()?,
            "Name" => self.name = value.try_into()?,
            _ => return Err(Error::Custom(format!("unknown field '{field}'"))),
        }
        Ok(())
    }
}

#[derive(Debug)]
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

fn author_row(id: i32, name: &str) -> Row {
    Row::new(
        vec!["Id".to_string(), "Name".to_string()],
        vec![Value::Int(id), Value::Text(name.to_string())],
    )
}

#[test]
fn repeated_registration_and_reconciliation_are_noops() {
    let mut store = SqlStore::new(MemoryBackend::new(Engine::SqlServerCe));
    store.add_type::<Author>().unwrap();
    store.add_type::<Book>().unwrap();
    store.add_type::<Author>().unwrap();
    assert_eq!(store.entities().len(), 2);

    let first = store.ensure_compatibility().unwrap();
    assert!(first.created_count() > 0);
    assert_eq!(
        first.state_of("ORM_FK_Book_Author"),
        Some(ConstraintState::Created)
    );

    let second = store.ensure_compatibility().unwrap();
    assert!(second.is_satisfied());
    assert_eq!(
        second.state_of("ORM_PK_Author"),
        Some(ConstraintState::Satisfied)
    );
}

#[test]
fn fetch_hands_out_one_shared_instance_per_row() {
    let mut backend = MemoryBackend::new(Engine::Sqlite);
    backend.push_rows(vec![author_row(1, "Dumas")]);
    backend.push_rows(vec![author_row(1, "changed on disk")]);

    let mut store = SqlStore::new(backend);
    store.add_type::<Author>().unwrap();

    let query = store.select::<Author>().unwrap();
    let first = store.fetch(&query).unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].read().unwrap().name, "Dumas");

    // while the first materialization stays cached, a second read returns
    // the identical shared reference and never overwrites populated fields
    let second = store.fetch(&query).unwrap();
    assert!(Arc::ptr_eq(&first[0], &second[0]));
    assert_eq!(second[0].read().unwrap().name, "Dumas");
}

#[test]
fn invalidated_instance_is_rebuilt_on_next_fetch() {
    let mut backend = MemoryBackend::new(Engine::Sqlite);
    backend.push_rows(vec![author_row(1, "Dumas")]);
    backend.push_rows(vec![author_row(1, "reloaded")]);

    let mut store = SqlStore::new(backend);
    store.add_type::<Author>().unwrap();

    let query = store.select::<Author>().unwrap();
    let first = store.fetch(&query).unwrap().remove(0);
    assert!(store.invalidate(&first));

    let fresh = store.fetch(&query).unwrap().remove(0);
    assert!(!Arc::ptr_eq(&first, &fresh));
    assert_eq!(fresh.read().unwrap().name, "reloaded");
}

#[test]
fn joined_fetch_dedups_repeated_root_rows() {
    let columns = vec![
        "AuthorId".to_string(),
        "AuthorName".to_string(),
        "BookId".to_string(),
        "BookTitle".to_string(),
        "BookAuthorId".to_string(),
    ];
    let row = |book_id: i32, title: &str| {
        Row::new(
            columns.clone(),
            vec![
                Value::Int(1),
                Value::Text("Dumas".to_string()),
                Value::Int(book_id),
                Value::Text(title.to_string()),
                Value::Int(1),
            ],
        )
    };

    let mut backend = MemoryBackend::new(Engine::Sqlite);
    backend.push_rows(vec![
        row(10, "Les Trois Mousquetaires"),
        row(11, "Vingt ans après"),
    ]);

    let mut store = SqlStore::new(backend);
    store.add_type::<Author>().unwrap();
    store.add_type::<Book>().unwrap();

    let query = store.select::<Author>().unwrap().join::<Book>().unwrap();
    let statement = query.to_statement();
    assert!(
        statement
            .sql
            .contains("FROM [Author] JOIN [Book] ON [Author].Id = [Book].AuthorId")
    );

    // two joined rows, one author
    let authors = store.fetch(&query).unwrap();
    assert_eq!(authors.len(), 1);
    assert_eq!(authors[0].read().unwrap().name, "Dumas");
}

#[test]
fn count_reads_the_scalar_row() {
    let mut backend = MemoryBackend::new(Engine::Sqlite);
    backend.push_rows(vec![Row::new(
        vec!["Count".to_string()],
        vec![Value::BigInt(3)],
    )]);

    let mut store = SqlStore::new(backend);
    store.add_type::<Author>().unwrap();

    let query = store.select::<Author>().unwrap();
    assert_eq!(store.count(&query).unwrap(), 3);
}

#[test]
fn uncached_store_materializes_fresh_instances_per_fetch() {
    let mut backend = MemoryBackend::new(Engine::Sqlite);
    backend.push_rows(vec![author_row(1, "Dumas")]);
    backend.push_rows(vec![author_row(1, "Dumas")]);

    let mut store = SqlStore::without_cache(backend);
    store.add_type::<Author>().unwrap();

    let query = store.select::<Author>().unwrap();
    let first = store.fetch(&query).unwrap().remove(0);
    let second = store.fetch(&query).unwrap().remove(0);
    assert!(!Arc::ptr_eq(&first, &second));
}
