//! Row-to-entity materialization through the identity cache.

use std::sync::{Arc, RwLock};

use entitystore_core::{Entity, EntityInfo, Error, Result, Row};

use crate::cache::{CacheMode, EntityRef};

/// Materializes raw rows into entities, consulting the identity cache.
///
/// In full-name mode (joined/multi-entity projections) columns are read
/// under the `<Entity><Field>` alias; otherwise under the bare field name.
#[derive(Debug, Clone, Default)]
pub struct EntitySerializer {
    use_full_name: bool,
}

impl EntitySerializer {
    /// Serializer for single-entity result sets.
    pub fn new() -> Self {
        Self {
            use_full_name: false,
        }
    }

    /// Serializer for joined result sets with aliased columns.
    pub fn with_full_names() -> Self {
        Self {
            use_full_name: true,
        }
    }

    /// Materialize one row.
    ///
    /// Returns `Ok(None)` when the row carries no entity (missing or null
    /// primary key). A cache hit returns the cached shared reference without
    /// repopulating it: an already-materialized instance is never overwritten
    /// by a later row read. On a miss the fresh instance enters the cache
    /// *before* population so reference cycles during graph population
    /// resolve against the cache instead of recursing.
    pub fn deserialize<E: Entity>(
        &self,
        info: &EntityInfo,
        row: &Row,
        cache: &mut CacheMode,
    ) -> Result<Option<EntityRef<E>>> {
        let Some(pk) = info.primary_key() else {
            // no key to map on: materialize uncached
            let entity = Arc::new(RwLock::new(E::default_instance()));
            self.populate(info, row, &entity)?;
            return Ok(Some(entity));
        };

        let key_column = self.column_name(info, pk.name);
        let Some(raw_key) = row.get_by_name(&key_column) else {
            return Ok(None);
        };
        let key = pk.store_type.coerce(raw_key).map_err(|e| {
            Error::population(
                info.entity_name(),
                pk.name,
                format!("{raw_key:?}"),
                e.to_string(),
            )
        })?;
        if key.is_null() {
            return Ok(None);
        }

        if let Some(cached) = cache.lookup::<E>(&key) {
            tracing::trace!(entity = info.entity_name(), "identity cache hit");
            return Ok(Some(cached));
        }

        let entity = Arc::new(RwLock::new(E::default_instance()));
        cache.insert::<E>(key, Arc::clone(&entity));
        self.populate(info, row, &entity)?;
        Ok(Some(entity))
    }

    fn column_name(&self, info: &EntityInfo, field: &str) -> String {
        if self.use_full_name {
            format!("{}{}", info.entity_name(), field)
        } else {
            field.to_string()
        }
    }

    /// Fill every declared field from the row, skipping absent and null
    /// columns. A conversion or assignment failure is fatal for the row and
    /// wrapped with entity/field/value context.
    fn populate<E: Entity>(
        &self,
        info: &EntityInfo,
        row: &Row,
        entity: &EntityRef<E>,
    ) -> Result<()> {
        let mut guard = entity.write().expect("entity lock poisoned");
        for field in info.fields() {
            let column = self.column_name(info, field.name);
            let Some(raw) = row.get_by_name(&column) else {
                continue;
            };
            if raw.is_null() {
                continue;
            }
            let coerced = field.store_type.coerce(raw).map_err(|e| {
                Error::population(
                    info.entity_name(),
                    field.name,
                    format!("{raw:?}"),
                    e.to_string(),
                )
            })?;
            guard.set_field(field.name, coerced).map_err(|e| {
                Error::population(
                    info.entity_name(),
                    field.name,
                    format!("{raw:?}"),
                    e.to_string(),
                )
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entitystore_core::{
        EntityInfoBuilder, FieldInfo, KeyScheme, StoreType, Value,
    };

    #[derive(Debug)]
    struct Book {
        id: i32,
        title: String,
        pages: i32,
    }

    impl Entity for Book {
        fn declare() -> EntityInfoBuilder {
            EntityInfo::builder("Book")
                .field(FieldInfo::new("Id", StoreType::Integer).primary_key(KeyScheme::Assigned))
                .field(FieldInfo::new("Title", StoreType::NVarChar(200)))
                .field(FieldInfo::new("Pages", StoreType::Integer).nullable(true))
        }
        fn default_instance() -> Self {
            Self {
                id: 0,
                title: String::new(),
                pages: -1,
            }
        }
        fn field_value(&self, field: &str) -> Value {
            match field {
                "Id" => Value::Int(self.id),
                "Title" => Value::Text(self.title.clone()),
                "Pages" => Value::Int(self.pages),
                _ => Value::Null,
            }
        }
        fn set_field(&mut self, field: &str, value: Value) -> Result<()> {
            match field {
                "Id" => self.id = value.try_into()?,
                "Title" => self.title = value.try_into()?,
                "Pages" => self.pages = value.try_into()?,
                _ => return Err(Error::Custom(format!("unknown field '{field}'"))),
            }
            Ok(())
        }
    }

    fn info() -> EntityInfo {
        Book::declare().build().unwrap()
    }

    fn book_row(id: i32, title: &str) -> Row {
        Row::new(
            vec!["Id".to_string(), "Title".to_string(), "Pages".to_string()],
            vec![Value::Int(id), Value::Text(title.to_string()), Value::Null],
        )
    }

    #[test]
    fn materializes_and_populates_declared_fields() {
        let info = info();
        let mut cache = CacheMode::identity();
        let entity = EntitySerializer::new()
            .deserialize::<Book>(&info, &book_row(1, "Vingt ans après"), &mut cache)
            .unwrap()
            .unwrap();

        let book = entity.read().unwrap();
        assert_eq!(book.id, 1);
        assert_eq!(book.title, "Vingt ans après");
        // null column left the default in place
        assert_eq!(book.pages, -1);
    }

    #[test]
    fn second_read_returns_cached_reference_without_repopulating() {
        let info = info();
        let mut cache = CacheMode::identity();
        let serializer = EntitySerializer::new();

        let first = serializer
            .deserialize::<Book>(&info, &book_row(1, "original"), &mut cache)
            .unwrap()
            .unwrap();
        let second = serializer
            .deserialize::<Book>(&info, &book_row(1, "changed on disk"), &mut cache)
            .unwrap()
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.read().unwrap().title, "original");
    }

    #[test]
    fn invalidated_entry_materializes_fresh_on_next_read() {
        let info = info();
        let mut cache = CacheMode::identity();
        let serializer = EntitySerializer::new();

        let first = serializer
            .deserialize::<Book>(&info, &book_row(1, "original"), &mut cache)
            .unwrap()
            .unwrap();
        assert!(cache.invalidate_entity(&first));

        let second = serializer
            .deserialize::<Book>(&info, &book_row(1, "reloaded"), &mut cache)
            .unwrap()
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.read().unwrap().title, "reloaded");
    }

    #[test]
    fn missing_or_null_key_is_no_entity() {
        let info = info();
        let mut cache = CacheMode::identity();
        let serializer = EntitySerializer::new();

        let keyless = Row::new(vec!["Title".to_string()], vec![Value::Text("x".into())]);
        assert!(
            serializer
                .deserialize::<Book>(&info, &keyless, &mut cache)
                .unwrap()
                .is_none()
        );

        let null_key = Row::new(
            vec!["Id".to_string(), "Title".to_string()],
            vec![Value::Null, Value::Text("x".into())],
        );
        assert!(
            serializer
                .deserialize::<Book>(&info, &null_key, &mut cache)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn full_name_mode_reads_aliased_columns() {
        let info = info();
        let mut cache = CacheMode::identity();
        let row = Row::new(
            vec!["BookId".to_string(), "BookTitle".to_string()],
            vec![Value::Int(4), Value::Text("Candide".into())],
        );

        let entity = EntitySerializer::with_full_names()
            .deserialize::<Book>(&info, &row, &mut cache)
            .unwrap()
            .unwrap();
        assert_eq!(entity.read().unwrap().title, "Candide");

        // plain-name serializer sees no key column in this projection
        assert!(
            EntitySerializer::new()
                .deserialize::<Book>(&info, &row, &mut cache)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn population_failure_names_entity_field_and_value() {
        let info = info();
        let mut cache = CacheMode::identity();
        let bad = Row::new(
            vec!["Id".to_string(), "Title".to_string()],
            vec![Value::Int(1), Value::Bytes(vec![1, 2, 3])],
        );

        let err = EntitySerializer::new()
            .deserialize::<Book>(&info, &bad, &mut cache)
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Book"));
        assert!(msg.contains("Title"));
        assert!(msg.contains("Bytes"));
    }

    #[test]
    fn no_cache_mode_materializes_fresh_instances() {
        let info = info();
        let mut cache = CacheMode::off();
        let serializer = EntitySerializer::new();

        let first = serializer
            .deserialize::<Book>(&info, &book_row(1, "a"), &mut cache)
            .unwrap()
            .unwrap();
        let second = serializer
            .deserialize::<Book>(&info, &book_row(1, "b"), &mut cache)
            .unwrap()
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.read().unwrap().title, "b");
    }
}
