//! The store orchestrator.
//!
//! `SqlStore` wires the metadata registry, schema checker, statement
//! builders, serializer and identity cache together behind the
//! insert/update/delete/select surface. It stays thin: every concern lives
//! in the component that owns it.

use std::sync::{Arc, Mutex};

use uuid::Uuid;

use entitystore_core::{
    Check, Engine, Entity, EntityInfoCollection, Error, MetadataErrorKind, Result, Row,
    StoreBackend, Value, uses_guid_scheme,
};
use entitystore_query::{
    DeleteBuilder, Filter, InsertBuilder, SelectQuery, Statement, UpdateBuilder, UpdateSet,
};
use entitystore_schema::{SchemaReport, checker_for, ensure_compatibility};

use crate::cache::{CacheMode, EntityRef};
use crate::serializer::EntitySerializer;

/// A data store over one backend session.
///
/// Calls are synchronous and blocking; the registry carries its own lock and
/// the cache sits behind the store's mutex, but statement execution is
/// serialized by the single backend session.
pub struct SqlStore<B: StoreBackend> {
    backend: B,
    entities: EntityInfoCollection,
    cache: Mutex<CacheMode>,
}

impl<B: StoreBackend> SqlStore<B> {
    /// A store with identity-map caching.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            entities: EntityInfoCollection::new(),
            cache: Mutex::new(CacheMode::identity()),
        }
    }

    /// A store that opts out of caching entirely.
    pub fn without_cache(backend: B) -> Self {
        Self {
            backend,
            entities: EntityInfoCollection::new(),
            cache: Mutex::new(CacheMode::off()),
        }
    }

    /// The engine of the underlying backend.
    pub fn engine(&self) -> Engine {
        self.backend.engine()
    }

    /// The underlying backend session.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// The registered entity metadata.
    pub fn entities(&self) -> &EntityInfoCollection {
        &self.entities
    }

    /// Register an entity type. Registering a known type is a no-op.
    pub fn add_type<E: Entity>(&self) -> Result<()> {
        self.entities.register::<E>().map(|_| ())
    }

    /// Create the physical store for everything registered so far.
    pub fn create_store(&mut self) -> Result<SchemaReport> {
        self.ensure_compatibility()
    }

    /// Reconcile declared metadata against the physical schema.
    ///
    /// Idempotent; a pass over a compatible store issues no DDL.
    pub fn ensure_compatibility(&mut self) -> Result<SchemaReport> {
        let checker = checker_for(self.backend.engine());
        ensure_compatibility(checker.as_ref(), &mut self.backend, &self.entities)
    }

    /// Insert one entity.
    ///
    /// A GUID-scheme primary key with an unset value gets a freshly
    /// generated identifier written back to the caller's instance, exactly
    /// once, before the statement is built.
    pub fn insert<E: Entity>(&mut self, entity: &mut E) -> Result<()> {
        let info = self.entities.require::<E>()?;

        if let Some(pk) = info.primary_key() {
            if uses_guid_scheme(pk) && entity.field_value(pk.name).is_unset_key() {
                let id = Uuid::new_v4();
                entity.set_field(pk.name, Value::from(id))?;
                tracing::debug!(
                    entity = info.entity_name(),
                    key = %id,
                    "generated identifier for unset GUID key"
                );
            }
        }

        // One precondition pass reporting every violation at once.
        let mut check = Check::new();
        for field in info.fields() {
            if field.skip_on_insert() || field.nullable || field.default.is_some() {
                continue;
            }
            check.not_null(field.name, &entity.field_value(field.name));
        }
        check.checkpoint()?;

        let statement = InsertBuilder::new(&info, &*entity).to_statement(self.engine());
        tracing::debug!(entity = info.entity_name(), sql = %statement.sql, "insert");
        self.backend.execute(&statement.sql, &statement.params)?;
        Ok(())
    }

    /// Update one entity, scoped to its primary key.
    pub fn update<E: Entity>(&mut self, entity: &E) -> Result<u64> {
        let info = self.entities.require::<E>()?;
        let statement = UpdateBuilder::new(&info, entity).to_statement(self.engine())?;
        tracing::debug!(entity = info.entity_name(), sql = %statement.sql, "update");
        self.backend.execute(&statement.sql, &statement.params)
    }

    /// Delete one entity by its primary key value.
    ///
    /// The identity cache is not touched; eviction is the caller's decision
    /// (see [`SqlStore::invalidate`]).
    pub fn delete<E: Entity>(&mut self, entity: &E) -> Result<u64> {
        let info = self.entities.require::<E>()?;
        let pk = info.primary_key().ok_or_else(|| {
            Error::metadata(
                MetadataErrorKind::MissingPrimaryKey,
                info.entity_name(),
                "delete by instance requires a primary key",
            )
        })?;
        let statement =
            DeleteBuilder::by_key(&info, entity.field_value(pk.name))?.to_statement(self.engine());
        self.backend.execute(&statement.sql, &statement.params)
    }

    /// Start a SELECT over a registered entity.
    pub fn select<E: Entity>(&self) -> Result<SelectQuery<E>> {
        SelectQuery::new(&self.entities, self.engine())
    }

    /// Execute a SELECT and materialize the root entity of every row.
    ///
    /// Joined one-to-many projections repeat the root rows; the identity map
    /// hands back the same shared reference for a repeated key and the
    /// result is de-duplicated by identity.
    pub fn fetch<E: Entity>(&mut self, query: &SelectQuery<E>) -> Result<Vec<EntityRef<E>>> {
        let statement = query.to_statement();
        let rows = self.backend.query(&statement.sql, &statement.params)?;

        let serializer = if query.has_joins() {
            EntitySerializer::with_full_names()
        } else {
            EntitySerializer::new()
        };
        let info = query.root();

        let mut cache = self.cache.lock().expect("cache lock poisoned");
        let mut entities: Vec<EntityRef<E>> = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(entity) = serializer.deserialize::<E>(info, row, &mut cache)? {
                if !entities.iter().any(|seen| Arc::ptr_eq(seen, &entity)) {
                    entities.push(entity);
                }
            }
        }
        Ok(entities)
    }

    /// Execute a SELECT constrained to one row.
    pub fn fetch_first<E: Entity>(
        &mut self,
        query: SelectQuery<E>,
    ) -> Result<Option<EntityRef<E>>> {
        let query = query.top(1);
        Ok(self.fetch(&query)?.into_iter().next())
    }

    /// Count the rows a query matches.
    pub fn count<E: Entity>(&mut self, query: &SelectQuery<E>) -> Result<u64> {
        let statement = query.count_statement(None);
        let rows = self.backend.query(&statement.sql, &statement.params)?;
        let count = rows
            .first()
            .and_then(|row| row.get(0))
            .and_then(Value::as_i64)
            .unwrap_or(0);
        Ok(count as u64)
    }

    /// Execute an aggregate statement (grouped count/sum), returning the
    /// generic column-name → value rows.
    pub fn aggregate(&mut self, statement: &Statement) -> Result<Vec<Row>> {
        self.backend.query(&statement.sql, &statement.params)
    }

    /// Set-scoped update over a filtered row set.
    pub fn update_where<E: Entity>(
        &mut self,
        assignments: &[(&str, Value)],
        filter: Filter,
    ) -> Result<u64> {
        let info = self.entities.require::<E>()?;
        let mut set = UpdateSet::new(&info);
        for (field, value) in assignments {
            set = set.set(*field, value.clone());
        }
        let statement = set.filter(filter).to_statement(self.engine())?;
        self.backend.execute(&statement.sql, &statement.params)
    }

    /// Delete every row matching a filter.
    pub fn delete_where<E: Entity>(&mut self, filter: Filter) -> Result<u64> {
        let info = self.entities.require::<E>()?;
        let statement = DeleteBuilder::new(&info)
            .filter(filter)
            .to_statement(self.engine());
        self.backend.execute(&statement.sql, &statement.params)
    }

    /// Bulk-delete by key list in bundles.
    ///
    /// Issues `ceil(N / bundle_size)` delete statements and reports
    /// monotonically increasing progress percentages, starting at 0 and
    /// ending at 100.
    pub fn delete_by_bundle<E: Entity>(
        &mut self,
        keys: &[Value],
        bundle_size: usize,
        mut progress: impl FnMut(u32),
    ) -> Result<u64> {
        let info = self.entities.require::<E>()?;

        let mut check = Check::new();
        check.positive("bundleSize", bundle_size as i64);
        check.checkpoint()?;

        progress(0);
        if keys.is_empty() {
            progress(100);
            return Ok(0);
        }

        let mut affected = 0;
        let mut done = 0usize;
        for bundle in keys.chunks(bundle_size) {
            let statement =
                DeleteBuilder::by_keys(&info, bundle.to_vec())?.to_statement(self.engine());
            affected += self.backend.execute(&statement.sql, &statement.params)?;
            done += bundle.len();
            progress((done * 100 / keys.len()) as u32);
        }
        tracing::debug!(
            entity = info.entity_name(),
            keys = keys.len(),
            bundles = keys.len().div_ceil(bundle_size),
            "bulk delete complete"
        );
        Ok(affected)
    }

    /// Evict one cached instance by reference identity.
    pub fn invalidate<E: Entity>(&self, entity: &EntityRef<E>) -> bool {
        self.cache
            .lock()
            .expect("cache lock poisoned")
            .invalidate_entity(entity)
    }

    /// Evict every cached instance of a type matching a predicate.
    pub fn invalidate_where<E: Entity>(&self, predicate: impl Fn(&E) -> bool) {
        self.cache
            .lock()
            .expect("cache lock poisoned")
            .invalidate_where(predicate);
    }

    /// Drop the whole cache.
    pub fn clear_cache(&self) {
        self.cache.lock().expect("cache lock poisoned").clear();
    }
}
