//! Schema reconciliation against the physical store.
//!
//! For every registered entity the checker walks table, primary key, foreign
//! keys and indexes through the state machine `Unverified → (exists check) →
//! {Satisfied | Created}`, issuing DDL only for what is missing. Re-running
//! against an already-compatible store performs no DDL.

use entitystore_core::{
    Engine, EntityInfo, EntityInfoCollection, Result, StoreBackend,
};

use crate::ddl;

/// Reconciliation state of one schema item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintState {
    /// Not checked against the store (e.g. FK whose target is unregistered)
    Unverified,
    /// Already present; no DDL issued
    Satisfied,
    /// Missing; DDL issued this run
    Created,
}

/// One reconciled item: a table, constraint or index.
#[derive(Debug, Clone)]
pub struct SchemaItem {
    pub name: String,
    pub state: ConstraintState,
}

/// The outcome of one `ensure_compatibility` pass.
#[derive(Debug, Clone, Default)]
pub struct SchemaReport {
    pub items: Vec<SchemaItem>,
}

impl SchemaReport {
    fn push(&mut self, name: impl Into<String>, state: ConstraintState) {
        self.items.push(SchemaItem {
            name: name.into(),
            state,
        });
    }

    /// How many items had DDL issued this run.
    pub fn created_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.state == ConstraintState::Created)
            .count()
    }

    /// Did the pass issue no DDL at all?
    pub fn is_satisfied(&self) -> bool {
        self.created_count() == 0
    }

    /// The state recorded for a named item, if present.
    pub fn state_of(&self, name: &str) -> Option<ConstraintState> {
        self.items
            .iter()
            .find(|item| item.name == name)
            .map(|item| item.state)
    }
}

/// Engine-specific schema probing.
///
/// The default `ensure_entity` flow is shared; implementations supply the
/// existence probes and declare whether the engine can add constraints to an
/// existing table.
pub trait SchemaChecker {
    /// The engine this checker probes.
    fn engine(&self) -> Engine;

    /// Does the entity's table exist in the physical store?
    fn table_exists(&self, backend: &mut dyn StoreBackend, table: &str) -> Result<bool>;

    /// Does a named constraint exist on the table?
    fn constraint_exists(
        &self,
        backend: &mut dyn StoreBackend,
        table: &str,
        name: &str,
    ) -> Result<bool>;

    /// Does a named index exist?
    fn index_exists(&self, backend: &mut dyn StoreBackend, table: &str, name: &str)
    -> Result<bool>;

    /// Can this engine add key constraints to an existing table?
    fn supports_add_constraint(&self) -> bool;

    /// Reconcile one entity: table, primary key, foreign keys, indexes.
    ///
    /// A foreign key whose referenced entity is not registered in the same
    /// collection stays `Unverified`; a later run picks it up once the
    /// target is registered.
    fn ensure_entity(
        &self,
        backend: &mut dyn StoreBackend,
        registry: &EntityInfoCollection,
        info: &EntityInfo,
        report: &mut SchemaReport,
    ) -> Result<()> {
        let engine = self.engine();
        let entity = info.entity_name();

        let table_created = if self.table_exists(backend, entity)? {
            report.push(entity, ConstraintState::Satisfied);
            false
        } else {
            let sql = ddl::create_table_sql(info, engine);
            tracing::debug!(entity, engine = engine.name(), sql = %sql, "creating table");
            backend.execute(&sql, &[])?;
            report.push(entity, ConstraintState::Created);
            true
        };

        // Primary key
        if let Some(pk_name) = info.pk_constraint_name() {
            let state = if table_created && !self.supports_add_constraint() {
                // emitted inline with the table
                ConstraintState::Created
            } else if !self.supports_add_constraint() {
                // pre-existing table on an engine without ADD CONSTRAINT;
                // the inline constraint travelled with the table
                ConstraintState::Satisfied
            } else if self.constraint_exists(backend, entity, pk_name)? {
                ConstraintState::Satisfied
            } else {
                let sql = ddl::add_pk_sql(info, engine)
                    .expect("entity with a pk constraint name has a pk field");
                tracing::debug!(entity, constraint = pk_name, "adding primary key constraint");
                backend.execute(&sql, &[])?;
                ConstraintState::Created
            };
            report.push(pk_name, state);
        }

        // Foreign keys; only verifiable once the referenced entity is known
        for fk in info.foreign_keys() {
            if !registry.contains_name(fk.foreign_entity) {
                tracing::debug!(
                    entity,
                    constraint = %fk.constraint_name,
                    target = fk.foreign_entity,
                    "deferring foreign key until the referenced entity is registered"
                );
                report.push(&fk.constraint_name, ConstraintState::Unverified);
                continue;
            }

            let state = if table_created && !self.supports_add_constraint() {
                ConstraintState::Created
            } else if !self.supports_add_constraint() {
                ConstraintState::Satisfied
            } else if self.constraint_exists(backend, entity, &fk.constraint_name)? {
                ConstraintState::Satisfied
            } else {
                let sql = ddl::add_fk_sql(entity, fk, engine);
                tracing::debug!(entity, constraint = %fk.constraint_name, "adding foreign key constraint");
                backend.execute(&sql, &[])?;
                ConstraintState::Created
            };
            report.push(&fk.constraint_name, state);
        }

        // Indexes
        for index in info.indexes() {
            let state = if self.index_exists(backend, entity, &index.name)? {
                ConstraintState::Satisfied
            } else {
                let sql = ddl::create_index_sql(entity, index, engine);
                tracing::debug!(entity, index = %index.name, "creating index");
                backend.execute(&sql, &[])?;
                ConstraintState::Created
            };
            report.push(&index.name, state);
        }

        Ok(())
    }
}

/// Create the checker for an engine.
pub fn checker_for(engine: Engine) -> Box<dyn SchemaChecker> {
    match engine {
        Engine::Sqlite => Box::new(crate::sqlite::SqliteChecker),
        Engine::SqlServerCe => Box::new(crate::sqlserverce::SqlServerCeChecker),
    }
}

/// Reconcile every registered entity, in registration order.
///
/// Idempotent: a second pass over an already-compatible store reports every
/// item `Satisfied` and issues no DDL.
pub fn ensure_compatibility(
    checker: &dyn SchemaChecker,
    backend: &mut dyn StoreBackend,
    registry: &EntityInfoCollection,
) -> Result<SchemaReport> {
    let mut report = SchemaReport::default();
    for info in registry.infos() {
        checker.ensure_entity(backend, registry, &info, &mut report)?;
    }
    tracing::debug!(
        entities = registry.len(),
        created = report.created_count(),
        "schema reconciliation pass complete"
    );
    Ok(report)
}
