//! DDL text generation from entity metadata.
//!
//! The emitted forms are part of the external contract and must match
//! existing stores exactly:
//!
//! - `CREATE [UNIQUE ]INDEX <name> ON [<entity>] (<field>[, <field>]* <ASC|DESC>)`
//! - `ALTER TABLE [<entity>] ADD CONSTRAINT <name> PRIMARY KEY (<field>)`
//! - `ALTER TABLE [<entity>] ADD CONSTRAINT <name> FOREIGN KEY (<field>)
//!   REFERENCES [<foreignEntity>](<foreignField>)`

use entitystore_core::{
    Engine, EntityInfo, FieldInfo, ForeignKeyInfo, IndexInfo, KeyScheme,
};

/// Render the CREATE TABLE statement for an entity.
///
/// SQLite cannot add constraints to an existing table, so its tables carry
/// the named key constraints inline. SQL Server CE tables are created bare;
/// the checker adds the constraints with ALTER statements afterwards.
pub fn create_table_sql(info: &EntityInfo, engine: Engine) -> String {
    let mut defs: Vec<String> = info
        .fields()
        .iter()
        .map(|field| column_def(field, info, engine))
        .collect();

    if engine == Engine::Sqlite {
        for fk in info.foreign_keys() {
            defs.push(format!(
                "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({})",
                fk.constraint_name,
                fk.field,
                engine.quote(fk.foreign_entity),
                fk.foreign_field
            ));
        }
    }

    format!(
        "CREATE TABLE {} ({})",
        engine.quote(info.entity_name()),
        defs.join(", ")
    )
}

fn column_def(field: &FieldInfo, info: &EntityInfo, engine: Engine) -> String {
    let mut parts = vec![
        field.name.to_string(),
        field.store_type.sql_name(engine),
    ];

    match engine {
        Engine::Sqlite => {
            if field.is_primary_key() {
                if let Some(pk_name) = info.pk_constraint_name() {
                    parts.push(format!("CONSTRAINT {} PRIMARY KEY", pk_name));
                }
                if field.key_scheme == Some(KeyScheme::Identity) {
                    parts.push("AUTOINCREMENT".to_string());
                }
            }
        }
        Engine::SqlServerCe => {
            if field.key_scheme == Some(KeyScheme::Identity) {
                parts.push("IDENTITY(1,1)".to_string());
            }
        }
    }

    if !field.nullable && !field.is_primary_key() {
        parts.push("NOT NULL".to_string());
    }

    if let Some(default) = field.default {
        parts.push(format!("DEFAULT {}", default));
    }

    parts.join(" ")
}

/// Render the ALTER statement adding the primary key constraint.
///
/// Returns `None` for entities without a primary key.
pub fn add_pk_sql(info: &EntityInfo, engine: Engine) -> Option<String> {
    let pk = info.primary_key()?;
    let name = info.pk_constraint_name()?;
    Some(format!(
        "ALTER TABLE {} ADD CONSTRAINT {} PRIMARY KEY ({})",
        engine.quote(info.entity_name()),
        name,
        pk.name
    ))
}

/// Render the ALTER statement adding one foreign key constraint.
pub fn add_fk_sql(entity_name: &str, fk: &ForeignKeyInfo, engine: Engine) -> String {
    format!(
        "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({})",
        engine.quote(entity_name),
        fk.constraint_name,
        fk.field,
        engine.quote(fk.foreign_entity),
        fk.foreign_field
    )
}

/// Render the CREATE INDEX statement for one index.
pub fn create_index_sql(entity_name: &str, index: &IndexInfo, engine: Engine) -> String {
    let unique = if index.unique { "UNIQUE " } else { "" };
    format!(
        "CREATE {}INDEX {} ON {} ({} {})",
        unique,
        index.name,
        engine.quote(entity_name),
        index.fields.join(", "),
        index.direction.as_sql()
    )
}
