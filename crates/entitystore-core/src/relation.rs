//! Foreign keys and logical references between entities.

/// Kind of a declared navigation between two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// The local entity owns many rows of the foreign entity
    OneToMany,
    /// The local entity points at one row of the foreign entity
    ManyToOne,
    /// Not supported by the mapper; rejected at registration
    ManyToMany,
}

/// A foreign key declaration: a local column constrained to reference a
/// foreign entity's column.
///
/// The constraint name is computed eagerly at registration time
/// (`ORM_FK_<LocalEntity>_<ForeignEntity>`), since metadata is immutable
/// afterward.
#[derive(Debug, Clone)]
pub struct ForeignKeyInfo {
    /// Local column name
    pub field: &'static str,
    /// Referenced entity store name
    pub foreign_entity: &'static str,
    /// Referenced column name
    pub foreign_field: &'static str,
    /// Store constraint name
    pub constraint_name: String,
}

impl ForeignKeyInfo {
    /// Compute the deterministic constraint name for a foreign key.
    pub fn constraint_name_for(local_entity: &str, foreign_entity: &str) -> String {
        format!("ORM_FK_{}_{}", local_entity, foreign_entity)
    }
}

/// A logical navigation linking a local field to a foreign entity's field.
///
/// Not itself a column; used to resolve related-object graphs.
#[derive(Debug, Clone)]
pub struct ReferenceInfo {
    /// Local field carrying the key value
    pub local_field: &'static str,
    /// Foreign entity store name
    pub foreign_entity: &'static str,
    /// Foreign field the key value matches
    pub foreign_field: &'static str,
    /// Navigation kind
    pub kind: ReferenceKind,
}
