//! Entity-scoped index metadata.

use crate::field::SortDirection;

/// A named, entity-scoped, ordered set of one or more fields.
///
/// Names are computed deterministically as
/// `ORM_IDX_<Entity>_<VariablePart>_<ASC|DESC>`, where the variable part is
/// the field name for derived single-field indexes or the declared name for
/// multi-field indexes. The scheme is injective for distinct
/// (entity, field-set, direction) tuples, so names are unique within a store.
#[derive(Debug, Clone)]
pub struct IndexInfo {
    /// Store index name
    pub name: String,
    /// Fields covered, in declaration order
    pub fields: Vec<&'static str>,
    /// Whether the index enforces uniqueness
    pub unique: bool,
    /// Sort direction applied to the index
    pub direction: SortDirection,
}

impl IndexInfo {
    /// Build index metadata, computing the store name eagerly.
    pub fn new(
        entity: &str,
        variable_part: &str,
        fields: Vec<&'static str>,
        unique: bool,
        direction: SortDirection,
    ) -> Self {
        Self {
            name: index_name(entity, variable_part, direction),
            fields,
            unique,
            direction,
        }
    }
}

/// Compute the deterministic store name for an index.
pub fn index_name(entity: &str, variable_part: &str, direction: SortDirection) -> String {
    format!("ORM_IDX_{}_{}_{}", entity, variable_part, direction.as_sql())
}
