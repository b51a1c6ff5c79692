//! Entity trait and per-type metadata.
//!
//! Types are mapped through an explicit declaration: `Entity::declare()`
//! produces an [`EntityInfoBuilder`] which validates the declaration at
//! registration time and yields an immutable [`EntityInfo`]. The mapper
//! never reflects over struct layout; fields are reached through the
//! untyped `field_value`/`set_field` pair the serializer and statement
//! builders use.

use crate::error::{Error, MetadataErrorKind, Result};
use crate::field::{FieldInfo, KeyScheme, SortDirection};
use crate::index::IndexInfo;
use crate::relation::{ForeignKeyInfo, ReferenceInfo, ReferenceKind};
use crate::value::Value;

/// Trait for types mapped to one store table.
pub trait Entity: Send + Sync + 'static {
    /// Declare the entity's shape: fields, keys, references, indexes.
    ///
    /// Called once when the type is registered with a store; the resulting
    /// metadata is validated and immutable afterward.
    fn declare() -> EntityInfoBuilder;

    /// Zero-argument constructor used by the serializer to materialize rows.
    fn default_instance() -> Self
    where
        Self: Sized;

    /// Read one declared field's current value.
    fn field_value(&self, field: &str) -> Value;

    /// Write one declared field.
    ///
    /// Returns an error when the value cannot be assigned to the field; the
    /// serializer wraps that error with entity/field/value context.
    fn set_field(&mut self, field: &str, value: Value) -> Result<()>;
}

/// Immutable metadata for one mapped entity type.
#[derive(Debug, Clone)]
pub struct EntityInfo {
    entity_name: String,
    fields: Vec<FieldInfo>,
    primary_key: Option<usize>,
    pk_constraint_name: Option<String>,
    foreign_keys: Vec<ForeignKeyInfo>,
    references: Vec<ReferenceInfo>,
    indexes: Vec<IndexInfo>,
}

impl EntityInfo {
    /// Start a declaration with an explicit store name.
    pub fn builder(entity_name: &'static str) -> EntityInfoBuilder {
        EntityInfoBuilder::new(entity_name)
    }

    /// Start a declaration named after the Rust type.
    pub fn builder_for<E: Entity>() -> EntityInfoBuilder {
        let type_name = std::any::type_name::<E>();
        let short = type_name.rsplit("::").next().unwrap_or(type_name);
        EntityInfoBuilder::new(short)
    }

    /// The store name of this entity.
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// All declared fields, in declaration order.
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    /// Look up a field by store name (case-insensitive).
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// The primary key field, if one is declared.
    pub fn primary_key(&self) -> Option<&FieldInfo> {
        self.primary_key.map(|i| &self.fields[i])
    }

    /// The primary key constraint name (`ORM_PK_<Entity>`), if any.
    pub fn pk_constraint_name(&self) -> Option<&str> {
        self.pk_constraint_name.as_deref()
    }

    /// Declared foreign keys.
    pub fn foreign_keys(&self) -> &[ForeignKeyInfo] {
        &self.foreign_keys
    }

    /// The foreign key referencing the given entity, if declared.
    pub fn foreign_key_to(&self, entity: &str) -> Option<&ForeignKeyInfo> {
        self.foreign_keys
            .iter()
            .find(|fk| fk.foreign_entity.eq_ignore_ascii_case(entity))
    }

    /// Declared logical references.
    pub fn references(&self) -> &[ReferenceInfo] {
        &self.references
    }

    /// The reference targeting the given entity, or `None`.
    ///
    /// Absence is not an error; callers use this for navigation resolution.
    pub fn reference_to(&self, entity: &str) -> Option<&ReferenceInfo> {
        self.references
            .iter()
            .find(|r| r.foreign_entity.eq_ignore_ascii_case(entity))
    }

    /// Declared and derived indexes.
    pub fn indexes(&self) -> &[IndexInfo] {
        &self.indexes
    }
}

/// Declaration under construction; validated by [`EntityInfoBuilder::build`].
#[derive(Debug)]
pub struct EntityInfoBuilder {
    entity_name: &'static str,
    fields: Vec<FieldInfo>,
    foreign_keys: Vec<(&'static str, &'static str, &'static str)>,
    references: Vec<ReferenceInfo>,
    custom_indexes: Vec<CustomIndex>,
}

#[derive(Debug)]
struct CustomIndex {
    name: &'static str,
    fields: Vec<&'static str>,
    unique: bool,
    direction: SortDirection,
}

impl EntityInfoBuilder {
    fn new(entity_name: &'static str) -> Self {
        Self {
            entity_name,
            fields: Vec::new(),
            foreign_keys: Vec::new(),
            references: Vec::new(),
            custom_indexes: Vec::new(),
        }
    }

    /// Declare a scalar field.
    pub fn field(mut self, field: FieldInfo) -> Self {
        self.fields.push(field);
        self
    }

    /// Declare a foreign key: the column plus its constraint.
    pub fn foreign_key(
        mut self,
        field: FieldInfo,
        foreign_entity: &'static str,
        foreign_field: &'static str,
    ) -> Self {
        self.foreign_keys
            .push((field.name, foreign_entity, foreign_field));
        self.fields.push(field);
        self
    }

    /// Declare a logical navigation.
    pub fn reference(
        mut self,
        kind: ReferenceKind,
        local_field: &'static str,
        foreign_entity: &'static str,
        foreign_field: &'static str,
    ) -> Self {
        self.references.push(ReferenceInfo {
            local_field,
            foreign_entity,
            foreign_field,
            kind,
        });
        self
    }

    /// Declare an explicit (usually multi-field) index.
    pub fn index(
        mut self,
        name: &'static str,
        fields: &[&'static str],
        unique: bool,
        direction: SortDirection,
    ) -> Self {
        self.custom_indexes.push(CustomIndex {
            name,
            fields: fields.to_vec(),
            unique,
            direction,
        });
        self
    }

    /// Validate the declaration and produce immutable metadata.
    ///
    /// Fails without partial effect on: more than one primary key, two
    /// fields sharing a store name (case-insensitive), a many-to-many
    /// reference, or an index naming an unknown field.
    pub fn build(self) -> Result<EntityInfo> {
        let entity = self.entity_name;

        // Duplicate store names, case-insensitive
        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i]
                .iter()
                .any(|other| other.name.eq_ignore_ascii_case(field.name))
            {
                return Err(Error::metadata(
                    MetadataErrorKind::DuplicateFieldName,
                    entity,
                    format!("field '{}' is declared more than once", field.name),
                ));
            }
        }

        // Exactly 0 or 1 primary key
        let mut primary_key = None;
        for (i, field) in self.fields.iter().enumerate() {
            if field.is_primary_key() {
                if let Some(first) = primary_key {
                    let first: &FieldInfo = &self.fields[first];
                    return Err(Error::metadata(
                        MetadataErrorKind::DuplicatePrimaryKey,
                        entity,
                        format!(
                            "fields '{}' and '{}' both declare a primary key",
                            first.name, field.name
                        ),
                    ));
                }
                primary_key = Some(i);
            }
        }

        // Relationship kinds the mapper can express
        if let Some(reference) = self
            .references
            .iter()
            .find(|r| r.kind == ReferenceKind::ManyToMany)
        {
            return Err(Error::metadata(
                MetadataErrorKind::UnsupportedRelationship,
                entity,
                format!(
                    "many-to-many reference to '{}' cannot be mapped",
                    reference.foreign_entity
                ),
            ));
        }

        // Custom indexes must name declared fields
        for index in &self.custom_indexes {
            for field in &index.fields {
                if !self
                    .fields
                    .iter()
                    .any(|f| f.name.eq_ignore_ascii_case(field))
                {
                    return Err(Error::metadata(
                        MetadataErrorKind::UnknownField,
                        entity,
                        format!("index '{}' names unknown field '{}'", index.name, field),
                    ));
                }
            }
        }

        // Constraint names are computed here, eagerly; metadata is immutable
        // after registration.
        let pk_constraint_name = primary_key.map(|_| format!("ORM_PK_{}", entity));

        let foreign_keys = self
            .foreign_keys
            .into_iter()
            .map(|(field, foreign_entity, foreign_field)| ForeignKeyInfo {
                field,
                foreign_entity,
                foreign_field,
                constraint_name: ForeignKeyInfo::constraint_name_for(entity, foreign_entity),
            })
            .collect();

        // Derived single-field indexes from unique/searchable flags, then the
        // explicit declarations. Primary keys are covered by their own
        // constraint and derive no index.
        let mut indexes: Vec<IndexInfo> = Vec::new();
        for field in &self.fields {
            if field.is_primary_key() {
                continue;
            }
            if field.unique || field.search_order.is_some() {
                let direction = field.search_order.unwrap_or_default();
                indexes.push(IndexInfo::new(
                    entity,
                    field.name,
                    vec![field.name],
                    field.unique,
                    direction,
                ));
            }
        }
        for index in self.custom_indexes {
            indexes.push(IndexInfo::new(
                entity,
                index.name,
                index.fields,
                index.unique,
                index.direction,
            ));
        }

        Ok(EntityInfo {
            entity_name: entity.to_string(),
            fields: self.fields,
            primary_key,
            pk_constraint_name,
            foreign_keys,
            references: self.references,
            indexes,
        })
    }
}

/// Convenience: does this field's scheme generate GUID keys?
pub fn uses_guid_scheme(field: &FieldInfo) -> bool {
    matches!(field.key_scheme, Some(KeyScheme::Guid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StoreType;

    fn author_builder() -> EntityInfoBuilder {
        EntityInfo::builder("Author")
            .field(FieldInfo::new("Id", StoreType::Integer).primary_key(KeyScheme::Identity))
            .field(FieldInfo::new("Name", StoreType::NVarChar(200)))
            .reference(ReferenceKind::OneToMany, "Id", "Book", "AuthorId")
    }

    #[test]
    fn build_computes_constraint_names_eagerly() {
        let info = author_builder().build().unwrap();
        assert_eq!(info.entity_name(), "Author");
        assert_eq!(info.pk_constraint_name(), Some("ORM_PK_Author"));
        assert_eq!(info.primary_key().unwrap().name, "Id");
    }

    #[test]
    fn duplicate_primary_key_is_rejected() {
        let err = EntityInfo::builder("Broken")
            .field(FieldInfo::new("A", StoreType::Integer).primary_key(KeyScheme::Assigned))
            .field(FieldInfo::new("B", StoreType::Integer).primary_key(KeyScheme::Assigned))
            .build()
            .unwrap_err();
        assert!(err.is_metadata(MetadataErrorKind::DuplicatePrimaryKey));
    }

    #[test]
    fn duplicate_field_name_is_rejected_case_insensitively() {
        let err = EntityInfo::builder("Broken")
            .field(FieldInfo::new("Name", StoreType::NText))
            .field(FieldInfo::new("NAME", StoreType::NText))
            .build()
            .unwrap_err();
        assert!(err.is_metadata(MetadataErrorKind::DuplicateFieldName));
    }

    #[test]
    fn many_to_many_reference_is_rejected() {
        let err = EntityInfo::builder("Broken")
            .field(FieldInfo::new("Id", StoreType::Integer).primary_key(KeyScheme::Identity))
            .reference(ReferenceKind::ManyToMany, "Id", "Tag", "Id")
            .build()
            .unwrap_err();
        assert!(err.is_metadata(MetadataErrorKind::UnsupportedRelationship));
    }

    #[test]
    fn foreign_key_declares_both_column_and_constraint() {
        let info = EntityInfo::builder("Book")
            .field(FieldInfo::new("Id", StoreType::Integer).primary_key(KeyScheme::Identity))
            .foreign_key(FieldInfo::new("AuthorId", StoreType::Integer), "Author", "Id")
            .build()
            .unwrap();

        assert!(info.field("AuthorId").is_some());
        let fk = info.foreign_key_to("Author").unwrap();
        assert_eq!(fk.constraint_name, "ORM_FK_Book_Author");
        assert_eq!(fk.field, "AuthorId");
        assert_eq!(fk.foreign_field, "Id");
    }

    #[test]
    fn reference_lookup_returns_none_when_absent() {
        let info = author_builder().build().unwrap();
        assert!(info.reference_to("Book").is_some());
        assert!(info.reference_to("Publisher").is_none());
    }

    #[test]
    fn derived_and_custom_index_names() {
        let info = EntityInfo::builder("IndexedClass")
            .field(FieldInfo::new("Id", StoreType::Integer).primary_key(KeyScheme::Identity))
            .field(FieldInfo::new("Unique", StoreType::NVarChar(50)).unique(true))
            .field(FieldInfo::new("Searchable", StoreType::Integer).searchable(SortDirection::Descending))
            .field(FieldInfo::new("One", StoreType::Integer))
            .field(FieldInfo::new("Two", StoreType::Integer))
            .field(FieldInfo::new("Three", StoreType::Integer))
            .field(FieldInfo::new("Four", StoreType::Integer))
            .index(
                "MonIndex",
                &["One", "Two", "Three", "Four"],
                false,
                SortDirection::Ascending,
            )
            .build()
            .unwrap();

        let names: Vec<&str> = info.indexes().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "ORM_IDX_IndexedClass_Unique_ASC",
                "ORM_IDX_IndexedClass_Searchable_DESC",
                "ORM_IDX_IndexedClass_MonIndex_ASC",
            ]
        );
        assert!(info.indexes()[0].unique);
    }

    #[test]
    fn index_over_unknown_field_is_rejected() {
        let err = EntityInfo::builder("Broken")
            .field(FieldInfo::new("Id", StoreType::Integer).primary_key(KeyScheme::Identity))
            .index("Bad", &["Missing"], false, SortDirection::Ascending)
            .build()
            .unwrap_err();
        assert!(err.is_metadata(MetadataErrorKind::UnknownField));
    }
}
