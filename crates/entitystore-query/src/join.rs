//! JOIN clauses derived from declared foreign keys.

use entitystore_core::{Engine, EntityInfo, Error, MetadataErrorKind, Result};

/// Kind of join emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    /// SQL keyword for this join kind.
    pub const fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "JOIN",
            JoinKind::Left => "LEFT JOIN",
        }
    }
}

/// One JOIN clause with its ON predicate.
///
/// The predicate always reads `<entity already in the chain>.<field> =
/// <joined entity>.<field>`, with the field pair taken from the declared
/// foreign key between the two entity types.
#[derive(Debug, Clone)]
pub struct Join {
    pub kind: JoinKind,
    /// Store name of the newly joined entity
    pub entity: String,
    /// (entity, field) on the chain side of the ON predicate
    pub on_left: (String, String),
    /// (entity, field) on the joined side of the ON predicate
    pub on_right: (String, String),
}

impl Join {
    /// Derive the join predicate between the entities already in a query
    /// chain and a newly joined entity.
    ///
    /// The chain is searched in declaration order; the first declared foreign
    /// key in either direction wins. No declared key in either direction is a
    /// metadata error.
    pub fn resolve(kind: JoinKind, chain: &[&EntityInfo], joined: &EntityInfo) -> Result<Self> {
        for existing in chain {
            // Joined entity references the chain entity (Book -> Author)
            if let Some(fk) = joined.foreign_key_to(existing.entity_name()) {
                return Ok(Self {
                    kind,
                    entity: joined.entity_name().to_string(),
                    on_left: (existing.entity_name().to_string(), fk.foreign_field.to_string()),
                    on_right: (joined.entity_name().to_string(), fk.field.to_string()),
                });
            }
            // Chain entity references the joined entity
            if let Some(fk) = existing.foreign_key_to(joined.entity_name()) {
                return Ok(Self {
                    kind,
                    entity: joined.entity_name().to_string(),
                    on_left: (existing.entity_name().to_string(), fk.field.to_string()),
                    on_right: (joined.entity_name().to_string(), fk.foreign_field.to_string()),
                });
            }
        }

        Err(Error::metadata(
            MetadataErrorKind::NoRelationship,
            joined.entity_name(),
            format!(
                "no declared foreign key links '{}' to the queried entities",
                joined.entity_name()
            ),
        ))
    }

    /// Render ` JOIN [Book] ON [Author].Id = [Book].AuthorId`.
    pub fn build(&self, engine: Engine) -> String {
        format!(
            " {} {} ON {}.{} = {}.{}",
            self.kind.as_sql(),
            engine.quote(&self.entity),
            engine.quote(&self.on_left.0),
            self.on_left.1,
            engine.quote(&self.on_right.0),
            self.on_right.1,
        )
    }
}
