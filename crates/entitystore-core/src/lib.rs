//! Core types and traits for entitystore.
//!
//! This crate provides the foundational abstractions the mapper is built on:
//!
//! - `Entity` trait and the explicit metadata declaration API
//! - `EntityInfo`/`FieldInfo` metadata model with keys, references, indexes
//! - `EntityInfoCollection` registry keyed by type and store name
//! - `Value`/`Row` dynamic values and result rows
//! - `StoreBackend`/`Engine` collaborator traits for the physical store
//! - `Check` precondition helper with batched failure reporting

pub mod backend;
pub mod check;
pub mod entity;
pub mod error;
pub mod field;
pub mod index;
pub mod registry;
pub mod relation;
pub mod row;
pub mod types;
pub mod value;

pub use backend::{Engine, StoreBackend};
pub use check::{Check, matches_pattern};
pub use entity::{Entity, EntityInfo, EntityInfoBuilder, uses_guid_scheme};
pub use error::{
    CheckFailure, CheckKind, Error, MetadataError, MetadataErrorKind, PopulationError, Result,
    SchemaError, StoreError, TypeError, ValidationError,
};
pub use field::{FieldInfo, KeyScheme, SortDirection};
pub use index::{IndexInfo, index_name};
pub use registry::EntityInfoCollection;
pub use relation::{ForeignKeyInfo, ReferenceInfo, ReferenceKind};
pub use row::{ColumnInfo, Row};
pub use types::StoreType;
pub use value::Value;
