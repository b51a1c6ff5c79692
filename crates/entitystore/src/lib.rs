//! entitystore: an object mapper for embedded relational stores.
//!
//! entitystore maps plain Rust structs to rows in SQLite or SQL Server
//! Compact stores, generating the SQL, reconciling declared schema
//! (primary keys, foreign keys, indexes) against the physical store, and
//! materializing result rows through a per-session identity map.
//!
//! # Quick start
//!
//! ```ignore
//! use entitystore::prelude::*;
//!
//! struct Author {
//!     id: i32,
//!     name: String,
//! }
//!
//! impl Entity for Author {
//!     fn declare() -> EntityInfoBuilder {
//!         EntityInfo::builder("Author")
//!             .field(FieldInfo::new("Id", StoreType::Integer).primary_key(KeyScheme::Identity))
//!             .field(FieldInfo::new("Name", StoreType::NVarChar(200)))
//!     }
//!     // default_instance / field_value / set_field elided
//! }
//!
//! fn run(backend: impl StoreBackend) -> Result<()> {
//!     let mut store = SqlStore::new(backend);
//!     store.add_type::<Author>()?;
//!     store.ensure_compatibility()?;
//!
//!     let mut author = Author { id: 0, name: "Dumas".into() };
//!     store.insert(&mut author)?;
//!
//!     let query = store.select::<Author>()?.filter(Filter::eq("Name", "Dumas"));
//!     let authors = store.fetch(&query)?;
//!     Ok(())
//! }
//! ```

pub use entitystore_core::{
    Check, CheckFailure, CheckKind, ColumnInfo, Engine, Entity, EntityInfo, EntityInfoBuilder,
    EntityInfoCollection, Error, FieldInfo, ForeignKeyInfo, IndexInfo, KeyScheme, MetadataError,
    MetadataErrorKind, PopulationError, ReferenceInfo, ReferenceKind, Result, Row, SchemaError,
    SortDirection, StoreBackend, StoreError, StoreType, TypeError, ValidationError, Value,
    index_name, matches_pattern, uses_guid_scheme,
};

pub use entitystore_query::{
    ColumnRef, CompareOp, DeleteBuilder, Filter, InsertBuilder, Join, JoinKind, OrderBy,
    SelectQuery, Statement, Top, UpdateBuilder, UpdateSet,
};

pub use entitystore_schema::{
    ConstraintState, SchemaChecker, SchemaItem, SchemaReport, SqlServerCeChecker, SqliteChecker,
    add_fk_sql, add_pk_sql, checker_for, create_index_sql, create_table_sql, ensure_compatibility,
};

pub use entitystore_session::{
    CacheMode, EntityCache, EntityRef, EntitySerializer, NoCache, SqlStore,
};

/// The commonly used surface in one import.
pub mod prelude {
    pub use entitystore_core::{
        Engine, Entity, EntityInfo, EntityInfoBuilder, Error, FieldInfo, KeyScheme, Result, Row,
        SortDirection, StoreBackend, StoreType, Value,
    };
    pub use entitystore_query::{Filter, OrderBy, SelectQuery};
    pub use entitystore_session::{EntityRef, SqlStore};
}
