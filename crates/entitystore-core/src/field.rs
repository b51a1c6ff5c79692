//! Field (column) definitions.

use crate::types::StoreType;

/// Sort direction used by indexes and ordering clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// SQL keyword for this direction.
    pub const fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// Key-generation scheme for a primary key field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScheme {
    /// The application assigns the key value itself
    Assigned,
    /// The store generates the key (auto-increment); skipped on insert
    Identity,
    /// A GUID is generated at insert time when the key is unset
    Guid,
}

/// Metadata about one scalar entity field.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    /// Store column name
    pub name: &'static str,
    /// Declared store data type
    pub store_type: StoreType,
    /// Whether NULL is allowed
    pub nullable: bool,
    /// Whether this field carries a unique constraint (indexed)
    pub unique: bool,
    /// Index membership: a searchable field gets an index in this direction
    pub search_order: Option<SortDirection>,
    /// Key scheme; `Some` marks this field as the primary key
    pub key_scheme: Option<KeyScheme>,
    /// Default value expression (SQL)
    pub default: Option<&'static str>,
    /// Store-maintained row version column; never written on insert/update
    pub row_version: bool,
}

impl FieldInfo {
    /// Create a new field with minimal required data.
    pub const fn new(name: &'static str, store_type: StoreType) -> Self {
        Self {
            name,
            store_type,
            nullable: false,
            unique: false,
            search_order: None,
            key_scheme: None,
            default: None,
            row_version: false,
        }
    }

    /// Set nullable flag.
    pub const fn nullable(mut self, value: bool) -> Self {
        self.nullable = value;
        self
    }

    /// Set unique flag.
    pub const fn unique(mut self, value: bool) -> Self {
        self.unique = value;
        self
    }

    /// Mark this field as searchable: it gets an index in the given direction.
    pub const fn searchable(mut self, direction: SortDirection) -> Self {
        self.search_order = Some(direction);
        self
    }

    /// Mark this field as the primary key with the given key scheme.
    pub const fn primary_key(mut self, scheme: KeyScheme) -> Self {
        self.key_scheme = Some(scheme);
        self
    }

    /// Set the default value expression.
    pub const fn default(mut self, expr: &'static str) -> Self {
        self.default = Some(expr);
        self
    }

    /// Mark this field as a store-maintained row version column.
    pub const fn row_version(mut self, value: bool) -> Self {
        self.row_version = value;
        self
    }

    /// Is this field the primary key?
    pub const fn is_primary_key(&self) -> bool {
        self.key_scheme.is_some()
    }

    /// Should insert statements skip this column?
    ///
    /// Identity keys and row version columns are store-generated.
    pub fn skip_on_insert(&self) -> bool {
        self.row_version || matches!(self.key_scheme, Some(KeyScheme::Identity))
    }
}
