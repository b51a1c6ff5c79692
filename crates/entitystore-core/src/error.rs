//! Error types for entitystore operations.

use std::fmt;

/// The primary error type for all entitystore operations.
#[derive(Debug)]
pub enum Error {
    /// Metadata declaration errors, raised at registration time
    Metadata(MetadataError),
    /// Row-to-entity population errors (fatal, non-retryable)
    Population(PopulationError),
    /// Type conversion errors
    Type(TypeError),
    /// Accumulated precondition violations
    Validation(ValidationError),
    /// Schema reconciliation errors
    Schema(SchemaError),
    /// Statement execution errors surfaced from the underlying engine
    Store(StoreError),
    /// Custom error with message
    Custom(String),
}

#[derive(Debug)]
pub struct MetadataError {
    pub kind: MetadataErrorKind,
    pub entity: String,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataErrorKind {
    /// More than one primary key declared on a single entity
    DuplicatePrimaryKey,
    /// Two fields resolve to the same store name (case-insensitive)
    DuplicateFieldName,
    /// Two entity types resolve to the same store name
    DuplicateEntityName,
    /// Relationship kind the mapper does not support (e.g. many-to-many)
    UnsupportedRelationship,
    /// Entity type or name not present in the collection
    UnknownEntity,
    /// Declaration names a field the entity does not carry
    UnknownField,
    /// Operation requires a primary key the entity does not declare
    MissingPrimaryKey,
    /// No declared foreign key links two joined entity types
    NoRelationship,
}

impl MetadataErrorKind {
    /// Short human-readable label for this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            MetadataErrorKind::DuplicatePrimaryKey => "duplicate primary key",
            MetadataErrorKind::DuplicateFieldName => "duplicate field name",
            MetadataErrorKind::DuplicateEntityName => "duplicate entity name",
            MetadataErrorKind::UnsupportedRelationship => "unsupported relationship",
            MetadataErrorKind::UnknownEntity => "unknown entity",
            MetadataErrorKind::UnknownField => "unknown field",
            MetadataErrorKind::MissingPrimaryKey => "missing primary key",
            MetadataErrorKind::NoRelationship => "no relationship",
        }
    }
}

/// A row value could not be written into an entity field.
///
/// Carries enough context (entity, field, raw value) to diagnose a
/// metadata/schema mismatch without re-running with tracing.
#[derive(Debug)]
pub struct PopulationError {
    pub entity: String,
    pub field: String,
    pub value: String,
    pub message: String,
}

#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

#[derive(Debug)]
pub struct SchemaError {
    pub table: String,
    pub constraint: Option<String>,
    pub message: String,
}

#[derive(Debug)]
pub struct StoreError {
    pub message: String,
    pub sql: Option<String>,
}

/// A batch of precondition failures reported as one aggregate fault.
///
/// Checks accumulate instead of failing fast so callers can report every
/// violation in one pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationError {
    pub failures: Vec<CheckFailure>,
}

/// A single precondition failure.
#[derive(Debug, Clone)]
pub struct CheckFailure {
    /// What was being checked (argument or field name)
    pub subject: String,
    pub kind: CheckKind,
    pub message: String,
}

/// The kind of precondition that was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    /// Value was null where a value is required
    Null,
    /// String or collection was empty
    Empty,
    /// Numeric value outside the allowed range
    Range,
    /// Value did not equal the expected value
    Equality,
    /// String did not match the required pattern
    Pattern,
}

impl ValidationError {
    pub fn new() -> Self {
        Self {
            failures: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Record a failure.
    pub fn add(&mut self, subject: impl Into<String>, kind: CheckKind, message: impl Into<String>) {
        self.failures.push(CheckFailure {
            subject: subject.into(),
            kind,
            message: message.into(),
        });
    }

    /// Convert to Result: `Ok(())` if no failures, `Err(self)` otherwise.
    pub fn into_result(self) -> std::result::Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl Error {
    /// Build a metadata error.
    pub fn metadata(
        kind: MetadataErrorKind,
        entity: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Error::Metadata(MetadataError {
            kind,
            entity: entity.into(),
            detail: detail.into(),
        })
    }

    /// Build a population error with full row context.
    pub fn population(
        entity: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Population(PopulationError {
            entity: entity.into(),
            field: field.into(),
            value: value.into(),
            message: message.into(),
        })
    }

    /// Build a store error carrying the offending SQL.
    pub fn store(message: impl Into<String>, sql: Option<String>) -> Self {
        Error::Store(StoreError {
            message: message.into(),
            sql,
        })
    }

    /// Is this a metadata error of the given kind?
    pub fn is_metadata(&self, kind: MetadataErrorKind) -> bool {
        matches!(self, Error::Metadata(m) if m.kind == kind)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Metadata(e) => write!(
                f,
                "Metadata error on entity '{}': {}: {}",
                e.entity,
                e.kind.as_str(),
                e.detail
            ),
            Error::Population(e) => write!(
                f,
                "Failed to populate field '{}' of entity '{}' from value '{}': {}",
                e.field, e.entity, e.value, e.message
            ),
            Error::Type(e) => {
                if let Some(col) = &e.column {
                    write!(
                        f,
                        "Type error in column '{}': expected {}, found {}",
                        col, e.expected, e.actual
                    )
                } else {
                    write!(f, "Type error: expected {}, found {}", e.expected, e.actual)
                }
            }
            Error::Validation(e) => write!(f, "Validation error: {}", e),
            Error::Schema(e) => {
                if let Some(constraint) = &e.constraint {
                    write!(
                        f,
                        "Schema error on table '{}' (constraint '{}'): {}",
                        e.table, constraint, e.message
                    )
                } else {
                    write!(f, "Schema error on table '{}': {}", e.table, e.message)
                }
            }
            Error::Store(e) => {
                if let Some(sql) = &e.sql {
                    write!(f, "Store error: {} (statement: {})", e.message, sql)
                } else {
                    write!(f, "Store error: {}", e.message)
                }
            }
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            write!(f, "all checks passed")
        } else if self.failures.len() == 1 {
            let failure = &self.failures[0];
            write!(f, "check failed on '{}': {}", failure.subject, failure.message)
        } else {
            writeln!(f, "{} checks failed:", self.failures.len())?;
            for failure in &self.failures {
                writeln!(f, "  - {}: {}", failure.subject, failure.message)?;
            }
            Ok(())
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::Validation(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl From<MetadataError> for Error {
    fn from(err: MetadataError) -> Self {
        Error::Metadata(err)
    }
}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        Error::Schema(err)
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Error::Store(err)
    }
}

/// Result type alias for entitystore operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_error_display_names_entity_and_kind() {
        let err = Error::metadata(
            MetadataErrorKind::DuplicatePrimaryKey,
            "Book",
            "fields 'Id' and 'Isbn' both declare a key",
        );
        let msg = err.to_string();
        assert!(msg.contains("Book"));
        assert!(msg.contains("duplicate primary key"));
        assert!(err.is_metadata(MetadataErrorKind::DuplicatePrimaryKey));
        assert!(!err.is_metadata(MetadataErrorKind::DuplicateFieldName));
    }

    #[test]
    fn population_error_display_carries_row_context() {
        let err = Error::population("Book", "Pages", "'abc'", "expected INTEGER, found TEXT");
        let msg = err.to_string();
        assert!(msg.contains("Book"));
        assert!(msg.contains("Pages"));
        assert!(msg.contains("'abc'"));
    }

    #[test]
    fn validation_error_aggregates() {
        let mut err = ValidationError::new();
        assert!(err.clone().into_result().is_ok());

        err.add("bundleSize", CheckKind::Range, "must be positive");
        err.add("keys", CheckKind::Empty, "must not be empty");

        let aggregate = err.into_result().unwrap_err();
        assert_eq!(aggregate.failures.len(), 2);
        let msg = aggregate.to_string();
        assert!(msg.contains("bundleSize"));
        assert!(msg.contains("keys"));
    }
}
