//! Store data types and the per-field conversion rules.

use uuid::Uuid;

use crate::backend::Engine;
use crate::error::{Error, Result, TypeError};
use crate::value::Value;

/// Declared store data types for entity fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreType {
    /// Boolean column
    Bit,
    /// 32-bit integer column
    Integer,
    /// 64-bit integer column
    BigInt,
    /// Double-precision floating point column
    Real,
    /// Fixed precision numeric column
    Numeric { precision: u8, scale: u8 },
    /// Variable-length unicode string with a maximum length
    NVarChar(u32),
    /// Unbounded unicode text
    NText,
    /// Variable-length binary with a maximum length
    Binary(u32),
    /// Timestamp column
    DateTime,
    /// Globally unique identifier column
    Guid,
    /// Store-maintained row version column
    RowVersion,
}

impl StoreType {
    /// The engine-specific column type name used in DDL.
    pub fn sql_name(&self, engine: Engine) -> String {
        match engine {
            Engine::Sqlite => match self {
                // SQLite collapses to its affinity classes
                StoreType::Bit
                | StoreType::Integer
                | StoreType::BigInt
                | StoreType::DateTime
                | StoreType::RowVersion => "integer".to_string(),
                StoreType::Real | StoreType::Numeric { .. } => "real".to_string(),
                StoreType::NVarChar(_) | StoreType::NText | StoreType::Guid => "text".to_string(),
                StoreType::Binary(_) => "blob".to_string(),
            },
            Engine::SqlServerCe => match self {
                StoreType::Bit => "bit".to_string(),
                StoreType::Integer => "int".to_string(),
                StoreType::BigInt => "bigint".to_string(),
                StoreType::Real => "float".to_string(),
                StoreType::Numeric { precision, scale } => {
                    format!("numeric({}, {})", precision, scale)
                }
                StoreType::NVarChar(len) => format!("nvarchar({})", len),
                StoreType::NText => "ntext".to_string(),
                StoreType::Binary(len) => format!("varbinary({})", len),
                StoreType::DateTime => "datetime".to_string(),
                StoreType::Guid => "uniqueidentifier".to_string(),
                StoreType::RowVersion => "rowversion".to_string(),
            },
        }
    }

    /// Check if this type is numeric.
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            StoreType::Integer
                | StoreType::BigInt
                | StoreType::Real
                | StoreType::Numeric { .. }
        )
    }

    /// Check if this type is text-based.
    pub const fn is_text(&self) -> bool {
        matches!(self, StoreType::NVarChar(_) | StoreType::NText)
    }

    /// Convert a raw column value to this field's declared semantic type.
    ///
    /// This is the type-conversion rule the serializer applies to every
    /// column it reads; `Value::Null` passes through unchanged.
    pub fn coerce(&self, raw: &Value) -> Result<Value> {
        if raw.is_null() {
            return Ok(Value::Null);
        }

        match self {
            StoreType::Bit => match raw {
                Value::Bool(v) => Ok(Value::Bool(*v)),
                Value::Int(v) => Ok(Value::Bool(*v != 0)),
                Value::BigInt(v) => Ok(Value::Bool(*v != 0)),
                other => Err(self.mismatch("BIT", other)),
            },
            StoreType::Integer => match raw {
                Value::Int(v) => Ok(Value::Int(*v)),
                Value::Bool(v) => Ok(Value::Int(i32::from(*v))),
                Value::BigInt(v) => i32::try_from(*v).map(Value::Int).map_err(|_| {
                    Error::Type(TypeError {
                        expected: "INTEGER",
                        actual: format!("BIGINT value {} out of range", v),
                        column: None,
                    })
                }),
                other => Err(self.mismatch("INTEGER", other)),
            },
            StoreType::BigInt => match raw {
                Value::BigInt(v) => Ok(Value::BigInt(*v)),
                Value::Int(v) => Ok(Value::BigInt(i64::from(*v))),
                other => Err(self.mismatch("BIGINT", other)),
            },
            StoreType::Real | StoreType::Numeric { .. } => match raw {
                Value::Double(v) => Ok(Value::Double(*v)),
                Value::Int(v) => Ok(Value::Double(f64::from(*v))),
                Value::BigInt(v) => Ok(Value::Double(*v as f64)),
                other => Err(self.mismatch("FLOAT", other)),
            },
            StoreType::NVarChar(_) | StoreType::NText => match raw {
                Value::Text(s) => Ok(Value::Text(s.clone())),
                other => Err(self.mismatch("TEXT", other)),
            },
            StoreType::Binary(_) => match raw {
                Value::Bytes(b) => Ok(Value::Bytes(b.clone())),
                other => Err(self.mismatch("BINARY", other)),
            },
            StoreType::DateTime => match raw {
                Value::DateTime(v) => Ok(Value::DateTime(*v)),
                Value::BigInt(v) => Ok(Value::DateTime(*v)),
                Value::Int(v) => Ok(Value::DateTime(i64::from(*v))),
                other => Err(self.mismatch("DATETIME", other)),
            },
            StoreType::Guid => match raw {
                Value::Guid(bytes) => Ok(Value::Guid(*bytes)),
                Value::Text(s) => Uuid::parse_str(s)
                    .map(|id| Value::Guid(*id.as_bytes()))
                    .map_err(|e| {
                        Error::Type(TypeError {
                            expected: "GUID",
                            actual: format!("unparseable text '{}': {}", s, e),
                            column: None,
                        })
                    }),
                Value::Bytes(b) if b.len() == 16 => {
                    let mut arr = [0u8; 16];
                    arr.copy_from_slice(b);
                    Ok(Value::Guid(arr))
                }
                other => Err(self.mismatch("GUID", other)),
            },
            StoreType::RowVersion => match raw {
                Value::Bytes(b) => Ok(Value::Bytes(b.clone())),
                Value::BigInt(v) => Ok(Value::BigInt(*v)),
                Value::Int(v) => Ok(Value::BigInt(i64::from(*v))),
                other => Err(self.mismatch("ROWVERSION", other)),
            },
        }
    }

    fn mismatch(&self, expected: &'static str, actual: &Value) -> Error {
        Error::Type(TypeError {
            expected,
            actual: actual.type_name().to_string(),
            column: None,
        })
    }
}
