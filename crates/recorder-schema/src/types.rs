//! Field type descriptors.
//!
//! A [`FieldType`] is either a scalar, a reference to a record type (only
//! legal inside a foreign key), or a wrapper around another field type.
//! Every field type has a canonical textual form used by serialized type
//! descriptions:
//!
//! | Field type                | Text                     |
//! |---------------------------|--------------------------|
//! | `i64`                     | `i64`                    |
//! | `Option<String>`          | `Option<String>`         |
//! | `PrimaryKey<i64>`         | `PrimaryKey<i64>`        |
//! | `ForeignKey<app::User>`   | `ForeignKey<app::User>`  |
//! | `Opaque<uuid::Uuid>`      | `Opaque<uuid::Uuid>`     |
//!
//! Unknown non-generic names are read as opaque types. Unknown generic
//! names are rejected.

use std::fmt;

use recorder_common::{OpaqueType, RecorderError, RecorderResult};
use serde::{Deserialize, Serialize};

use crate::catalog::SchemaSource;
use crate::record::RecordTypeId;

/// A type that maps directly to one column value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    /// Boolean.
    Bool,
    /// 8-bit integer.
    Byte,
    /// 16-bit integer.
    Short,
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    Long,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// Text.
    Text,
    /// Driver-native object read and written by type name.
    Opaque(OpaqueType),
}

impl ScalarType {
    /// Reads a scalar from its canonical name. Unknown names are opaque.
    pub fn from_name(name: &str) -> Self {
        match name {
            "bool" => ScalarType::Bool,
            "i8" => ScalarType::Byte,
            "i16" => ScalarType::Short,
            "i32" => ScalarType::Int,
            "i64" => ScalarType::Long,
            "f32" => ScalarType::Float,
            "f64" => ScalarType::Double,
            "String" => ScalarType::Text,
            other => ScalarType::Opaque(OpaqueType::new(other)),
        }
    }

    /// Returns true for types a database can assign on insert.
    pub fn is_generatable(&self) -> bool {
        matches!(self, ScalarType::Int | ScalarType::Long)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarType::Bool => f.write_str("bool"),
            ScalarType::Byte => f.write_str("i8"),
            ScalarType::Short => f.write_str("i16"),
            ScalarType::Int => f.write_str("i32"),
            ScalarType::Long => f.write_str("i64"),
            ScalarType::Float => f.write_str("f32"),
            ScalarType::Double => f.write_str("f64"),
            ScalarType::Text => f.write_str("String"),
            ScalarType::Opaque(ty) => write!(f, "Opaque<{}>", ty),
        }
    }
}

/// A type that carries one nested field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Wrapper {
    /// Value may be absent; the column is nullable.
    Optional,
    /// Value identifies the row.
    PrimaryKey,
    /// Value is the primary key of another record.
    ForeignKey,
}

impl Wrapper {
    /// Returns the generic name used in canonical text.
    pub const fn name(self) -> &'static str {
        match self {
            Wrapper::Optional => "Option",
            Wrapper::PrimaryKey => "PrimaryKey",
            Wrapper::ForeignKey => "ForeignKey",
        }
    }
}

/// Declared type of a record field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// A scalar.
    Scalar(ScalarType),
    /// Another record type.
    Record(RecordTypeId),
    /// A wrapper around another field type.
    Wrapped(Wrapper, Box<FieldType>),
}

impl FieldType {
    /// Wraps a field type.
    pub fn wrap(wrapper: Wrapper, inner: FieldType) -> Self {
        FieldType::Wrapped(wrapper, Box::new(inner))
    }

    /// Parses canonical text for the given field.
    pub fn parse(field: &str, text: &str) -> RecorderResult<Self> {
        Self::parse_text(text).map_err(|reason| RecorderError::UnsupportedType {
            field: field.to_string(),
            type_name: text.to_string(),
            reason,
        })
    }

    fn parse_text(text: &str) -> Result<Self, String> {
        let text = text.trim();
        if text.is_empty() {
            return Err("empty type name".to_string());
        }

        let Some(open) = text.find('<') else {
            if text.contains('>') {
                return Err("unbalanced generic arguments".to_string());
            }
            return Ok(FieldType::Scalar(ScalarType::from_name(text)));
        };
        if !text.ends_with('>') {
            return Err("unbalanced generic arguments".to_string());
        }

        let head = text[..open].trim();
        let inner = text[open + 1..text.len() - 1].trim();
        if inner.is_empty() {
            return Err("missing generic argument".to_string());
        }
        match head {
            "Option" => Ok(Self::wrap(Wrapper::Optional, Self::parse_text(inner)?)),
            "PrimaryKey" => Ok(Self::wrap(Wrapper::PrimaryKey, Self::parse_text(inner)?)),
            "ForeignKey" => Ok(Self::wrap(
                Wrapper::ForeignKey,
                FieldType::Record(RecordTypeId::new(inner)),
            )),
            "Opaque" => Ok(FieldType::Scalar(ScalarType::Opaque(OpaqueType::new(inner)))),
            other => Err(format!("generic type '{}' is not a supported wrapper", other)),
        }
    }

    /// Checks wrapper placement rules for a field of `record`.
    ///
    /// Records may only appear directly inside a foreign key, primary keys
    /// must be outermost around a scalar, and optionals do not nest.
    pub fn validate(&self, record: &str, field: &str) -> RecorderResult<()> {
        let unsupported = |reason: &str| RecorderError::UnsupportedType {
            field: field.to_string(),
            type_name: self.to_string(),
            reason: reason.to_string(),
        };
        let nullable_key = || RecorderError::NullablePrimaryKey {
            record: record.to_string(),
            column: field.to_string(),
        };

        match self {
            FieldType::Scalar(_) => Ok(()),
            FieldType::Record(_) => Err(unsupported(
                "records can only be referenced through ForeignKey",
            )),
            FieldType::Wrapped(Wrapper::PrimaryKey, inner) => match inner.as_ref() {
                FieldType::Scalar(_) => Ok(()),
                FieldType::Wrapped(Wrapper::Optional, _) => Err(nullable_key()),
                _ => Err(unsupported("primary keys must wrap a scalar type")),
            },
            FieldType::Wrapped(Wrapper::Optional, inner) => match inner.as_ref() {
                FieldType::Scalar(_) => Ok(()),
                FieldType::Wrapped(Wrapper::ForeignKey, _) => inner.validate(record, field),
                FieldType::Wrapped(Wrapper::PrimaryKey, _) => Err(nullable_key()),
                _ => Err(unsupported("optional values cannot be nested")),
            },
            FieldType::Wrapped(Wrapper::ForeignKey, inner) => match inner.as_ref() {
                FieldType::Record(_) => Ok(()),
                _ => Err(unsupported("foreign keys must refer to a record type")),
            },
        }
    }

    /// Returns true if the outermost wrapper is `Optional`.
    pub fn is_optional(&self) -> bool {
        matches!(self, FieldType::Wrapped(Wrapper::Optional, _))
    }

    /// Returns true if the outermost wrapper is `PrimaryKey`.
    pub fn is_primary_key(&self) -> bool {
        matches!(self, FieldType::Wrapped(Wrapper::PrimaryKey, _))
    }

    /// Returns the record a foreign key refers to, looking through `Optional`.
    pub fn foreign_target(&self) -> Option<&RecordTypeId> {
        match self {
            FieldType::Wrapped(Wrapper::Optional, inner) => inner.foreign_target(),
            FieldType::Wrapped(Wrapper::ForeignKey, inner) => match inner.as_ref() {
                FieldType::Record(id) => Some(id),
                _ => None,
            },
            _ => None,
        }
    }

    /// Returns the scalar under `Optional` and `PrimaryKey` wrappers.
    ///
    /// Foreign keys have no scalar of their own; see [`resolve_physical`].
    pub fn scalar(&self) -> Option<&ScalarType> {
        match self {
            FieldType::Scalar(scalar) => Some(scalar),
            FieldType::Wrapped(Wrapper::Optional | Wrapper::PrimaryKey, inner) => inner.scalar(),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Scalar(scalar) => write!(f, "{}", scalar),
            FieldType::Record(id) => write!(f, "{}", id),
            FieldType::Wrapped(wrapper, inner) => write!(f, "{}<{}>", wrapper.name(), inner),
        }
    }
}

/// The column-level type a field type resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhysicalType {
    /// Value type read from and written to the driver.
    pub scalar: ScalarType,
    /// Whether the column accepts NULL.
    pub nullable: bool,
}

/// Peels wrappers off a field type down to its physical column type.
///
/// `Optional` makes the column nullable, `PrimaryKey` is transparent, and a
/// foreign key takes the physical type of its target's primary key.
pub fn resolve_physical(
    field_type: &FieldType,
    source: &dyn SchemaSource,
) -> RecorderResult<PhysicalType> {
    match field_type {
        FieldType::Scalar(scalar) => Ok(PhysicalType {
            scalar: scalar.clone(),
            nullable: false,
        }),
        FieldType::Wrapped(Wrapper::Optional, inner) => {
            let physical = resolve_physical(inner, source)?;
            Ok(PhysicalType {
                nullable: true,
                ..physical
            })
        }
        FieldType::Wrapped(Wrapper::PrimaryKey, inner) => resolve_physical(inner, source),
        FieldType::Wrapped(Wrapper::ForeignKey, inner) => {
            let FieldType::Record(target) = inner.as_ref() else {
                return Err(RecorderError::UnsupportedType {
                    field: String::new(),
                    type_name: field_type.to_string(),
                    reason: "foreign keys must refer to a record type".to_string(),
                });
            };
            let table = source.table(target)?;
            let key = table
                .primary_key_column()
                .ok_or_else(|| RecorderError::MissingPrimaryKey {
                    record: target.to_string(),
                })?;
            resolve_physical(&key.field_type, source)
        }
        FieldType::Record(id) => Err(RecorderError::UnsupportedType {
            field: String::new(),
            type_name: id.to_string(),
            reason: "records can only be referenced through ForeignKey".to_string(),
        }),
    }
}
