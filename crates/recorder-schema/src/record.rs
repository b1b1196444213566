//! Record types and their descriptors.
//!
//! A record is a plain struct whose fields are all [`Field`](crate::Field)
//! types. Its [`RecordDescriptor`] is the live type handle tables are
//! derived from. Records are normally declared with the [`record!`] macro,
//! which also generates one [`ColumnRef`](crate::ColumnRef) constant per
//! field.

use std::borrow::Cow;
use std::fmt;

use recorder_common::{RecorderError, RecorderResult, Value};
use serde::{Deserialize, Serialize};

use crate::types::FieldType;

/// Stable identifier of a record type: its full path, including any
/// enclosing function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordTypeId(Cow<'static, str>);

impl RecordTypeId {
    /// Creates an identifier from a static path.
    pub const fn from_static(path: &'static str) -> Self {
        Self(Cow::Borrowed(path))
    }

    /// Creates an identifier.
    pub fn new(path: impl Into<String>) -> Self {
        Self(Cow::Owned(path.into()))
    }

    /// Returns the full path.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the last path segment.
    pub fn simple_name(&self) -> &str {
        self.0.rsplit("::").next().unwrap_or(&self.0)
    }
}

impl fmt::Display for RecordTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lazily evaluated descriptor of another record.
pub type DescriptorFn = fn() -> &'static RecordDescriptor;

/// Per-field declaration annotations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldAnnotations {
    /// Column values must be unique.
    pub unique: bool,
    /// Column accepts NULL even though the field type is not optional.
    pub nullable: bool,
    /// Column is the primary key even though the field type is not `PrimaryKey`.
    pub primary_key: bool,
    /// Integer primary key is supplied by the application, not the database.
    pub not_generated: bool,
}

impl FieldAnnotations {
    /// No annotations.
    pub const NONE: Self = Self {
        unique: false,
        nullable: false,
        primary_key: false,
        not_generated: false,
    };

    /// Marks the field unique.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks the field nullable.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Marks the field as primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Disables database-generated values for the field.
    #[must_use]
    pub const fn not_generated(mut self) -> Self {
        self.not_generated = true;
        self
    }
}

/// One declared field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field name, also the column name.
    pub name: &'static str,
    /// Declared type.
    pub field_type: FieldType,
    /// Declaration annotations.
    pub annotations: FieldAnnotations,
}

/// Live description of a record type.
#[derive(Debug, Clone)]
pub struct RecordDescriptor {
    /// Type identifier.
    pub type_id: RecordTypeId,
    /// Type name without module path.
    pub type_name: &'static str,
    /// Table name override.
    pub table_name: Option<&'static str>,
    /// Fields in declaration order.
    pub fields: Vec<FieldDescriptor>,
    /// Records referred to by foreign keys.
    pub dependencies: Vec<DescriptorFn>,
}

impl RecordDescriptor {
    /// Returns the position of the field that acts as primary key.
    pub fn primary_key_index(&self) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.annotations.primary_key || f.field_type.is_primary_key())
    }
}

/// A struct that maps to one table row.
pub trait Record: Sized + Send + Sync + 'static {
    /// Returns the type identifier.
    fn record_type() -> RecordTypeId;

    /// Returns the live type descriptor.
    fn descriptor() -> &'static RecordDescriptor;

    /// Converts every field to a driver value, in declaration order.
    fn to_values(&self) -> Vec<Value>;

    /// Builds a record field by field. `read` is called once per field
    /// with the field's position, in declaration order.
    fn read_fields<F>(read: F) -> RecorderResult<Self>
    where
        F: FnMut(usize) -> RecorderResult<Value>;

    /// Builds a record from driver values in declaration order.
    fn from_values(values: Vec<Value>) -> RecorderResult<Self> {
        let mut values = values.into_iter();
        Self::read_fields(|index| {
            values.next().ok_or_else(|| RecorderError::MissingValue {
                field: Self::descriptor()
                    .fields
                    .get(index)
                    .map_or_else(|| index.to_string(), |field| field.name.to_string()),
            })
        })
    }
}

/// Declares a record struct.
///
/// ```
/// use recorder_schema::{record, PrimaryKey, Record};
///
/// record! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct User as "Users" {
///         pub id: PrimaryKey<i64>,
///         pub name: String [unique],
///         pub age: i32,
///     }
/// }
///
/// assert_eq!(User::descriptor().table_name, Some("Users"));
/// assert_eq!(User::name.name(), "name");
/// ```
///
/// Field annotations go in brackets after the type: `unique`, `nullable`,
/// `primary_key`, and `not_generated`.
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident $(as $table:literal)? {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $fname:ident : $fty:ty $([$($ann:ident),* $(,)?])?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $fname: $fty,
            )*
        }

        impl $crate::Record for $name {
            fn record_type() -> $crate::RecordTypeId {
                $crate::RecordTypeId::from_static(::std::any::type_name::<Self>())
            }

            fn descriptor() -> &'static $crate::RecordDescriptor {
                static DESCRIPTOR: ::std::sync::OnceLock<$crate::RecordDescriptor> =
                    ::std::sync::OnceLock::new();
                DESCRIPTOR.get_or_init(|| {
                    #[allow(unused_mut)]
                    let mut dependencies: ::std::vec::Vec<$crate::DescriptorFn> = ::std::vec::Vec::new();
                    $(<$fty as $crate::Field>::foreign_targets(&mut dependencies);)*
                    $crate::RecordDescriptor {
                        type_id: <Self as $crate::Record>::record_type(),
                        type_name: stringify!($name),
                        table_name: $crate::__record_table!($($table)?),
                        fields: ::std::vec![$(
                            $crate::FieldDescriptor {
                                name: stringify!($fname),
                                field_type: <$fty as $crate::Field>::field_type(),
                                annotations: $crate::FieldAnnotations::NONE $($(.$ann())*)?,
                            },
                        )*],
                        dependencies,
                    }
                })
            }

            fn to_values(&self) -> ::std::vec::Vec<$crate::Value> {
                ::std::vec![$($crate::Field::to_value(&self.$fname)),*]
            }

            #[allow(unused_mut, unused_variables)]
            fn read_fields<F>(mut read: F) -> $crate::RecorderResult<Self>
            where
                F: FnMut(usize) -> $crate::RecorderResult<$crate::Value>,
            {
                Ok(Self {
                    $(
                        $fname: <$fty as $crate::Field>::from_value(read(Self::$fname.index())?)?,
                    )*
                })
            }
        }

        impl $name {
            $crate::__record_columns!($name; 0usize; $($fname: $fty),*);
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __record_table {
    () => {
        ::std::option::Option::None
    };
    ($table:literal) => {
        ::std::option::Option::Some($table)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __record_columns {
    ($record:ident; $index:expr;) => {};
    ($record:ident; $index:expr; $fname:ident : $fty:ty $(, $rest:ident : $rest_ty:ty)*) => {
        #[allow(non_upper_case_globals)]
        #[doc = concat!("Column reference to `", stringify!($record), "::", stringify!($fname), "`.")]
        pub const $fname: $crate::ColumnRef<$record, $fty> =
            $crate::ColumnRef::new($index, stringify!($fname));
        $crate::__record_columns!($record; $index + 1; $($rest: $rest_ty),*);
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ForeignKey, PrimaryKey};

    record! {
        #[derive(Debug, Clone, PartialEq)]
        pub struct Author as "Authors" {
            pub id: PrimaryKey<i64>,
            pub name: String [unique],
        }
    }

    record! {
        #[derive(Debug, Clone, PartialEq)]
        pub struct Book {
            pub id: PrimaryKey<i32>,
            pub title: String,
            pub author: ForeignKey<Author>,
            pub editor: Option<ForeignKey<Author>>,
            pub pages: i16 [nullable],
        }
    }

    #[test]
    fn test_descriptor() {
        let descriptor = Author::descriptor();
        assert_eq!(descriptor.type_name, "Author");
        assert_eq!(descriptor.table_name, Some("Authors"));
        assert!(descriptor.type_id.as_str().ends_with("::Author"));
        assert_eq!(descriptor.type_id.simple_name(), "Author");
        assert_eq!(descriptor.fields.len(), 2);
        assert!(descriptor.fields[1].annotations.unique);
        assert_eq!(descriptor.primary_key_index(), Some(0));
        assert!(descriptor.dependencies.is_empty());

        // Same static instance every time
        assert!(std::ptr::eq(descriptor, Author::descriptor()));
    }

    #[test]
    fn test_dependencies() {
        let descriptor = Book::descriptor();
        assert_eq!(descriptor.table_name, None);
        assert_eq!(descriptor.dependencies.len(), 2);
        assert_eq!(
            (descriptor.dependencies[0])().type_id,
            Author::record_type()
        );
        assert!(descriptor.fields[4].annotations.nullable);
        assert_eq!(
            descriptor.fields[3].field_type.to_string(),
            format!("Option<ForeignKey<{}>>", Author::record_type())
        );
    }

    #[test]
    fn test_values() {
        let book = Book {
            id: PrimaryKey::of(3),
            title: "Dune".to_string(),
            author: ForeignKey::new(1i64),
            editor: None,
            pages: 412,
        };
        let values = book.to_values();
        assert_eq!(
            values,
            vec![
                Value::Int(3),
                Value::from("Dune"),
                Value::Long(1),
                Value::Null,
                Value::Short(412),
            ]
        );
        assert_eq!(Book::from_values(values).unwrap(), book);

        let err = Book::from_values(vec![Value::Int(3)]).unwrap_err();
        assert!(matches!(err, RecorderError::MissingValue { ref field } if field == "title"));
    }

    #[test]
    fn test_column_constants() {
        assert_eq!(Book::id.index(), 0);
        assert_eq!(Book::author.index(), 2);
        assert_eq!(Book::pages.index(), 4);
        assert_eq!(Book::pages.name(), "pages");
    }

    #[test]
    fn test_foreign_key_to_record() {
        let author = Author {
            id: PrimaryKey::of(7),
            name: "Frank".to_string(),
        };
        let fk = ForeignKey::to(&author).unwrap();
        assert_eq!(fk.key(), &Value::Long(7));

        let unsaved = Author {
            id: PrimaryKey::auto(),
            name: "Nobody".to_string(),
        };
        assert!(ForeignKey::<Author>::to(&unsaved).is_err());
    }
}
