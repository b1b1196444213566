//! Table derivation.
//!
//! A [`Table`] is derived from a record's field list, either through the
//! live [`RecordDescriptor`] or a serialized
//! [`TypeDescription`](crate::TypeDescription). Both paths funnel into the
//! same derivation and produce equal tables for the same record.

use std::collections::HashSet;

use recorder_common::{RecorderError, RecorderResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::record::{FieldAnnotations, Record, RecordDescriptor, RecordTypeId};
use crate::types::FieldType;

/// A column constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constraint {
    /// Column rejects NULL.
    NotNull,
    /// Column values are unique.
    Unique,
    /// Column is the primary key.
    PrimaryKey,
    /// Database assigns the value on insert.
    Generated,
    /// Column holds the primary key of another record's table.
    References(RecordTypeId),
}

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Declared field type.
    pub field_type: FieldType,
    /// Constraints in rendering order.
    pub constraints: Vec<Constraint>,
}

impl Column {
    /// Returns true if the column carries the constraint.
    pub fn has(&self, constraint: &Constraint) -> bool {
        self.constraints.contains(constraint)
    }

    /// Returns true if the column accepts NULL.
    pub fn is_nullable(&self) -> bool {
        !self.has(&Constraint::NotNull)
    }

    /// Returns true if the database assigns this column's value.
    pub fn is_generated(&self) -> bool {
        self.has(&Constraint::Generated)
    }
}

/// A derived table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Record type the table belongs to.
    pub record: RecordTypeId,
    /// Table name.
    pub name: String,
    /// Columns in field declaration order.
    pub columns: Vec<Column>,
    /// Position of the primary key column.
    pub primary_key: Option<usize>,
}

/// One field as seen by table derivation.
pub(crate) struct FieldSpec<'a> {
    pub name: &'a str,
    pub field_type: FieldType,
    pub annotations: FieldAnnotations,
}

impl Table {
    /// Derives the table of a record type.
    pub fn from_record<R: Record>() -> RecorderResult<Self> {
        Self::from_descriptor(R::descriptor())
    }

    /// Derives a table from a live descriptor.
    pub fn from_descriptor(descriptor: &RecordDescriptor) -> RecorderResult<Self> {
        Self::derive(
            &descriptor.type_id,
            descriptor.type_name,
            descriptor.table_name,
            descriptor.fields.iter().map(|f| FieldSpec {
                name: f.name,
                field_type: f.field_type.clone(),
                annotations: f.annotations,
            }),
        )
    }

    pub(crate) fn derive<'a>(
        record: &RecordTypeId,
        type_name: &str,
        table_name: Option<&str>,
        fields: impl IntoIterator<Item = FieldSpec<'a>>,
    ) -> RecorderResult<Self> {
        let name = match table_name {
            Some(name) if name.trim().is_empty() => {
                return Err(RecorderError::AmbiguousTableName {
                    record: record.to_string(),
                    reason: "table name override is empty".to_string(),
                })
            }
            Some(name) => name.to_string(),
            None if type_name.trim().is_empty() => {
                return Err(RecorderError::AmbiguousTableName {
                    record: record.to_string(),
                    reason: "record has no type name and no override".to_string(),
                })
            }
            None => type_name.to_string(),
        };

        let mut columns = Vec::new();
        let mut seen = HashSet::new();
        let mut keys = Vec::new();

        for field in fields {
            field.field_type.validate(record.as_str(), field.name)?;
            if !seen.insert(field.name.to_string()) {
                return Err(RecorderError::DuplicateColumn {
                    record: record.to_string(),
                    column: field.name.to_string(),
                });
            }

            let column = Self::column(record, field)?;
            if column.has(&Constraint::PrimaryKey) {
                keys.push(columns.len());
            }
            columns.push(column);
        }

        if keys.len() > 1 {
            return Err(RecorderError::MultiplePrimaryKeys {
                record: record.to_string(),
                columns: keys.iter().map(|&i| columns[i].name.clone()).collect(),
            });
        }

        debug!(record = %record, table = %name, columns = columns.len(), "derived table");

        Ok(Self {
            record: record.clone(),
            name,
            columns,
            primary_key: keys.first().copied(),
        })
    }

    fn column(record: &RecordTypeId, field: FieldSpec<'_>) -> RecorderResult<Column> {
        let FieldSpec {
            name,
            field_type,
            annotations,
        } = field;

        let primary_key = annotations.primary_key || field_type.is_primary_key();
        let nullable = annotations.nullable || field_type.is_optional();
        if primary_key && nullable {
            return Err(RecorderError::NullablePrimaryKey {
                record: record.to_string(),
                column: name.to_string(),
            });
        }

        let mut constraints = Vec::new();
        if !nullable {
            constraints.push(Constraint::NotNull);
        }
        if annotations.unique && !primary_key {
            constraints.push(Constraint::Unique);
        }
        if primary_key {
            constraints.push(Constraint::PrimaryKey);
            let generatable = field_type.scalar().is_some_and(|s| s.is_generatable());
            if generatable && !annotations.not_generated {
                constraints.push(Constraint::Generated);
            }
        }
        if let Some(target) = field_type.foreign_target() {
            constraints.push(Constraint::References(target.clone()));
        }

        Ok(Column {
            name: name.to_string(),
            field_type,
            constraints,
        })
    }

    /// Returns the primary key column.
    pub fn primary_key_column(&self) -> Option<&Column> {
        self.primary_key.map(|i| &self.columns[i])
    }

    /// Returns a column by name.
    pub fn column_named(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ScalarType, Wrapper};
    use crate::{record, ForeignKey, PrimaryKey};

    record! {
        pub struct User as "Users" {
            pub id: PrimaryKey<i64>,
            pub name: String [unique],
            pub age: i32,
        }
    }

    record! {
        pub struct Post {
            pub id: PrimaryKey<String>,
            pub author: ForeignKey<User>,
            pub reviewer: Option<ForeignKey<User>>,
            pub body: String [nullable],
        }
    }

    record! {
        pub struct Pair {
            pub left: i32 [primary_key],
            pub right: PrimaryKey<i32>,
        }
    }

    record! {
        pub struct Manual {
            pub id: PrimaryKey<i32> [not_generated],
        }
    }

    record! {
        pub struct Blank as "  " {
            pub id: i32,
        }
    }

    #[test]
    fn test_derive_users() {
        let table = Table::from_record::<User>().unwrap();
        assert_eq!(table.name, "Users");
        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["id", "name", "age"]);
        assert_eq!(table.primary_key, Some(0));
        assert_eq!(
            table.columns[0].constraints,
            vec![Constraint::NotNull, Constraint::PrimaryKey, Constraint::Generated]
        );
        assert_eq!(
            table.columns[1].constraints,
            vec![Constraint::NotNull, Constraint::Unique]
        );
        assert_eq!(table.columns[2].constraints, vec![Constraint::NotNull]);
    }

    #[test]
    fn test_derivation_is_deterministic() {
        assert_eq!(
            Table::from_record::<Post>().unwrap(),
            Table::from_record::<Post>().unwrap()
        );
    }

    #[test]
    fn test_foreign_keys_and_nullability() {
        let table = Table::from_record::<Post>().unwrap();
        assert_eq!(table.name, "Post");

        // Text keys are never generated
        assert!(!table.columns[0].is_generated());

        let author = table.column_named("author").unwrap();
        assert_eq!(
            author.constraints,
            vec![Constraint::NotNull, Constraint::References(User::record_type())]
        );

        let reviewer = table.column_named("reviewer").unwrap();
        assert!(reviewer.is_nullable());
        assert!(reviewer.has(&Constraint::References(User::record_type())));

        let body = table.column_named("body").unwrap();
        assert!(body.is_nullable());
        assert_eq!(body.field_type, FieldType::Scalar(ScalarType::Text));
    }

    #[test]
    fn test_multiple_primary_keys() {
        let err = Table::from_record::<Pair>().unwrap_err();
        match err {
            RecorderError::MultiplePrimaryKeys { columns, .. } => {
                assert_eq!(columns, vec!["left".to_string(), "right".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_not_generated() {
        let table = Table::from_record::<Manual>().unwrap();
        assert_eq!(
            table.columns[0].constraints,
            vec![Constraint::NotNull, Constraint::PrimaryKey]
        );
    }

    #[test]
    fn test_blank_table_name() {
        let err = Table::from_record::<Blank>().unwrap_err();
        assert!(matches!(err, RecorderError::AmbiguousTableName { .. }));
    }

    #[test]
    fn test_duplicate_and_nullable_key() {
        let record = RecordTypeId::new("app::Dup");
        let int = || FieldType::Scalar(ScalarType::Int);
        let err = Table::derive(
            &record,
            "Dup",
            None,
            vec![
                FieldSpec { name: "a", field_type: int(), annotations: FieldAnnotations::NONE },
                FieldSpec { name: "a", field_type: int(), annotations: FieldAnnotations::NONE },
            ],
        )
        .unwrap_err();
        assert!(matches!(err, RecorderError::DuplicateColumn { .. }));

        let err = Table::derive(
            &record,
            "Dup",
            None,
            vec![FieldSpec {
                name: "id",
                field_type: FieldType::wrap(Wrapper::Optional, int()),
                annotations: FieldAnnotations::NONE.primary_key(),
            }],
        )
        .unwrap_err();
        assert!(matches!(err, RecorderError::NullablePrimaryKey { .. }));
    }
}
