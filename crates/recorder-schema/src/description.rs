//! Serialized type descriptions.
//!
//! A [`TypeDescription`] carries the same information as a live
//! [`RecordDescriptor`] in plain data, with field types in canonical text
//! form. It can be written next to generated code ahead of time and read
//! back as JSON without the record type being linked in.

use recorder_common::{RecorderError, RecorderResult};
use serde::{Deserialize, Serialize};

use crate::record::{FieldAnnotations, Record, RecordDescriptor, RecordTypeId};
use crate::table::{FieldSpec, Table};
use crate::types::FieldType;

/// One serialized field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescription {
    /// Field name.
    pub name: String,
    /// Field type in canonical text form.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Declaration annotations.
    #[serde(default)]
    pub annotations: FieldAnnotations,
}

/// Serialized description of a record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescription {
    /// Type identifier.
    pub type_id: RecordTypeId,
    /// Type name without module path.
    pub type_name: String,
    /// Table name override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    /// Fields in declaration order.
    pub fields: Vec<FieldDescription>,
}

impl TypeDescription {
    /// Describes a record type.
    pub fn of<R: Record>() -> Self {
        Self::from_descriptor(R::descriptor())
    }

    /// Describes a live descriptor.
    pub fn from_descriptor(descriptor: &RecordDescriptor) -> Self {
        Self {
            type_id: descriptor.type_id.clone(),
            type_name: descriptor.type_name.to_string(),
            table_name: descriptor.table_name.map(str::to_string),
            fields: descriptor
                .fields
                .iter()
                .map(|f| FieldDescription {
                    name: f.name.to_string(),
                    type_name: f.field_type.to_string(),
                    annotations: f.annotations,
                })
                .collect(),
        }
    }

    /// Reads a description from JSON.
    pub fn from_json(json: &str) -> RecorderResult<Self> {
        serde_json::from_str(json).map_err(|e| RecorderError::UnsupportedType {
            field: String::new(),
            type_name: "TypeDescription".to_string(),
            reason: e.to_string(),
        })
    }

    /// Writes the description as JSON.
    pub fn to_json(&self) -> RecorderResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| RecorderError::internal(e.to_string()))
    }

    /// Derives the described table.
    pub fn to_table(&self) -> RecorderResult<Table> {
        let fields = self
            .fields
            .iter()
            .map(|f| {
                Ok(FieldSpec {
                    name: &f.name,
                    field_type: FieldType::parse(&f.name, &f.type_name)?,
                    annotations: f.annotations,
                })
            })
            .collect::<RecorderResult<Vec<_>>>()?;

        Table::derive(
            &self.type_id,
            &self.type_name,
            self.table_name.as_deref(),
            fields,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        record, resolve_physical, Constraint, ForeignKey, Opaque, PrimaryKey, SchemaCatalog,
        SchemaSource,
    };

    record! {
        pub struct Customer as "Customers" {
            pub id: PrimaryKey<i64>,
            pub email: String [unique],
            pub nickname: Option<String>,
        }
    }

    record! {
        pub struct Invoice {
            pub id: PrimaryKey<i32> [not_generated],
            pub customer: ForeignKey<Customer>,
            pub total: f64,
            pub paid: bool,
            pub scan: Opaque<Vec<u8>> [nullable],
        }
    }

    #[test]
    fn test_both_paths_agree() {
        for (live, described) in [
            (
                Table::from_record::<Customer>().unwrap(),
                TypeDescription::of::<Customer>().to_table().unwrap(),
            ),
            (
                Table::from_record::<Invoice>().unwrap(),
                TypeDescription::of::<Invoice>().to_table().unwrap(),
            ),
        ] {
            assert_eq!(live, described);
        }
    }

    #[test]
    fn test_json_round_trip_agrees() {
        let json = TypeDescription::of::<Invoice>().to_json().unwrap();
        let parsed = TypeDescription::from_json(&json).unwrap();
        assert_eq!(parsed, TypeDescription::of::<Invoice>());
        assert_eq!(parsed.to_table().unwrap(), Table::from_record::<Invoice>().unwrap());
    }

    #[test]
    fn test_handwritten_description() {
        let json = r#"{
            "type_id": "billing::Customer",
            "type_name": "Customer",
            "table_name": "Customers",
            "fields": [
                { "name": "id", "type": "PrimaryKey<i64>" },
                { "name": "email", "type": "String", "annotations": { "unique": true } },
                { "name": "nickname", "type": "Option<String>" }
            ]
        }"#;
        let table = TypeDescription::from_json(json).unwrap().to_table().unwrap();
        let live = Table::from_record::<Customer>().unwrap();

        assert_eq!(table.name, live.name);
        assert_eq!(table.columns, live.columns);
    }

    #[test]
    fn test_unsupported_generic() {
        let json = r#"{
            "type_id": "app::Bad",
            "type_name": "Bad",
            "fields": [{ "name": "tags", "type": "Vec<String>" }]
        }"#;
        let err = TypeDescription::from_json(json).unwrap().to_table().unwrap_err();
        match err {
            RecorderError::UnsupportedType { field, type_name, .. } => {
                assert_eq!(field, "tags");
                assert_eq!(type_name, "Vec<String>");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_described_multiple_primary_keys() {
        let json = r#"{
            "type_id": "ledger::Entry",
            "type_name": "Entry",
            "fields": [
                { "name": "id", "type": "PrimaryKey<i64>" },
                { "name": "memo", "type": "String" },
                { "name": "code", "type": "String", "annotations": { "primary_key": true } }
            ]
        }"#;
        let err = TypeDescription::from_json(json).unwrap().to_table().unwrap_err();
        match err {
            RecorderError::MultiplePrimaryKeys { record, columns } => {
                assert_eq!(record, "ledger::Entry");
                assert_eq!(columns, vec!["id".to_string(), "code".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }

        let catalog = SchemaCatalog::new();
        assert!(catalog.register_description(TypeDescription::from_json(json).unwrap()));
        let err = catalog.table(&RecordTypeId::new("ledger::Entry")).unwrap_err();
        assert!(matches!(err, RecorderError::MultiplePrimaryKeys { .. }));
        // Failed derivations are not cached
        assert!(catalog.tables().is_empty());
    }

    #[test]
    fn test_described_unknown_foreign_target() {
        let json = r#"{
            "type_id": "ledger::Line",
            "type_name": "Line",
            "fields": [
                { "name": "id", "type": "PrimaryKey<i64>" },
                { "name": "entry", "type": "ForeignKey<ledger::Missing>" }
            ]
        }"#;
        let catalog = SchemaCatalog::new();
        assert!(catalog.register_description(TypeDescription::from_json(json).unwrap()));

        // The table derives, but the key type cannot be resolved
        let table = catalog.table(&RecordTypeId::new("ledger::Line")).unwrap();
        let entry = table.column_named("entry").unwrap();
        assert!(entry.has(&Constraint::References(RecordTypeId::new("ledger::Missing"))));

        let err = resolve_physical(&entry.field_type, &catalog).unwrap_err();
        match err {
            RecorderError::UnknownRecord { record } => assert_eq!(record, "ledger::Missing"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_json() {
        assert!(TypeDescription::from_json("{ not json").is_err());
    }
}
