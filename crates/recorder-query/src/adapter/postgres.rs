//! PostgreSQL adapter with `$n` placeholders.

use std::collections::HashMap;

use recorder_common::{OpaqueType, RecorderResult};
use recorder_schema::{Constraint, ScalarType, SchemaSource};

use super::ansi::{opaque_sql_type, standard_constraint};
use super::SqlAdapter;

/// PostgreSQL dialect.
#[derive(Debug, Clone, Default)]
pub struct PostgresAdapter {
    opaque_types: HashMap<OpaqueType, String>,
}

impl PostgresAdapter {
    /// Creates an adapter with no opaque type mappings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps an opaque type to an SQL type name, e.g. `UUID` or `JSONB`.
    pub fn with_opaque_type(mut self, ty: OpaqueType, sql_type: impl Into<String>) -> Self {
        self.opaque_types.insert(ty, sql_type.into());
        self
    }
}

impl SqlAdapter for PostgresAdapter {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn sql_type(&self, scalar: &ScalarType) -> RecorderResult<String> {
        Ok(match scalar {
            ScalarType::Bool => "BOOLEAN".to_string(),
            ScalarType::Byte | ScalarType::Short => "SMALLINT".to_string(),
            ScalarType::Int => "INTEGER".to_string(),
            ScalarType::Long => "BIGINT".to_string(),
            ScalarType::Float => "REAL".to_string(),
            ScalarType::Double => "DOUBLE PRECISION".to_string(),
            ScalarType::Text => "TEXT".to_string(),
            ScalarType::Opaque(ty) => opaque_sql_type(&self.opaque_types, ty)?,
        })
    }

    fn render_constraint(
        &self,
        constraint: &Constraint,
        source: &dyn SchemaSource,
    ) -> RecorderResult<String> {
        standard_constraint(constraint, source)
    }

    fn placeholder(&self, position: usize) -> String {
        format!("${}", position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recorder_schema::{record, PrimaryKey, SchemaCatalog};

    record! {
        pub struct Event as "events" {
            pub id: PrimaryKey<i64>,
            pub title: String,
            pub attendees: i32,
            pub remote: bool,
        }
    }

    #[test]
    fn test_types_and_placeholders() {
        let catalog = SchemaCatalog::new();
        let adapter = PostgresAdapter::new();
        let table = catalog.table_of::<Event>().unwrap();

        assert_eq!(
            adapter.create_table(&table, &catalog).unwrap(),
            "CREATE TABLE events (\
             id BIGINT NOT NULL PRIMARY KEY GENERATED BY DEFAULT AS IDENTITY,\
             title TEXT NOT NULL,\
             attendees INTEGER NOT NULL,\
             remote BOOLEAN NOT NULL)"
        );
        assert_eq!(
            adapter.insert(&table),
            "INSERT INTO events (title,attendees,remote) VALUES ($1,$2,$3)"
        );
        assert_eq!(adapter.name(), "postgres");
    }
}
