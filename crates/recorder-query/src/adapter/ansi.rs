//! ANSI SQL adapter with `?` placeholders.

use std::collections::HashMap;

use recorder_common::{OpaqueType, RecorderError, RecorderResult, POSITIONAL_PLACEHOLDER};
use recorder_schema::{Constraint, ScalarType, SchemaSource};

use super::{render_reference, SqlAdapter};

/// Standard SQL, as understood by most JDBC-style drivers.
#[derive(Debug, Clone, Default)]
pub struct AnsiAdapter {
    opaque_types: HashMap<OpaqueType, String>,
}

impl AnsiAdapter {
    /// Creates an adapter with no opaque type mappings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps an opaque type to an SQL type name.
    pub fn with_opaque_type(mut self, ty: OpaqueType, sql_type: impl Into<String>) -> Self {
        self.opaque_types.insert(ty, sql_type.into());
        self
    }
}

pub(super) fn opaque_sql_type(
    mappings: &HashMap<OpaqueType, String>,
    ty: &OpaqueType,
) -> RecorderResult<String> {
    mappings
        .get(ty)
        .cloned()
        .ok_or_else(|| RecorderError::UnsupportedType {
            field: String::new(),
            type_name: ty.to_string(),
            reason: "no SQL type registered for opaque type".to_string(),
        })
}

pub(super) fn standard_constraint(
    constraint: &Constraint,
    source: &dyn SchemaSource,
) -> RecorderResult<String> {
    Ok(match constraint {
        Constraint::NotNull => "NOT NULL".to_string(),
        Constraint::Unique => "UNIQUE".to_string(),
        Constraint::PrimaryKey => "PRIMARY KEY".to_string(),
        Constraint::Generated => "GENERATED BY DEFAULT AS IDENTITY".to_string(),
        Constraint::References(target) => render_reference(target, source)?,
    })
}

impl SqlAdapter for AnsiAdapter {
    fn name(&self) -> &'static str {
        "ansi"
    }

    fn sql_type(&self, scalar: &ScalarType) -> RecorderResult<String> {
        Ok(match scalar {
            ScalarType::Bool => "BOOLEAN".to_string(),
            ScalarType::Byte | ScalarType::Short => "SMALLINT".to_string(),
            ScalarType::Int => "INTEGER".to_string(),
            ScalarType::Long => "BIGINT".to_string(),
            ScalarType::Float => "REAL".to_string(),
            ScalarType::Double => "DOUBLE PRECISION".to_string(),
            ScalarType::Text => "VARCHAR(255)".to_string(),
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

    fn placeholder(&self, _position: usize) -> String {
        POSITIONAL_PLACEHOLDER.to_string()
    }
}
