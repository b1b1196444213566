//! SQL dialect adapters.
//!
//! An adapter turns tables and query shapes into SQL text for one database.
//! The trait's provided methods hold the statement layout shared by every
//! dialect; implementations supply type names, constraint syntax,
//! operators, and placeholders.

mod ansi;
mod postgres;

pub use ansi::AnsiAdapter;
pub use postgres::PostgresAdapter;

use std::fmt;

use recorder_common::{RecorderError, RecorderResult, FIRST_POSITION};
use recorder_schema::{resolve_physical, Column, Constraint, ScalarType, SchemaSource, Table};

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Order {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::Asc => f.write_str("ASC"),
            Order::Desc => f.write_str("DESC"),
        }
    }
}

/// Right-hand side of a condition being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandSpec<'a> {
    /// A bound parameter.
    Parameter,
    /// Another column, rendered inline.
    Column(&'a str),
}

/// A condition being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionSpec<'a> {
    /// Left-hand column.
    pub column: &'a str,
    /// Operator.
    pub operator: Operator,
    /// Right-hand side.
    pub operand: OperandSpec<'a>,
}

/// Everything a SELECT statement is rendered from.
#[derive(Debug, Clone, Default)]
pub struct SelectSpec<'a> {
    /// Selected columns.
    pub columns: Vec<&'a str>,
    /// Source tables.
    pub tables: Vec<&'a str>,
    /// Conditions joined with AND.
    pub conditions: Vec<ConditionSpec<'a>>,
    /// Sort column and direction.
    pub order: Option<(&'a str, Order)>,
}

/// Rendered SQL and where its parameters come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSql {
    /// Statement text.
    pub sql: String,
    /// For each placeholder in textual order, the index of the condition
    /// whose literal it binds.
    pub parameters: Vec<usize>,
}

/// A database dialect.
pub trait SqlAdapter: Send + Sync {
    /// Returns the dialect name, used in log events.
    fn name(&self) -> &'static str;

    /// Maps a physical column type to its SQL type name.
    fn sql_type(&self, scalar: &ScalarType) -> RecorderResult<String>;

    /// Renders a column constraint.
    fn render_constraint(
        &self,
        constraint: &Constraint,
        source: &dyn SchemaSource,
    ) -> RecorderResult<String>;

    /// Renders a comparison operator.
    fn render_operator(&self, operator: Operator) -> &'static str {
        match operator {
            Operator::Eq => "=",
            Operator::Ne => "<>",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
        }
    }

    /// Renders the placeholder for a 1-based parameter position.
    fn placeholder(&self, position: usize) -> String;

    /// Renders one column definition.
    fn column(&self, column: &Column, source: &dyn SchemaSource) -> RecorderResult<String> {
        let physical = resolve_physical(&column.field_type, source)?;
        let mut sql = format!("{} {}", column.name, self.sql_type(&physical.scalar)?);
        for constraint in &column.constraints {
            sql.push(' ');
            sql.push_str(&self.render_constraint(constraint, source)?);
        }
        Ok(sql)
    }

    /// Renders a CREATE TABLE statement.
    fn create_table(&self, table: &Table, source: &dyn SchemaSource) -> RecorderResult<String> {
        if table.columns.is_empty() {
            return Err(RecorderError::UnsupportedType {
                field: String::new(),
                type_name: table.record.to_string(),
                reason: "a table needs at least one column".to_string(),
            });
        }
        let columns = table
            .columns
            .iter()
            .map(|c| self.column(c, source))
            .collect::<RecorderResult<Vec<_>>>()?;
        Ok(format!("CREATE TABLE {} ({})", table.name, columns.join(",")))
    }

    /// Renders a SELECT statement.
    fn select(&self, spec: &SelectSpec<'_>) -> RenderedSql {
        let mut sql = format!("SELECT {} FROM {}", spec.columns.join(","), spec.tables.join(","));
        let mut parameters = Vec::new();

        for (i, condition) in spec.conditions.iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            sql.push_str(condition.column);
            sql.push_str(self.render_operator(condition.operator));
            match condition.operand {
                OperandSpec::Parameter => {
                    parameters.push(i);
                    sql.push_str(&self.placeholder(FIRST_POSITION + parameters.len() - 1));
                }
                OperandSpec::Column(column) => sql.push_str(column),
            }
        }

        if let Some((column, order)) = spec.order {
            sql.push_str(&format!(" ORDER BY {} {}", column, order));
        }

        RenderedSql { sql, parameters }
    }

    /// Renders an INSERT for every column the database does not generate.
    fn insert(&self, table: &Table) -> String {
        let columns: Vec<&str> = table
            .columns
            .iter()
            .filter(|c| !c.is_generated())
            .map(|c| c.name.as_str())
            .collect();
        let placeholders: Vec<String> = (0..columns.len())
            .map(|i| self.placeholder(FIRST_POSITION + i))
            .collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.name,
            columns.join(","),
            placeholders.join(",")
        )
    }
}

/// Renders a foreign key reference as `REFERENCES Table(key)`.
pub(crate) fn render_reference(
    target: &recorder_schema::RecordTypeId,
    source: &dyn SchemaSource,
) -> RecorderResult<String> {
    let table = source.table(target)?;
    let key = table
        .primary_key_column()
        .ok_or_else(|| RecorderError::MissingPrimaryKey {
            record: target.to_string(),
        })?;
    Ok(format!("REFERENCES {}({})", table.name, key.name))
}
