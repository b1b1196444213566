//! Fluent SELECT builder.
//!
//! A builder is created by [`WorkerContext::select`] and owns the connection
//! it will run on. Conditions are added in two steps:
//! [`SelectBuilder::where_`] hands back a [`ConditionBuilder`], and only one
//! of its comparison methods returns the [`SelectBuilder`], so a condition
//! can never be left without an operator.
//!
//! ```rust,ignore
//! let alice = worker
//!     .select::<User>()?
//!     .where_(User::name)
//!     .eq("Alice")
//!     .first()?;
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use recorder_codec::bind_value;
use recorder_common::{RecorderError, RecorderResult, Value, FIRST_POSITION};
use recorder_schema::{
    resolve_physical, ColumnHandle, ColumnRef, Field, Record, RecordTypeId, SchemaView, Table,
};
use tracing::debug;

use crate::adapter::{ConditionSpec, OperandSpec, Operator, Order, SelectSpec};
use crate::context::WorkerContext;
use crate::driver::Connection;
use crate::engine::Engine;
use crate::fingerprint::{ConditionShape, Fingerprint, OperandShape, Source};
use crate::plan::{CachedPlan, PlanParameter};

/// Right-hand side of a condition.
#[derive(Debug, Clone)]
enum Operand {
    Literal(Value),
    Column(ColumnHandle),
}

#[derive(Debug, Clone)]
struct Condition {
    column: ColumnHandle,
    operator: Operator,
    operand: Operand,
}

/// Builder for a SELECT returning records of type `R`.
pub struct SelectBuilder<'w, R: Record> {
    worker: &'w mut WorkerContext,
    connection: Box<dyn Connection>,
    sources: Option<Vec<Source>>,
    conditions: Vec<Condition>,
    order: Option<(ColumnHandle, Order)>,
    limit: Option<usize>,
    fingerprint: Fingerprint,
    _record: PhantomData<fn() -> R>,
}

impl<'w, R: Record> SelectBuilder<'w, R> {
    pub(crate) fn new(worker: &'w mut WorkerContext, connection: Box<dyn Connection>) -> Self {
        Self {
            worker,
            connection,
            sources: None,
            conditions: Vec::new(),
            order: None,
            limit: None,
            fingerprint: Fingerprint::new::<R>(),
            _record: PhantomData,
        }
    }

    /// Selects from the named tables.
    pub fn from_tables(mut self, tables: &[&str]) -> RecorderResult<Self> {
        let sources = tables.iter().map(|t| Source::Table(t.to_string())).collect();
        self.set_sources(sources)?;
        Ok(self)
    }

    /// Selects from the tables of the given record types.
    ///
    /// The record types must already be registered with the catalog.
    pub fn from_records(mut self, records: &[RecordTypeId]) -> RecorderResult<Self> {
        let sources = records.iter().cloned().map(Source::Record).collect();
        self.set_sources(sources)?;
        Ok(self)
    }

    /// Selects from the table of `T`, registering it if needed.
    pub fn from_record<T: Record>(self) -> RecorderResult<Self> {
        self.worker.engine().catalog.register::<T>()?;
        self.from_records(&[T::record_type()])
    }

    fn set_sources(&mut self, sources: Vec<Source>) -> RecorderResult<()> {
        if self.sources.is_some() {
            return Err(RecorderError::builder_state("FROM has already been set"));
        }
        if sources.is_empty() {
            return Err(RecorderError::builder_state("FROM needs at least one table"));
        }
        self.fingerprint.set_sources(sources.clone());
        self.sources = Some(sources);
        Ok(())
    }

    /// Starts a condition on `column`.
    pub fn where_<C: Record, T: Field>(self, column: ColumnRef<C, T>) -> ConditionBuilder<'w, R, T> {
        ConditionBuilder {
            query: self,
            column: column.handle(),
            _field: PhantomData,
        }
    }

    /// Sorts the result by `column`.
    pub fn order_by<C: Record, T: Field>(
        mut self,
        column: ColumnRef<C, T>,
        order: Order,
    ) -> RecorderResult<Self> {
        if self.order.is_some() {
            return Err(RecorderError::builder_state("ORDER BY has already been set"));
        }
        let column = column.handle();
        self.fingerprint.set_order(column.key(), order);
        self.order = Some((column, order));
        Ok(self)
    }

    /// Caps the number of returned records.
    pub fn limit(mut self, limit: usize) -> RecorderResult<Self> {
        self.set_limit(limit)?;
        Ok(self)
    }

    fn set_limit(&mut self, limit: usize) -> RecorderResult<()> {
        if self.limit.is_some() {
            return Err(RecorderError::builder_state("LIMIT has already been set"));
        }
        if limit == 0 {
            return Err(RecorderError::builder_state("LIMIT must be at least 1"));
        }
        self.fingerprint.set_limit(limit);
        self.limit = Some(limit);
        Ok(())
    }

    /// Returns the structural fingerprint built so far.
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    fn push_condition(&mut self, column: ColumnHandle, operator: Operator, operand: Operand) {
        let shape = match &operand {
            Operand::Literal(_) => OperandShape::Parameter,
            Operand::Column(other) => OperandShape::Column(other.key()),
        };
        self.fingerprint.push_condition(ConditionShape {
            column: column.key(),
            operator,
            operand: shape,
        });
        self.conditions.push(Condition {
            column,
            operator,
            operand,
        });
    }

    /// Runs the query and returns the first record, if any.
    ///
    /// Applies a limit of one unless a limit was already set.
    pub fn first(mut self) -> RecorderResult<Option<R>> {
        if self.limit.is_none() {
            self.set_limit(1)?;
        }
        Ok(self.execute()?.into_iter().next())
    }

    /// Runs the query and returns every record.
    pub fn all(self) -> RecorderResult<Vec<R>> {
        self.execute()
    }

    fn execute(self) -> RecorderResult<Vec<R>> {
        let Self {
            worker,
            mut connection,
            sources,
            conditions,
            order,
            limit,
            fingerprint,
            ..
        } = self;

        let engine = Arc::clone(worker.engine());
        let table = worker.tables.table_of::<R>()?;
        let codec = worker.codecs.get::<R>(engine.catalog.as_ref())?;

        let tables = &mut worker.tables;
        let plan = worker.plans.get_or_compile(&fingerprint, || {
            compile(&engine, tables, &table, sources.as_deref(), &conditions, order)
        })?;

        let mut statement = connection
            .prepare(&plan.sql)
            .map_err(RecorderError::execution)?;

        for (i, parameter) in plan.parameters.iter().enumerate() {
            let value = literal(&conditions, parameter.condition)?;
            bind_value(&mut *statement, FIRST_POSITION + i, &parameter.scalar, value)?;
        }

        if let Some(limit) = limit {
            statement
                .set_max_rows(limit)
                .map_err(RecorderError::execution)?;
        }

        let mut cursor = statement
            .execute_query()
            .map_err(RecorderError::execution)?;
        let mut records = Vec::new();
        while limit.map_or(true, |limit| records.len() < limit)
            && cursor.advance().map_err(RecorderError::execution)?
        {
            records.push(codec.decode(&*cursor)?);
        }

        debug!(
            record = %R::record_type(),
            rows = records.len(),
            "query executed"
        );
        Ok(records)
    }
}

fn compile(
    engine: &Engine,
    tables: &mut SchemaView,
    table: &Table,
    sources: Option<&[Source]>,
    conditions: &[Condition],
    order: Option<(ColumnHandle, Order)>,
) -> RecorderResult<CachedPlan> {
    let mut table_names = Vec::new();
    match sources {
        None => table_names.push(table.name.clone()),
        Some(sources) => {
            for source in sources {
                match source {
                    Source::Table(name) => table_names.push(name.clone()),
                    Source::Record(record) => table_names.push(tables.table(record)?.name.clone()),
                }
            }
        }
    }

    let spec = SelectSpec {
        columns: table.column_names().collect(),
        tables: table_names.iter().map(String::as_str).collect(),
        conditions: conditions
            .iter()
            .map(|c| ConditionSpec {
                column: c.column.name(),
                operator: c.operator,
                operand: match &c.operand {
                    Operand::Literal(_) => OperandSpec::Parameter,
                    Operand::Column(other) => OperandSpec::Column(other.name()),
                },
            })
            .collect(),
        order: order.map(|(column, order)| (column.name(), order)),
    };
    let rendered = engine.adapter.select(&spec);

    if engine.config.log_sql {
        debug!(adapter = engine.adapter.name(), sql = %rendered.sql, "compiled query plan");
    } else {
        debug!(adapter = engine.adapter.name(), record = %table.record, "compiled query plan");
    }

    // Key types are resolved here so executions never touch the catalog
    let parameters = rendered
        .parameters
        .into_iter()
        .map(|index| {
            let condition = conditions.get(index).ok_or_else(|| {
                RecorderError::internal(format!(
                    "rendered parameter for missing condition {}",
                    index
                ))
            })?;
            let field_type = condition.column.field_type()?;
            let physical = resolve_physical(field_type, engine.catalog.as_ref())?;
            Ok(PlanParameter {
                condition: index,
                scalar: physical.scalar,
            })
        })
        .collect::<RecorderResult<Vec<_>>>()?;

    Ok(CachedPlan {
        sql: rendered.sql,
        parameters,
    })
}

fn literal(conditions: &[Condition], index: usize) -> RecorderResult<&Value> {
    match conditions.get(index).map(|condition| &condition.operand) {
        Some(Operand::Literal(value)) => Ok(value),
        Some(Operand::Column(_)) => Err(RecorderError::internal(format!(
            "plan binds column operand of condition {}",
            index
        ))),
        None => Err(RecorderError::internal(format!(
            "plan refers to missing condition {}",
            index
        ))),
    }
}

/// Condition stage of a [`SelectBuilder`]; `T` is the left-hand field type.
pub struct ConditionBuilder<'w, R: Record, T> {
    query: SelectBuilder<'w, R>,
    column: ColumnHandle,
    _field: PhantomData<fn() -> T>,
}

impl<'w, R: Record, T: Field> ConditionBuilder<'w, R, T> {
    /// `column = value`
    pub fn eq(self, value: impl Into<T>) -> SelectBuilder<'w, R> {
        self.compare(Operator::Eq, value.into())
    }

    /// `column <> value`
    pub fn ne(self, value: impl Into<T>) -> SelectBuilder<'w, R> {
        self.compare(Operator::Ne, value.into())
    }

    /// `column < value`
    pub fn lt(self, value: impl Into<T>) -> SelectBuilder<'w, R> {
        self.compare(Operator::Lt, value.into())
    }

    /// `column <= value`
    pub fn le(self, value: impl Into<T>) -> SelectBuilder<'w, R> {
        self.compare(Operator::Le, value.into())
    }

    /// `column > value`
    pub fn gt(self, value: impl Into<T>) -> SelectBuilder<'w, R> {
        self.compare(Operator::Gt, value.into())
    }

    /// `column >= value`
    pub fn ge(self, value: impl Into<T>) -> SelectBuilder<'w, R> {
        self.compare(Operator::Ge, value.into())
    }

    /// `column = other`, with `other` rendered inline.
    ///
    /// The field types may differ, so a foreign key can be compared with
    /// the primary key it refers to.
    pub fn eq_column<C: Record, U: Field>(self, other: ColumnRef<C, U>) -> SelectBuilder<'w, R> {
        let mut query = self.query;
        query.push_condition(self.column, Operator::Eq, Operand::Column(other.handle()));
        query
    }

    fn compare(self, operator: Operator, value: T) -> SelectBuilder<'w, R> {
        let mut query = self.query;
        query.push_condition(self.column, operator, Operand::Literal(value.to_value()));
        query
    }
}
