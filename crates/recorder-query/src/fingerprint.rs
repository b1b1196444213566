//! Structural query fingerprints.
//!
//! A [`Fingerprint`] describes the shape of a SELECT: selected record,
//! sources, conditions, order, and limit. Literal comparands are left out,
//! so queries that differ only in bound values share one fingerprint and
//! therefore one cached plan.
//!
//! The builder folds every component into a running 64-bit hash as it is
//! added (`h = 31 * h + hash(component)`). Hashing a fingerprint writes only
//! that folded value; equality compares the full structure.

use std::any::TypeId;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use recorder_schema::{ColumnKey, Record, RecordTypeId};

use crate::adapter::{Operator, Order};

/// A query source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Source {
    /// A table by name.
    Table(String),
    /// The table of a record type.
    Record(RecordTypeId),
}

/// Right-hand side of a condition, without its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandShape {
    /// A bound literal.
    Parameter,
    /// Another column.
    Column(ColumnKey),
}

/// A condition, without its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConditionShape {
    /// Left-hand column.
    pub column: ColumnKey,
    /// Operator.
    pub operator: Operator,
    /// Right-hand side.
    pub operand: OperandShape,
}

/// Structural cache key of a SELECT.
#[derive(Debug, Clone)]
pub struct Fingerprint {
    hash: u64,
    record: TypeId,
    sources: Option<Vec<Source>>,
    conditions: Vec<ConditionShape>,
    order: Option<(ColumnKey, Order)>,
    limit: Option<usize>,
}

impl Fingerprint {
    /// Starts the fingerprint of a query selecting `R`.
    pub fn new<R: Record>() -> Self {
        let record = TypeId::of::<R>();
        let mut fingerprint = Self {
            hash: 1,
            record,
            sources: None,
            conditions: Vec::new(),
            order: None,
            limit: None,
        };
        fingerprint.fold(&record);
        fingerprint
    }

    fn fold<T: Hash + ?Sized>(&mut self, component: &T) {
        let mut hasher = DefaultHasher::new();
        component.hash(&mut hasher);
        self.hash = self.hash.wrapping_mul(31).wrapping_add(hasher.finish());
    }

    pub(crate) fn set_sources(&mut self, sources: Vec<Source>) {
        for source in &sources {
            self.fold(source);
        }
        self.sources = Some(sources);
    }

    pub(crate) fn push_condition(&mut self, condition: ConditionShape) {
        self.fold(&condition);
        self.conditions.push(condition);
    }

    pub(crate) fn set_order(&mut self, column: ColumnKey, order: Order) {
        self.fold(&column);
        self.fold(&order);
        self.order = Some((column, order));
    }

    pub(crate) fn set_limit(&mut self, limit: usize) {
        self.fold(&limit);
        self.limit = Some(limit);
    }

    /// Returns the folded hash.
    pub fn hash_code(&self) -> u64 {
        self.hash
    }

    /// Returns the explicit sources, if FROM was given.
    pub fn sources(&self) -> Option<&[Source]> {
        self.sources.as_deref()
    }

    /// Returns condition shapes in order.
    pub fn conditions(&self) -> &[ConditionShape] {
        &self.conditions
    }

    /// Returns the sort column and direction.
    pub fn order(&self) -> Option<(ColumnKey, Order)> {
        self.order
    }

    /// Returns the row limit.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}

impl PartialEq for Fingerprint {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
            && self.record == other.record
            && self.sources == other.sources
            && self.conditions == other.conditions
            && self.order == other.order
            && self.limit == other.limit
    }
}

impl Eq for Fingerprint {}

impl Hash for Fingerprint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recorder_schema::{record, PrimaryKey};

    record! {
        pub struct Row {
            pub id: PrimaryKey<i64>,
            pub a: i32,
            pub b: i32,
        }
    }

    fn with_condition(column: ColumnKey, operand: OperandShape) -> Fingerprint {
        let mut fp = Fingerprint::new::<Row>();
        fp.push_condition(ConditionShape {
            column,
            operator: Operator::Eq,
            operand,
        });
        fp
    }

    #[test]
    fn test_same_shape_is_equal() {
        let x = with_condition(Row::a.key(), OperandShape::Parameter);
        let y = with_condition(Row::a.key(), OperandShape::Parameter);
        assert_eq!(x, y);
        assert_eq!(x.hash_code(), y.hash_code());
    }

    #[test]
    fn test_column_and_operand_kind_matter() {
        let base = with_condition(Row::a.key(), OperandShape::Parameter);
        assert_ne!(base, with_condition(Row::b.key(), OperandShape::Parameter));
        assert_ne!(
            base,
            with_condition(Row::a.key(), OperandShape::Column(Row::b.key()))
        );
    }

    #[test]
    fn test_components_are_order_sensitive() {
        let mut x = Fingerprint::new::<Row>();
        x.set_limit(5);
        x.set_order(Row::a.key(), Order::Asc);

        let mut y = Fingerprint::new::<Row>();
        y.set_order(Row::a.key(), Order::Asc);
        y.set_limit(5);

        // Same structure, different folding order
        assert_ne!(x.hash_code(), y.hash_code());
        assert_ne!(x, y);
    }

    #[test]
    fn test_limit_and_sources_matter() {
        let mut limited = Fingerprint::new::<Row>();
        limited.set_limit(1);
        assert_ne!(limited, Fingerprint::new::<Row>());

        let mut sourced = Fingerprint::new::<Row>();
        sourced.set_sources(vec![Source::Table("rows".to_string())]);
        assert_eq!(sourced.sources(), Some(&[Source::Table("rows".to_string())][..]));
        assert_ne!(sourced, Fingerprint::new::<Row>());
    }
}
