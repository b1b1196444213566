//! Typed column references.
//!
//! The [`record!`](crate::record) macro generates one [`ColumnRef`] constant
//! per field, so `User::name` is a `ColumnRef<User, String>`. Resolving a
//! reference needs no catalog and no query; everything it reports comes
//! from the field declaration.

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;

use recorder_common::{RecorderError, RecorderResult};

use crate::field::Field;
use crate::record::{DescriptorFn, Record, RecordTypeId};
use crate::types::FieldType;

/// Reference to field `index` of record `R`, which has Rust type `T`.
pub struct ColumnRef<R, T> {
    index: usize,
    name: &'static str,
    _marker: PhantomData<fn() -> (R, T)>,
}

impl<R, T> ColumnRef<R, T> {
    /// Creates a reference. Used by the `record!` macro.
    #[doc(hidden)]
    pub const fn new(index: usize, name: &'static str) -> Self {
        Self {
            index,
            name,
            _marker: PhantomData,
        }
    }

    /// Returns the field position in declaration order.
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Returns the field name, which is also the column name.
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<R: Record, T: Field> ColumnRef<R, T> {
    /// Resolves the reference to its declaration.
    pub fn resolve(&self) -> ResolvedColumn {
        ResolvedColumn {
            record: R::record_type(),
            name: self.name,
            field_type: T::field_type(),
        }
    }

    /// Returns the identity key of the referenced field.
    pub fn key(&self) -> ColumnKey {
        ColumnKey {
            record: TypeId::of::<R>(),
            index: self.index,
        }
    }

    /// Erases the field type.
    pub fn handle(&self) -> ColumnHandle {
        ColumnHandle {
            key: self.key(),
            name: self.name,
            descriptor: R::descriptor,
        }
    }
}

impl<R, T> Clone for ColumnRef<R, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R, T> Copy for ColumnRef<R, T> {}

impl<R, T> fmt::Debug for ColumnRef<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnRef")
            .field("record", &std::any::type_name::<R>())
            .field("index", &self.index)
            .field("name", &self.name)
            .finish()
    }
}

/// What a column reference points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedColumn {
    /// Owning record type.
    pub record: RecordTypeId,
    /// Field and column name.
    pub name: &'static str,
    /// Declared field type.
    pub field_type: FieldType,
}

/// Cheap identity of one field of one record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnKey {
    /// Owning record type.
    pub record: TypeId,
    /// Field position.
    pub index: usize,
}

/// A column reference with its field type erased.
#[derive(Clone, Copy)]
pub struct ColumnHandle {
    key: ColumnKey,
    name: &'static str,
    descriptor: DescriptorFn,
}

impl ColumnHandle {
    /// Returns the identity key.
    pub fn key(&self) -> ColumnKey {
        self.key
    }

    /// Returns the column name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the declared field type.
    ///
    /// Fails if the handle's position and name do not match a field of the
    /// owning record.
    pub fn field_type(&self) -> RecorderResult<&'static FieldType> {
        let descriptor = (self.descriptor)();
        descriptor
            .fields
            .get(self.key.index)
            .filter(|field| field.name == self.name)
            .map(|field| &field.field_type)
            .ok_or_else(|| RecorderError::UnknownColumn {
                record: descriptor.type_id.to_string(),
                column: self.name.to_string(),
                index: self.key.index,
            })
    }

    /// Returns the owning record type.
    pub fn record(&self) -> &'static RecordTypeId {
        &(self.descriptor)().type_id
    }
}

impl PartialEq for ColumnHandle {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ColumnHandle {}

impl fmt::Debug for ColumnHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.record().simple_name(), self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{record, PrimaryKey};

    record! {
        pub struct Account {
            pub id: PrimaryKey<i64>,
            pub email: String [unique],
            pub balance: f64,
        }
    }

    record! {
        pub struct Ledger {
            pub id: PrimaryKey<i64>,
            pub balance: f64,
        }
    }

    #[test]
    fn test_resolution_is_stable() {
        let first = Account::email.resolve();
        let second = Account::email.resolve();
        assert_eq!(first, second);
        assert_eq!(first.name, "email");
        assert_eq!(first.record, Account::record_type());
        assert_eq!(first.field_type.to_string(), "String");
    }

    #[test]
    fn test_keys_distinguish_records() {
        assert_eq!(Account::balance.key(), Account::balance.key());
        assert_ne!(Account::balance.key(), Account::email.key());
        // Same name and type, different record
        assert_ne!(Account::balance.key(), Ledger::balance.key());
    }

    #[test]
    fn test_handle() {
        let handle = Account::balance.handle();
        assert_eq!(handle.name(), "balance");
        assert_eq!(handle.field_type().unwrap().to_string(), "f64");
        assert_eq!(handle.record(), &Account::record_type());
        assert_eq!(format!("{:?}", handle), "Account.balance");
        assert_eq!(handle, Account::balance.handle());
    }

    #[test]
    fn test_hand_built_reference_out_of_range() {
        let stray: ColumnRef<Ledger, f64> = ColumnRef::new(7, "balance");
        let err = stray.handle().field_type().unwrap_err();
        match err {
            RecorderError::UnknownColumn { column, index, .. } => {
                assert_eq!(column, "balance");
                assert_eq!(index, 7);
            }
            other => panic!("unexpected error: {other}"),
        }

        // In range but naming another field
        let crossed: ColumnRef<Ledger, f64> = ColumnRef::new(0, "balance");
        assert!(crossed.handle().field_type().is_err());
    }
}
