//! Rust types that can be record fields.
//!
//! A [`Field`] knows its static [`FieldType`] and how to convert itself to
//! and from a driver [`Value`]. Scalars convert strictly: an `i32` field
//! only accepts [`Value::Int`]. Wrapper types delegate to their inner type.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use recorder_common::{OpaqueType, OpaqueValue, RecorderError, RecorderResult, Value};

use crate::record::{DescriptorFn, Record};
use crate::types::{FieldType, ScalarType, Wrapper};

/// A type usable as a record field.
pub trait Field: Sized + Send + Sync + 'static {
    /// Returns the declared type.
    fn field_type() -> FieldType;

    /// Converts the field to a driver value.
    fn to_value(&self) -> Value;

    /// Builds the field from a driver value.
    fn from_value(value: Value) -> RecorderResult<Self>;

    /// Adds the descriptors of records this field refers to.
    fn foreign_targets(_targets: &mut Vec<DescriptorFn>) {}
}

macro_rules! scalar_field {
    ($ty:ty, $scalar:ident, $variant:ident) => {
        impl Field for $ty {
            fn field_type() -> FieldType {
                FieldType::Scalar(ScalarType::$scalar)
            }

            fn to_value(&self) -> Value {
                Value::$variant(*self)
            }

            fn from_value(value: Value) -> RecorderResult<Self> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(RecorderError::type_mismatch(
                        ScalarType::$scalar.to_string(),
                        other.kind(),
                    )),
                }
            }
        }
    };
}

scalar_field!(bool, Bool, Bool);
scalar_field!(i8, Byte, Byte);
scalar_field!(i16, Short, Short);
scalar_field!(i32, Int, Int);
scalar_field!(i64, Long, Long);
scalar_field!(f32, Float, Float);
scalar_field!(f64, Double, Double);

impl Field for String {
    fn field_type() -> FieldType {
        FieldType::Scalar(ScalarType::Text)
    }

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> RecorderResult<Self> {
        match value {
            Value::Text(v) => Ok(v),
            other => Err(RecorderError::type_mismatch("String", other.kind())),
        }
    }
}

impl<T: Field> Field for Option<T> {
    fn field_type() -> FieldType {
        FieldType::wrap(Wrapper::Optional, T::field_type())
    }

    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> RecorderResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn foreign_targets(targets: &mut Vec<DescriptorFn>) {
        T::foreign_targets(targets);
    }
}

/// A primary key.
///
/// An *auto* key has no value yet; the database assigns one on insert when
/// the column is generated.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryKey<T> {
    value: Option<T>,
}

impl<T> PrimaryKey<T> {
    /// A key to be assigned by the database.
    pub const fn auto() -> Self {
        Self { value: None }
    }

    /// A key with a known value.
    pub const fn of(value: T) -> Self {
        Self { value: Some(value) }
    }

    /// Returns the key value, if assigned.
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Returns true if no value has been assigned.
    pub fn is_auto(&self) -> bool {
        self.value.is_none()
    }

    /// Returns the key value, if assigned.
    pub fn into_inner(self) -> Option<T> {
        self.value
    }
}

impl<T> Default for PrimaryKey<T> {
    fn default() -> Self {
        Self::auto()
    }
}

impl<T> From<T> for PrimaryKey<T> {
    fn from(value: T) -> Self {
        Self::of(value)
    }
}

impl<T: Field> Field for PrimaryKey<T> {
    fn field_type() -> FieldType {
        FieldType::wrap(Wrapper::PrimaryKey, T::field_type())
    }

    fn to_value(&self) -> Value {
        match &self.value {
            Some(inner) => inner.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> RecorderResult<Self> {
        match value {
            Value::Null => Ok(Self::auto()),
            other => T::from_value(other).map(Self::of),
        }
    }
}

/// A reference to another record by its primary key.
///
/// The key is kept as the raw driver value of the target's primary key
/// column.
pub struct ForeignKey<R> {
    key: Value,
    _target: PhantomData<fn() -> R>,
}

impl<R: Record> ForeignKey<R> {
    /// Refers to the record with the given primary key value.
    pub fn new(key: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            _target: PhantomData,
        }
    }

    /// Refers to an existing record.
    ///
    /// Fails if the record type has no primary key or the record's key has
    /// not been assigned yet.
    pub fn to(record: &R) -> RecorderResult<Self> {
        let descriptor = R::descriptor();
        let index = descriptor
            .primary_key_index()
            .ok_or_else(|| RecorderError::MissingPrimaryKey {
                record: descriptor.type_id.to_string(),
            })?;
        let key = record
            .to_values()
            .into_iter()
            .nth(index)
            .filter(|key| !key.is_null())
            .ok_or_else(|| RecorderError::MissingValue {
                field: descriptor.fields[index].name.to_string(),
            })?;
        Ok(Self::new(key))
    }

    /// Returns the referenced key value.
    pub fn key(&self) -> &Value {
        &self.key
    }
}

impl<R> Clone for ForeignKey<R> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            _target: PhantomData,
        }
    }
}

impl<R> PartialEq for ForeignKey<R> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<R> fmt::Debug for ForeignKey<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ForeignKey<{}>({:?})", std::any::type_name::<R>(), self.key)
    }
}

impl<R: Record> Field for ForeignKey<R> {
    fn field_type() -> FieldType {
        FieldType::wrap(Wrapper::ForeignKey, FieldType::Record(R::record_type()))
    }

    fn to_value(&self) -> Value {
        self.key.clone()
    }

    fn from_value(value: Value) -> RecorderResult<Self> {
        Ok(Self::new(value))
    }

    fn foreign_targets(targets: &mut Vec<DescriptorFn>) {
        targets.push(R::descriptor);
    }
}

/// A driver-native object stored in one column.
///
/// Two opaque fields are equal when they share the same allocation.
pub struct Opaque<T>(pub Arc<T>);

impl<T> Opaque<T> {
    /// Wraps an object.
    pub fn new(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Returns the wrapped object.
    pub fn get(&self) -> &T {
        &self.0
    }
}

impl<T> Clone for Opaque<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> PartialEq for Opaque<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> fmt::Debug for Opaque<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opaque<{}>@{:p}", std::any::type_name::<T>(), Arc::as_ptr(&self.0))
    }
}

impl<T: Any + Send + Sync> Field for Opaque<T> {
    fn field_type() -> FieldType {
        FieldType::Scalar(ScalarType::Opaque(OpaqueType::of::<T>()))
    }

    fn to_value(&self) -> Value {
        Value::Opaque(OpaqueValue::from_arc(Arc::clone(&self.0)))
    }

    fn from_value(value: Value) -> RecorderResult<Self> {
        let expected = || OpaqueType::of::<T>().to_string();
        match value {
            Value::Opaque(opaque) => opaque
                .downcast::<T>()
                .map(Self)
                .ok_or_else(|| RecorderError::type_mismatch(expected(), opaque.opaque_type().name())),
            other => Err(RecorderError::type_mismatch(expected(), other.kind())),
        }
    }
}
