use std::sync::Arc;

use super::DynamicValue;
use crate::Scalar;

/// The value of a [`Property`](super::Property).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// No value.
    #[default]
    Null,
    /// A primitive.
    Scalar(Scalar),
    /// A nested dynamic value. Identity is that of the `Arc`.
    Dynamic(Arc<DynamicValue>),
    /// An array of values.
    Array(Vec<Value>),
}

impl Value {
    /// Whether this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The scalar, if this is one.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// The nested dynamic value, if this is one.
    pub fn as_dynamic(&self) -> Option<&Arc<DynamicValue>> {
        match self {
            Value::Dynamic(value) => Some(value),
            _ => None,
        }
    }

    /// The elements, if this is an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Whether both values are the same shared dynamic value.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Dynamic(a), Value::Dynamic(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

macro_rules! value_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Scalar(v.into())
                }
            }
        )*
    };
}

value_from_scalar!(
    bool, i8, i16, i32, i64, i128, u8, u16, u32, u64, u128, f32, f64, char, String, &str, Vec<u8>,
    Scalar,
);

impl From<DynamicValue> for Value {
    fn from(value: DynamicValue) -> Self {
        Value::Dynamic(Arc::new(value))
    }
}

impl From<Arc<DynamicValue>> for Value {
    fn from(value: Arc<DynamicValue>) -> Self {
        Value::Dynamic(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}
