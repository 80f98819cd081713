use std::{
    borrow::Cow,
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque},
    hash::Hash,
    rc::Rc,
    sync::Arc,
};

use indexmap::IndexMap;

use super::{FromDynamic, Reflect, Reflected};
use crate::{
    DynamicValue, MapContext, NativeType, NativeTypeRef, Result, Scalar, ScalarKind, Value,
};

macro_rules! reflect_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn native_type() -> NativeType {
                    NativeType::scalar::<$ty>(ScalarKind::$variant)
                }

                fn runtime_type(&self) -> NativeType {
                    Self::native_type()
                }

                fn reflect(&self) -> Reflected<'_> {
                    Reflected::Scalar(Scalar::$variant(self.clone()))
                }
            }

            impl FromDynamic for $ty {
                fn from_dynamic(value: &Value, cx: &mut MapContext<'_>) -> Result<Self> {
                    match cx.scalar(value, &Self::native_type())? {
                        Scalar::$variant(v) => Ok(v),
                        other => Err(MapContext::mismatch(
                            &Value::Scalar(other),
                            ScalarKind::$variant.name(),
                        )),
                    }
                }
            }
        )*
    };
}

reflect_scalar! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    i128 => I128,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    f32 => F32,
    f64 => F64,
    char => Char,
    String => String,
}

/// A byte sequence that maps to a single [`ScalarKind::Bytes`] scalar rather than an array of
/// `u8`s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bytes(pub Vec<u8>);

impl From<Vec<u8>> for Bytes {
    fn from(bytes: Vec<u8>) -> Self {
        Bytes(bytes)
    }
}

impl From<Bytes> for Vec<u8> {
    fn from(bytes: Bytes) -> Self {
        bytes.0
    }
}

impl core::ops::Deref for Bytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl Reflect for Bytes {
    fn native_type() -> NativeType {
        NativeType::scalar::<Bytes>(ScalarKind::Bytes)
    }

    fn runtime_type(&self) -> NativeType {
        Self::native_type()
    }

    fn reflect(&self) -> Reflected<'_> {
        Reflected::Scalar(Scalar::Bytes(self.0.clone()))
    }
}

impl FromDynamic for Bytes {
    fn from_dynamic(value: &Value, cx: &mut MapContext<'_>) -> Result<Self> {
        if let Value::Array(items) = value {
            return items
                .iter()
                .map(|item| u8::from_dynamic(item, cx))
                .collect::<Result<Vec<_>>>()
                .map(Bytes);
        }
        match cx.scalar(value, &Self::native_type())? {
            Scalar::Bytes(bytes) => Ok(Bytes(bytes)),
            other => Err(MapContext::mismatch(&Value::Scalar(other), "Bytes")),
        }
    }
}

/// The native type values of `kind` map from.
pub fn scalar_native_type(kind: ScalarKind) -> NativeType {
    match kind {
        ScalarKind::Bool => bool::native_type(),
        ScalarKind::I8 => i8::native_type(),
        ScalarKind::I16 => i16::native_type(),
        ScalarKind::I32 => i32::native_type(),
        ScalarKind::I64 => i64::native_type(),
        ScalarKind::I128 => i128::native_type(),
        ScalarKind::U8 => u8::native_type(),
        ScalarKind::U16 => u16::native_type(),
        ScalarKind::U32 => u32::native_type(),
        ScalarKind::U64 => u64::native_type(),
        ScalarKind::U128 => u128::native_type(),
        ScalarKind::F32 => f32::native_type(),
        ScalarKind::F64 => f64::native_type(),
        ScalarKind::Char => char::native_type(),
        ScalarKind::String => String::native_type(),
        ScalarKind::Bytes => Bytes::native_type(),
    }
}

impl Reflect for Scalar {
    fn native_type() -> NativeType {
        NativeType::object::<Scalar>()
    }

    fn runtime_type(&self) -> NativeType {
        scalar_native_type(self.kind())
    }

    fn reflect(&self) -> Reflected<'_> {
        Reflected::Scalar(self.clone())
    }
}

impl FromDynamic for Scalar {
    fn from_dynamic(value: &Value, cx: &mut MapContext<'_>) -> Result<Self> {
        match value {
            Value::Scalar(scalar) => Ok(scalar.clone()),
            Value::Dynamic(dynamic) => match dynamic.wrapped_value() {
                Some(wrapped) => Self::from_dynamic(wrapped, cx),
                None => Err(MapContext::mismatch(value, "Scalar")),
            },
            _ => Err(MapContext::mismatch(value, "Scalar")),
        }
    }
}

impl Reflect for Value {
    fn native_type() -> NativeType {
        NativeType::object::<Value>()
    }

    fn runtime_type(&self) -> NativeType {
        match self {
            Value::Scalar(scalar) => scalar.runtime_type(),
            _ => Self::native_type(),
        }
    }

    fn reflect(&self) -> Reflected<'_> {
        match self {
            Value::Null => Reflected::Null,
            Value::Scalar(scalar) => Reflected::Scalar(scalar.clone()),
            Value::Dynamic(dynamic) => Reflected::Dynamic(dynamic.clone()),
            Value::Array(items) => {
                Reflected::Sequence(items.iter().map(|item| item as &dyn Reflect).collect())
            }
        }
    }
}

impl FromDynamic for Value {
    fn from_dynamic(value: &Value, _cx: &mut MapContext<'_>) -> Result<Self> {
        Ok(value.clone())
    }
}

impl Reflect for DynamicValue {
    fn native_type() -> NativeType {
        NativeType::object::<DynamicValue>()
    }

    fn runtime_type(&self) -> NativeType {
        Self::native_type()
    }

    fn reflect(&self) -> Reflected<'_> {
        Reflected::Dynamic(Arc::new(self.clone()))
    }
}

impl FromDynamic for DynamicValue {
    fn from_dynamic(value: &Value, _cx: &mut MapContext<'_>) -> Result<Self> {
        Ok(match value {
            Value::Null => DynamicValue::null(),
            Value::Dynamic(dynamic) => DynamicValue::clone(dynamic),
            other => DynamicValue::wrapped(other.clone()),
        })
    }

    fn from_dynamic_value(value: &DynamicValue, _cx: &mut MapContext<'_>) -> Result<Self> {
        Ok(value.clone())
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn native_type() -> NativeType {
        T::native_type()
    }

    fn runtime_type(&self) -> NativeType {
        match self {
            Some(value) => value.runtime_type(),
            None => T::native_type(),
        }
    }

    fn reflect(&self) -> Reflected<'_> {
        match self {
            Some(value) => Reflected::Transparent(value),
            None => Reflected::Null,
        }
    }
}

impl<T: FromDynamic> FromDynamic for Option<T> {
    fn from_dynamic(value: &Value, cx: &mut MapContext<'_>) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            Value::Dynamic(dynamic) if dynamic.is_null() => Ok(None),
            value => T::from_dynamic(value, cx).map(Some),
        }
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn native_type() -> NativeType {
        T::native_type()
    }

    fn runtime_type(&self) -> NativeType {
        (**self).runtime_type()
    }

    fn reflect(&self) -> Reflected<'_> {
        Reflected::Transparent(&**self)
    }
}

impl<T: FromDynamic> FromDynamic for Box<T> {
    fn from_dynamic(value: &Value, cx: &mut MapContext<'_>) -> Result<Self> {
        T::from_dynamic(value, cx).map(Box::new)
    }

    fn from_dynamic_value(value: &DynamicValue, cx: &mut MapContext<'_>) -> Result<Self> {
        T::from_dynamic_value(value, cx).map(Box::new)
    }
}

macro_rules! reflect_shared {
    ($($ptr:ident),*) => {
        $(
            impl<T: Reflect> Reflect for $ptr<T> {
                fn native_type() -> NativeType {
                    T::native_type()
                }

                fn runtime_type(&self) -> NativeType {
                    (**self).runtime_type()
                }

                fn reflect(&self) -> Reflected<'_> {
                    Reflected::Transparent(&**self)
                }
            }

            impl<T: FromDynamic + 'static> FromDynamic for $ptr<T> {
                fn from_dynamic(value: &Value, cx: &mut MapContext<'_>) -> Result<Self> {
                    match value {
                        Value::Dynamic(dynamic) => cx.shared(dynamic, |dynamic, cx| {
                            T::from_dynamic_value(dynamic, cx).map($ptr::new)
                        }),
                        value => T::from_dynamic(value, cx).map($ptr::new),
                    }
                }
            }
        )*
    };
}

reflect_shared!(Arc, Rc);

macro_rules! reflect_sequence {
    ($($coll:ident $name:literal $(: $bound:path)*),* $(,)?) => {
        $(
            impl<T: Reflect $(+ $bound)*> Reflect for $coll<T> {
                fn native_type() -> NativeType {
                    NativeType::sequence::<Self>($name, NativeTypeRef::of::<T>())
                }

                fn runtime_type(&self) -> NativeType {
                    Self::native_type()
                }

                fn reflect(&self) -> Reflected<'_> {
                    Reflected::Sequence(self.iter().map(|item| item as &dyn Reflect).collect())
                }

                fn reflect_properties(&self) -> Vec<(Cow<'static, str>, &dyn Reflect)> {
                    self.iter()
                        .enumerate()
                        .map(|(i, item)| (Cow::Owned(i.to_string()), item as &dyn Reflect))
                        .collect()
                }
            }

            impl<T: FromDynamic $(+ $bound)*> FromDynamic for $coll<T> {
                fn from_dynamic(value: &Value, cx: &mut MapContext<'_>) -> Result<Self> {
                    let elements = cx.elements(value, $name)?;
                    elements.iter().map(|item| T::from_dynamic(item, cx)).collect()
                }
            }
        )*
    };
}

reflect_sequence! {
    Vec "Vec",
    VecDeque "VecDeque",
    BTreeSet "BTreeSet": Ord,
    HashSet "HashSet": Eq: Hash,
}

macro_rules! reflect_map {
    ($($map:ident $name:literal),* $(,)?) => {
        $(
            impl<V: Reflect> Reflect for $map<String, V> {
                fn native_type() -> NativeType {
                    NativeType::record::<Self>($name).with_generic_arguments(vec![
                        NativeTypeRef::of::<String>(),
                        NativeTypeRef::of::<V>(),
                    ])
                }

                fn runtime_type(&self) -> NativeType {
                    Self::native_type()
                }

                fn reflect(&self) -> Reflected<'_> {
                    Reflected::Record(
                        self.iter()
                            .map(|(key, value)| (Cow::Owned(key.clone()), value as &dyn Reflect))
                            .collect(),
                    )
                }
            }

            impl<V: FromDynamic> FromDynamic for $map<String, V> {
                fn from_dynamic(value: &Value, cx: &mut MapContext<'_>) -> Result<Self> {
                    let entries = cx.entries(value, $name)?;
                    entries
                        .iter()
                        .map(|property| {
                            V::from_dynamic(property.value(), cx)
                                .map(|v| (property.name().to_owned(), v))
                        })
                        .collect()
                }
            }
        )*
    };
}

reflect_map! {
    HashMap "HashMap",
    BTreeMap "BTreeMap",
    IndexMap "IndexMap",
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NativeKind, ObjectMapper};

    #[test]
    fn wrappers_are_transparent() {
        assert_eq!(Option::<i32>::native_type().name(), "i32");
        assert_eq!(Arc::<Box<String>>::native_type().name(), "String");

        let value = Some(Box::new(5u8));
        assert!(matches!(value.reflect(), Reflected::Transparent(_)));
        assert!(matches!(None::<u8>.reflect(), Reflected::Null));
    }

    #[test]
    fn collections_are_sequences() {
        let native = Vec::<i64>::native_type();
        assert!(matches!(native.kind(), NativeKind::Sequence(_)));
        assert_eq!(native.full_name(), "Vec<i64>");

        let set = BTreeSet::from([3, 1, 2]);
        match set.reflect() {
            Reflected::Sequence(items) => assert_eq!(items.len(), 3),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(set.reflect_properties()[0].0, "0");
    }

    #[test]
    fn scalars_convert_on_the_way_in() {
        let mapper = ObjectMapper::new();
        let mut cx = MapContext::new(&mapper);

        assert_eq!(u16::from_dynamic(&Value::from(12i64), &mut cx).unwrap(), 12);
        assert_eq!(
            String::from_dynamic(&Value::from('x'), &mut cx).unwrap(),
            "x"
        );
        assert_eq!(
            Bytes::from_dynamic(&Value::Array(vec![1u8.into(), 2u8.into()]), &mut cx).unwrap(),
            Bytes(vec![1, 2])
        );
        assert!(i8::from_dynamic(&Value::Null, &mut cx).is_err());
        assert_eq!(Option::<i8>::from_dynamic(&Value::Null, &mut cx).unwrap(), None);
    }
}
