//! Native value inspection: how native values expose their shape and data to the mapper.
//!
//! Implement these traits with `#[derive(Reflect)]` for structs; primitives, collections and
//! smart pointers are covered here.

use std::{any::Any, borrow::Cow, sync::Arc};

use crate::{DynamicValue, MapContext, NativeType, Result, Scalar, Value};

mod impls;
pub use impls::{scalar_native_type, Bytes};
#[cfg(any(feature = "chrono", feature = "uuid"))]
mod external;

/// Derive [`Reflect`], [`FromDynamic`] and [`Record`] for a struct.
pub use zshape_macros::Reflect;

/// A native value the mapper can inspect.
pub trait Reflect: Any {
    /// The static native type of `Self`.
    fn native_type() -> NativeType
    where
        Self: Sized;

    /// The native type of this particular value.
    ///
    /// Differs from [`Reflect::native_type`] for heterogeneous types such as [`Value`].
    fn runtime_type(&self) -> NativeType;

    /// This value's data.
    fn reflect(&self) -> Reflected<'_>;

    /// Named view of this value's members.
    ///
    /// Records return their properties. Collections return their elements named by position,
    /// which is what gets mapped when a [`MappingPolicy`](crate::MappingPolicy) asks for a
    /// collection to be mapped to a record.
    fn reflect_properties(&self) -> Vec<(Cow<'static, str>, &dyn Reflect)> {
        match self.reflect() {
            Reflected::Record(properties) => properties,
            _ => Vec::new(),
        }
    }
}

/// The data of a reflected value.
pub enum Reflected<'a> {
    /// No value.
    Null,
    /// A primitive.
    Scalar(Scalar),
    /// Collection elements in order.
    Sequence(Vec<&'a dyn Reflect>),
    /// Named property values in declaration order.
    Record(Vec<(Cow<'static, str>, &'a dyn Reflect)>),
    /// A value that maps exactly like the inner one (`Box`, `Arc`, ...).
    Transparent(&'a dyn Reflect),
    /// An already dynamic value.
    Dynamic(Arc<DynamicValue>),
}

impl core::fmt::Debug for Reflected<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Reflected::Null => f.write_str("Null"),
            Reflected::Scalar(s) => f.debug_tuple("Scalar").field(s).finish(),
            Reflected::Sequence(items) => write!(f, "Sequence({} items)", items.len()),
            Reflected::Record(properties) => f
                .debug_list()
                .entries(properties.iter().map(|(name, _)| name))
                .finish(),
            Reflected::Transparent(_) => f.write_str("Transparent"),
            Reflected::Dynamic(value) => f.debug_tuple("Dynamic").field(value).finish(),
        }
    }
}

/// A native value that can be built from a dynamic value.
pub trait FromDynamic: Sized {
    /// Build from a property value.
    fn from_dynamic(value: &Value, cx: &mut MapContext<'_>) -> Result<Self>;

    /// Build from a dynamic value.
    fn from_dynamic_value(value: &DynamicValue, cx: &mut MapContext<'_>) -> Result<Self> {
        if value.is_null() {
            return Self::from_dynamic(&Value::Null, cx);
        }
        match value.wrapped_value() {
            Some(wrapped) => Self::from_dynamic(wrapped, cx),
            None => Self::from_dynamic(&Value::Dynamic(Arc::new(value.clone())), cx),
        }
    }
}

/// A plain object: default-constructible with settable named properties.
pub trait Record: Reflect + FromDynamic + Default {
    /// Set the property named `name`.
    ///
    /// Returns `false` if there is no such property.
    fn set_property(&mut self, name: &str, value: &Value, cx: &mut MapContext<'_>)
        -> Result<bool>;
}

/// Address identifying a reflected value while it is borrowed.
pub(crate) fn address(value: &dyn Reflect) -> usize {
    value as *const dyn Reflect as *const () as usize
}
