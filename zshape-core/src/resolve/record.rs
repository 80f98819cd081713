use std::borrow::Cow;

use super::TypeHandle;
use crate::{
    DynamicValue, Error, MapContext, NativeType, Reflect, Reflected, Result, Value,
};

/// An instance of a synthesized type, backed by its field values.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedRecord {
    ty: TypeHandle,
    names: Vec<String>,
    values: Vec<Value>,
}

impl SynthesizedRecord {
    pub(crate) fn new(ty: TypeHandle, values: Vec<Value>) -> Self {
        let names = ty.property_names();

        Self { ty, names, values }
    }

    /// What the parameterless constructor of `ty` creates.
    pub(crate) fn with_defaults(ty: TypeHandle) -> Self {
        let values = ty
            .fields()
            .iter()
            .map(|(_, field)| field.default_value())
            .collect();

        Self::new(ty, values)
    }

    /// Build an instance of `ty` from the properties of `value`.
    ///
    /// Properties `ty` does not declare are ignored; declared properties missing from `value`
    /// keep their default.
    pub fn from_dynamic(ty: TypeHandle, value: &DynamicValue, cx: &mut MapContext<'_>) -> Result<Self> {
        let Some(properties) = value.properties() else {
            return Err(Error::NotARecord {
                type_name: ty.full_name(),
            });
        };

        let values = ty
            .fields()
            .iter()
            .map(|(name, field)| match properties.value(name) {
                Some(value) => field.accept(value.clone(), cx),
                None => Ok(field.default_value()),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(ty, values))
    }

    /// The instance's type.
    pub fn handle(&self) -> &TypeHandle {
        &self.ty
    }

    /// The value of the field named `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let index = self.names.iter().position(|n| n == name)?;

        self.values.get(index)
    }

    /// Set the field named `name`, converting scalars to the field's type.
    ///
    /// Properties of anonymous types are read-only.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let Some(index) = self.names.iter().position(|n| n == name) else {
            return Err(Error::UnknownProperty {
                type_name: self.ty.full_name(),
                property: name.into(),
            });
        };
        if self.ty.is_anonymous() {
            return Err(Error::ReadOnlyProperty {
                type_name: self.ty.full_name(),
                property: name.into(),
            });
        }

        let value = value.into();
        self.values[index] = match (self.ty.fields().get(index), &value) {
            (Some((_, TypeHandle::Scalar(kind))), Value::Scalar(scalar)) => {
                Value::Scalar(scalar.convert_to(*kind)?)
            }
            _ => value,
        };

        Ok(())
    }

    /// Fields and values in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.names.iter().map(String::as_str).zip(&self.values)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the type has no fields.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Reflect for SynthesizedRecord {
    fn native_type() -> NativeType {
        NativeType::object::<SynthesizedRecord>()
    }

    fn runtime_type(&self) -> NativeType {
        self.ty.native_type()
    }

    fn reflect(&self) -> Reflected<'_> {
        Reflected::Record(
            self.names
                .iter()
                .zip(&self.values)
                .map(|(name, value)| (Cow::Owned(name.clone()), value as &dyn Reflect))
                .collect(),
        )
    }
}
