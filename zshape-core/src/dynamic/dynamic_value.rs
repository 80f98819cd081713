use super::{Property, PropertySet, Value};
use crate::{Error, Result, TypeDescriptor};

/// A value detached from any native type: null, a wrapped primitive/array or a record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DynamicValue {
    ty: Option<TypeDescriptor>,
    body: Body,
}

#[derive(Debug, Clone, PartialEq, Default)]
enum Body {
    #[default]
    Null,
    Wrapped(Property),
    Record(PropertySet),
}

impl DynamicValue {
    /// A null value.
    pub fn null() -> Self {
        Self::default()
    }

    /// An empty record.
    pub fn record() -> Self {
        Self {
            ty: None,
            body: Body::Record(PropertySet::new()),
        }
    }

    /// A wrapped value: a single unnamed property.
    pub fn wrapped(value: impl Into<Value>) -> Self {
        Self {
            ty: None,
            body: Body::Wrapped(Property::unnamed(value)),
        }
    }

    /// Annotate with a type.
    pub fn with_type(mut self, ty: TypeDescriptor) -> Self {
        self.ty = Some(ty);
        self
    }

    /// The type annotation.
    pub fn ty(&self) -> Option<&TypeDescriptor> {
        self.ty.as_ref()
    }

    /// Set or clear the type annotation.
    pub fn set_type(&mut self, ty: Option<TypeDescriptor>) {
        self.ty = ty;
    }

    /// Whether the value is null.
    pub fn is_null(&self) -> bool {
        matches!(self.body, Body::Null)
    }

    /// Whether the value wraps a single unnamed property.
    pub fn is_wrapped(&self) -> bool {
        matches!(self.body, Body::Wrapped(_))
    }

    /// Whether the value is a record.
    pub fn is_record(&self) -> bool {
        matches!(self.body, Body::Record(_))
    }

    /// The wrapped value.
    pub fn wrapped_value(&self) -> Option<&Value> {
        match &self.body {
            Body::Wrapped(property) => Some(property.value()),
            _ => None,
        }
    }

    /// The unnamed property of a wrapped value.
    pub fn wrapped_property(&self) -> Option<&Property> {
        match &self.body {
            Body::Wrapped(property) => Some(property),
            _ => None,
        }
    }

    /// Wrap `value`.
    ///
    /// Fails with [`Error::ShapeConflict`] if the value is a non-empty record.
    pub fn set_wrapped(&mut self, value: impl Into<Value>) -> Result<()> {
        if let Body::Record(properties) = &self.body {
            if !properties.is_empty() {
                return Err(Error::ShapeConflict(
                    "cannot wrap a value into a record with named properties",
                ));
            }
        }
        self.body = Body::Wrapped(Property::unnamed(value));

        Ok(())
    }

    /// The properties of a record.
    pub fn properties(&self) -> Option<&PropertySet> {
        match &self.body {
            Body::Record(properties) => Some(properties),
            _ => None,
        }
    }

    /// The properties of a record, mutably.
    pub fn properties_mut(&mut self) -> Option<&mut PropertySet> {
        match &mut self.body {
            Body::Record(properties) => Some(properties),
            _ => None,
        }
    }

    /// Add a named property.
    ///
    /// Fails with [`Error::ShapeConflict`] unless this is a record, or with
    /// [`Error::PropertyNameCollision`] if the name is taken.
    pub fn insert(&mut self, property: Property) -> Result<()> {
        match &mut self.body {
            Body::Record(properties) => properties.insert(property),
            Body::Wrapped(_) => Err(Error::ShapeConflict(
                "cannot add a named property to a wrapped value",
            )),
            Body::Null => Err(Error::ShapeConflict(
                "cannot add a named property to a null value",
            )),
        }
    }

    /// Builder variant of [`DynamicValue::insert`].
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        self.insert(Property::new(name, value))?;

        Ok(self)
    }

    /// The value of the record property named `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties()?.value(name)
    }

    /// Consume into the record's properties.
    pub fn into_properties(self) -> Option<PropertySet> {
        match self.body {
            Body::Record(properties) => Some(properties),
            _ => None,
        }
    }
}

impl From<PropertySet> for DynamicValue {
    fn from(properties: PropertySet) -> Self {
        Self {
            ty: None,
            body: Body::Record(properties),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_are_exclusive() {
        let mut wrapped = DynamicValue::wrapped(42);
        let err = wrapped.insert(Property::new("Id", 1)).unwrap_err();
        assert!(matches!(err, Error::ShapeConflict(_)));
        assert_eq!(wrapped.wrapped_value(), Some(&Value::from(42)));

        let mut null = DynamicValue::null();
        assert!(null.insert(Property::new("Id", 1)).is_err());
        null.set_wrapped("x").unwrap();
        assert!(null.is_wrapped());

        let mut record = DynamicValue::record().with_property("Id", 1).unwrap();
        assert!(record.set_wrapped(1).is_err());
        assert_eq!(record.get("Id"), Some(&Value::from(1)));

        let mut empty = DynamicValue::record();
        empty.set_wrapped(vec![Value::from(1), Value::from(2)]).unwrap();
        assert_eq!(empty.wrapped_property().map(Property::name), Some(""));
    }
}
