use std::{
    any::{Any, TypeId},
    borrow::Cow,
    collections::HashMap,
    sync::Arc,
};

use crate::{
    DynamicValue, Error, NativeType, ObjectMapper, PropertySet, Record, Result, Scalar, Value,
};

/// State of one conversion from dynamic values to native values.
///
/// Handed to every [`FromDynamic`](crate::FromDynamic) implementation. Keeps track of shared
/// dynamic values so that one `Arc<DynamicValue>` turns into one shared native instance.
pub struct MapContext<'m> {
    mapper: &'m ObjectMapper,
    shared: HashMap<(usize, TypeId), Box<dyn Any>>,
    in_progress: Vec<usize>,
}

impl<'m> MapContext<'m> {
    /// A fresh context using `mapper`'s policy and coercions.
    pub fn new(mapper: &'m ObjectMapper) -> Self {
        Self {
            mapper,
            shared: HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    /// The mapper this context belongs to.
    pub fn mapper(&self) -> &'m ObjectMapper {
        self.mapper
    }

    /// Convert `value` to the scalar kind of `target`.
    ///
    /// Wrapped dynamic values are unwrapped. The coercion registered for `target`'s full name
    /// runs first, then the built-in conversion.
    pub fn scalar(&self, value: &Value, target: &NativeType) -> Result<Scalar> {
        let Some(kind) = target.scalar_kind() else {
            return Err(Self::mismatch(value, target.full_name()));
        };
        let scalar = match value {
            Value::Scalar(scalar) => scalar,
            Value::Dynamic(dynamic) => match dynamic.wrapped_value() {
                Some(wrapped) => return self.scalar(wrapped, target),
                None => return Err(Self::mismatch(value, target.full_name())),
            },
            _ => return Err(Self::mismatch(value, target.full_name())),
        };

        match self.mapper.coercions().apply(&target.full_name(), scalar) {
            Some(coerced) => coerced?.convert_to(kind),
            None => scalar.convert_to(kind),
        }
    }

    /// The elements of a collection value.
    ///
    /// Accepts arrays, wrapped arrays, byte scalars and records (whose property values are taken
    /// in order).
    pub fn elements<'v>(&self, value: &'v Value, target: &str) -> Result<Cow<'v, [Value]>> {
        match value {
            Value::Array(items) => Ok(Cow::Borrowed(items)),
            Value::Scalar(Scalar::Bytes(bytes)) => {
                Ok(Cow::Owned(bytes.iter().map(|b| Value::from(*b)).collect()))
            }
            Value::Dynamic(dynamic) => {
                if let Some(wrapped) = dynamic.wrapped_value() {
                    return self.elements(wrapped, target);
                }
                match dynamic.properties() {
                    Some(properties) => Ok(Cow::Owned(
                        properties.iter().map(|p| p.value().clone()).collect(),
                    )),
                    None => Err(Self::mismatch(value, target)),
                }
            }
            _ => Err(Self::mismatch(value, target)),
        }
    }

    /// The properties of a record value.
    pub fn entries<'v>(&self, value: &'v Value, target: &str) -> Result<&'v PropertySet> {
        match value {
            Value::Dynamic(dynamic) => {
                if let Some(wrapped) = dynamic.wrapped_value() {
                    return self.entries(wrapped, target);
                }
                dynamic
                    .properties()
                    .ok_or_else(|| Self::mismatch(value, target))
            }
            _ => Err(Self::mismatch(value, target)),
        }
    }

    /// Build the record `T` from a property value.
    pub fn record<T: Record>(&mut self, value: &Value) -> Result<T> {
        match value {
            Value::Dynamic(dynamic) => self.record_from(dynamic),
            _ => Err(Error::NotARecord {
                type_name: T::native_type().full_name(),
            }),
        }
    }

    /// Build the record `T` from a dynamic value.
    pub fn record_from<T: Record>(&mut self, value: &DynamicValue) -> Result<T> {
        if let Some(wrapped) = value.wrapped_value() {
            return self.record(wrapped);
        }
        let mut target = T::default();
        self.populate(&mut target, value)?;

        Ok(target)
    }

    /// Set the mapped properties of `target` present in `value`.
    ///
    /// Properties missing from `value` keep their current value.
    pub fn populate<T: Record>(&mut self, target: &mut T, value: &DynamicValue) -> Result<()> {
        let native = target.runtime_type();
        let Some(properties) = value.properties() else {
            return Err(Error::NotARecord {
                type_name: native.full_name(),
            });
        };

        for property in self.mapper.mapped_properties(&native).iter() {
            let Some(value) = properties.value(property.name()) else {
                continue;
            };
            if !target.set_property(property.name(), value, self)? {
                warn!(
                    "`{}` has no settable property `{}`",
                    native.full_name(),
                    property.name()
                );
            }
        }

        Ok(())
    }

    /// Build a shared native value from `value`, once per `Arc` and target type.
    pub fn shared<S, F>(&mut self, value: &Arc<DynamicValue>, build: F) -> Result<S>
    where
        S: Clone + 'static,
        F: FnOnce(&DynamicValue, &mut Self) -> Result<S>,
    {
        let address = Arc::as_ptr(value) as usize;
        let key = (address, TypeId::of::<S>());
        if let Some(built) = self.shared.get(&key).and_then(|b| b.downcast_ref::<S>()) {
            return Ok(built.clone());
        }
        if self.in_progress.contains(&address) {
            return Err(Error::UnsupportedGraphCycle {
                at: value
                    .ty()
                    .map(|ty| ty.full_name())
                    .unwrap_or_else(|| "DynamicValue".into()),
            });
        }

        self.in_progress.push(address);
        let built = build(value, self);
        self.in_progress.pop();
        let built = built?;
        self.shared.insert(key, Box::new(built.clone()));

        Ok(built)
    }

    /// The error for a value that does not fit `target`.
    pub fn mismatch(value: &Value, target: impl Into<String>) -> Error {
        let from = match value {
            Value::Null => "null".to_string(),
            Value::Scalar(scalar) => scalar.kind().name().to_string(),
            Value::Array(_) => "array".to_string(),
            Value::Dynamic(dynamic) => match dynamic.ty() {
                Some(ty) => ty.full_name(),
                None if dynamic.is_record() => "record".to_string(),
                None => "DynamicValue".to_string(),
            },
        };

        Error::ScalarConversion {
            from,
            to: target.into(),
        }
    }
}

impl core::fmt::Debug for MapContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MapContext")
            .field("mapper", &self.mapper)
            .field("shared", &self.shared.len())
            .finish()
    }
}
