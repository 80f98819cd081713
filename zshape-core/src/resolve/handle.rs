use core::{
    fmt,
    hash::{Hash, Hasher},
};
use std::{any::Any, sync::Arc};

use crate::{
    reflect::scalar_native_type, ConstructorDescriptor, DynamicValue, Error, FieldDescriptor,
    FromDynamic, MapContext, Materialized, MemberDescriptor, NativeKey, NativeKind,
    NativeProperty, NativeType, NativeTypeRef, ObjectMapper, PropertyDescriptor, Reflect,
    Result, ScalarKind, SynthesizedRecord, TypeDescriptor, TypeGraph, Value, OBJECT_TYPE_NAME,
};

type Factory = fn(&DynamicValue, &mut MapContext<'_>) -> Result<Box<dyn Any>>;

/// A native type known to a [`TypeRegistry`](super::TypeRegistry).
pub struct NativeEntry {
    native: Arc<NativeType>,
    factory: Factory,
}

impl NativeEntry {
    /// The entry for `T`.
    pub fn of<T: Reflect + FromDynamic>() -> Self {
        fn build<T: FromDynamic + 'static>(
            value: &DynamicValue,
            cx: &mut MapContext<'_>,
        ) -> Result<Box<dyn Any>> {
            T::from_dynamic_value(value, cx).map(|v| Box::new(v) as Box<dyn Any>)
        }

        Self {
            native: Arc::new(T::native_type()),
            factory: build::<T>,
        }
    }

    /// The native type.
    pub fn native_type(&self) -> &NativeType {
        &self.native
    }

    /// Build an instance from `value`.
    pub fn build(&self, value: &DynamicValue, cx: &mut MapContext<'_>) -> Result<Box<dyn Any>> {
        (self.factory)(value, cx)
    }
}

impl fmt::Debug for NativeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NativeEntry")
            .field(&self.native.full_name())
            .finish()
    }
}

/// A type created at runtime for a shape no native type matches.
#[derive(Debug)]
pub struct SynthesizedType {
    key: NativeKey,
    name: String,
    namespace: Option<String>,
    fields: Vec<String>,
    // Empty for generic definitions, whose field types are their type parameters.
    field_types: Vec<TypeHandle>,
    generic_definition: bool,
}

impl SynthesizedType {
    /// A concrete type with one public field per `(name, type)`.
    pub(crate) fn named(
        name: String,
        namespace: Option<String>,
        fields: Vec<(String, TypeHandle)>,
    ) -> Self {
        let (fields, field_types) = fields.into_iter().unzip();

        Self {
            key: NativeKey::synthetic(),
            name,
            namespace,
            fields,
            field_types,
            generic_definition: false,
        }
    }

    /// A generic definition with one type parameter per field.
    pub(crate) fn generic_definition(
        name: String,
        namespace: Option<String>,
        fields: Vec<String>,
    ) -> Self {
        Self {
            key: NativeKey::synthetic(),
            name,
            namespace,
            fields,
            field_types: Vec::new(),
            generic_definition: true,
        }
    }

    /// The simple name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The namespace.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The field names in declaration order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Whether this is an open generic definition.
    pub fn is_generic_definition(&self) -> bool {
        self.generic_definition
    }

    fn qualified_name(&self) -> String {
        match &self.namespace {
            Some(namespace) => format!("{namespace}::{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// A generic synthesized definition closed over concrete field types.
#[derive(Debug)]
pub struct ClosedType {
    key: NativeKey,
    definition: Arc<SynthesizedType>,
    arguments: Vec<TypeHandle>,
}

impl ClosedType {
    pub(crate) fn new(definition: Arc<SynthesizedType>, arguments: Vec<TypeHandle>) -> Self {
        Self {
            key: NativeKey::synthetic(),
            definition,
            arguments,
        }
    }

    /// The open definition.
    pub fn definition(&self) -> &Arc<SynthesizedType> {
        &self.definition
    }

    /// The type arguments, one per field.
    pub fn arguments(&self) -> &[TypeHandle] {
        &self.arguments
    }
}

/// A usable runtime type: what a [`TypeDescriptor`] resolves to.
///
/// Equality and hashing are by identity, except for scalars and arrays.
#[derive(Debug, Clone)]
pub enum TypeHandle {
    /// A scalar type.
    Scalar(ScalarKind),
    /// The heterogeneous `Object` type.
    Object,
    /// An array of the element type.
    Array(Arc<TypeHandle>),
    /// A registered native type.
    Native(Arc<NativeEntry>),
    /// A synthesized type (or open generic definition).
    Synthesized(Arc<SynthesizedType>),
    /// A synthesized generic definition closed over concrete types.
    Closed(Arc<ClosedType>),
}

impl TypeHandle {
    /// The simple name.
    pub fn name(&self) -> String {
        match self {
            TypeHandle::Scalar(kind) => kind.name().into(),
            TypeHandle::Object => OBJECT_TYPE_NAME.into(),
            TypeHandle::Array(_) => "Vec".into(),
            TypeHandle::Native(entry) => entry.native.name().into(),
            TypeHandle::Synthesized(ty) => ty.name.clone(),
            TypeHandle::Closed(closed) => closed.definition.name.clone(),
        }
    }

    /// The full name, including namespace and generic arguments.
    pub fn full_name(&self) -> String {
        match self {
            TypeHandle::Scalar(_) | TypeHandle::Object => self.name(),
            TypeHandle::Array(element) => format!("Vec<{}>", element.full_name()),
            TypeHandle::Native(entry) => entry.native.full_name(),
            TypeHandle::Synthesized(ty) => ty.qualified_name(),
            TypeHandle::Closed(closed) => {
                let arguments: Vec<_> = closed.arguments.iter().map(Self::full_name).collect();
                format!(
                    "{}<{}>",
                    closed.definition.qualified_name(),
                    arguments.join(", ")
                )
            }
        }
    }

    /// Whether instances have read-only properties set through the constructor.
    pub fn is_anonymous(&self) -> bool {
        match self {
            TypeHandle::Closed(_) => true,
            TypeHandle::Synthesized(ty) => ty.generic_definition,
            TypeHandle::Native(entry) => entry.native.is_anonymous(),
            _ => false,
        }
    }

    /// Whether the handle was synthesized.
    pub fn is_synthesized(&self) -> bool {
        matches!(self, TypeHandle::Synthesized(_) | TypeHandle::Closed(_))
    }

    /// The property names in declaration order.
    pub fn property_names(&self) -> Vec<String> {
        match self {
            TypeHandle::Native(entry) => entry
                .native
                .properties()
                .iter()
                .map(|p| p.name().to_owned())
                .collect(),
            TypeHandle::Synthesized(ty) => ty.fields.clone(),
            TypeHandle::Closed(closed) => closed.definition.fields.clone(),
            _ => Vec::new(),
        }
    }

    /// The fields of a synthesized type (or closed definition) and their types.
    pub fn fields(&self) -> Vec<(String, TypeHandle)> {
        match self {
            TypeHandle::Synthesized(ty) => ty
                .fields
                .iter()
                .cloned()
                .zip(ty.field_types.iter().cloned())
                .collect(),
            TypeHandle::Closed(closed) => closed
                .definition
                .fields
                .iter()
                .cloned()
                .zip(closed.arguments.iter().cloned())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// The native type instances of this handle map as.
    pub fn native_type(&self) -> NativeType {
        match self {
            TypeHandle::Scalar(kind) => scalar_native_type(*kind),
            TypeHandle::Object => Value::native_type(),
            TypeHandle::Array(element) => NativeType::new(
                NativeKey::array_of(element.native_key()),
                "Vec",
                NativeKind::Sequence(element.native_type().into()),
            ),
            TypeHandle::Native(entry) => NativeType::clone(&entry.native),
            TypeHandle::Synthesized(ty) => {
                let native = NativeType::new(
                    ty.key,
                    ty.name.clone(),
                    NativeKind::Record,
                );
                let native = match &ty.namespace {
                    Some(namespace) => native.with_namespace(namespace.clone()),
                    None => native,
                };
                let properties = if ty.generic_definition {
                    let object: NativeTypeRef = Value::native_type().into();
                    ty.fields
                        .iter()
                        .map(|name| NativeProperty::new(name.clone(), object.clone()))
                        .collect()
                } else {
                    native_properties(&self.fields())
                };
                let native = native.with_properties(properties).synthesized();
                if ty.generic_definition {
                    native.generic_definition()
                } else {
                    native
                }
            }
            TypeHandle::Closed(closed) => {
                let definition = &closed.definition;
                let native = NativeType::new(
                    closed.key,
                    definition.name.clone(),
                    NativeKind::Record,
                );
                let native = match &definition.namespace {
                    Some(namespace) => native.with_namespace(namespace.clone()),
                    None => native,
                };
                native
                    .with_generic_arguments(
                        closed
                            .arguments
                            .iter()
                            .map(|argument| argument.native_type().into())
                            .collect(),
                    )
                    .with_properties(native_properties(&self.fields()))
                    .synthesized()
            }
        }
    }

    /// The key of [`TypeHandle::native_type`], without building it.
    fn native_key(&self) -> NativeKey {
        match self {
            TypeHandle::Synthesized(ty) => ty.key,
            TypeHandle::Closed(closed) => closed.key,
            TypeHandle::Array(element) => NativeKey::array_of(element.native_key()),
            _ => self.native_type().key(),
        }
    }

    /// A descriptor of this handle, in a new graph.
    pub fn describe(&self) -> TypeDescriptor {
        TypeGraph::describe(&self.native_type(), true)
    }

    /// The property descriptors of this handle, declared by [`TypeHandle::describe`].
    pub fn properties(&self) -> Vec<PropertyDescriptor> {
        self.describe().properties()
    }

    /// The members instances of this handle have.
    ///
    /// Synthesized types have public fields and a parameterless constructor. Closed anonymous
    /// types have read-only properties and a constructor taking every property in order. Native
    /// types have properties and a parameterless constructor.
    pub fn members(&self) -> Vec<MemberDescriptor> {
        let declaring = self.describe();
        let properties = declaring.properties();
        let mut members = Vec::with_capacity(properties.len() + 1);

        match self {
            TypeHandle::Synthesized(ty) if !ty.generic_definition => {
                for property in &properties {
                    members.push(MemberDescriptor::Field(FieldDescriptor::new(
                        property.name(),
                        declaring.clone(),
                        property.value_type().clone(),
                    )));
                }
                members.push(MemberDescriptor::Constructor(ConstructorDescriptor::new(
                    declaring,
                    Vec::new(),
                )));
            }
            TypeHandle::Synthesized(_) | TypeHandle::Closed(_) => {
                let parameters = properties.iter().map(|p| p.value_type().clone()).collect();
                members.extend(
                    properties
                        .into_iter()
                        .map(|p| MemberDescriptor::Property(p.read_only())),
                );
                members.push(MemberDescriptor::Constructor(ConstructorDescriptor::new(
                    declaring, parameters,
                )));
            }
            TypeHandle::Native(_) => {
                members.extend(properties.into_iter().map(MemberDescriptor::Property));
                members.push(MemberDescriptor::Constructor(ConstructorDescriptor::new(
                    declaring,
                    Vec::new(),
                )));
            }
            TypeHandle::Scalar(_) | TypeHandle::Object | TypeHandle::Array(_) => {}
        }

        members
    }

    /// Create an instance with the parameterless constructor.
    ///
    /// Uses a default [`ObjectMapper`]; see [`TypeHandle::create_instance_in`].
    pub fn create_instance(&self) -> Result<Materialized> {
        self.create_instance_in(&ObjectMapper::new())
    }

    /// Create an instance with the parameterless constructor, building native types through
    /// `mapper`.
    pub fn create_instance_in(&self, mapper: &ObjectMapper) -> Result<Materialized> {
        match self {
            TypeHandle::Scalar(kind) => Ok(Materialized::Value(Value::Scalar(kind.default_value()))),
            TypeHandle::Object => Ok(Materialized::Value(Value::Null)),
            TypeHandle::Array(_) => Ok(Materialized::Value(Value::Array(Vec::new()))),
            TypeHandle::Native(entry) => entry
                .build(&DynamicValue::record(), &mut MapContext::new(mapper))
                .map(Materialized::Native),
            TypeHandle::Synthesized(ty) if ty.generic_definition => Err(Error::ShapeConflict(
                "cannot instantiate an open generic definition",
            )),
            TypeHandle::Synthesized(_) => Ok(Materialized::Synthesized(
                SynthesizedRecord::with_defaults(self.clone()),
            )),
            TypeHandle::Closed(_) => self.create_instance_with_in(mapper, Vec::new()),
        }
    }

    /// Create an instance with the constructor taking every property in order.
    ///
    /// Only closed anonymous types have such a constructor; for all other handles `arguments`
    /// must be empty. Arguments are converted with a default [`ObjectMapper`]; see
    /// [`TypeHandle::create_instance_with_in`].
    pub fn create_instance_with(&self, arguments: Vec<Value>) -> Result<Materialized> {
        self.create_instance_with_in(&ObjectMapper::new(), arguments)
    }

    /// Like [`TypeHandle::create_instance_with`], converting the arguments with the coercions of
    /// `mapper`.
    pub fn create_instance_with_in(
        &self,
        mapper: &ObjectMapper,
        arguments: Vec<Value>,
    ) -> Result<Materialized> {
        let TypeHandle::Closed(closed) = self else {
            if !arguments.is_empty() {
                return Err(Error::ArgumentCount {
                    type_name: self.full_name(),
                    expected: 0,
                    found: arguments.len(),
                });
            }
            return self.create_instance_in(mapper);
        };
        if arguments.len() != closed.arguments.len() {
            return Err(Error::ArgumentCount {
                type_name: self.full_name(),
                expected: closed.arguments.len(),
                found: arguments.len(),
            });
        }

        let cx = MapContext::new(mapper);
        let values = closed
            .arguments
            .iter()
            .zip(arguments)
            .map(|(ty, value)| ty.accept(value, &cx))
            .collect::<Result<Vec<_>>>()?;

        Ok(Materialized::Synthesized(SynthesizedRecord::new(
            self.clone(),
            values,
        )))
    }

    /// The value a fresh field of this type holds.
    pub(crate) fn default_value(&self) -> Value {
        match self {
            TypeHandle::Scalar(kind) => Value::Scalar(kind.default_value()),
            TypeHandle::Array(_) => Value::Array(Vec::new()),
            _ => Value::Null,
        }
    }

    /// Convert `value` to fit a field of this type. Only scalars are converted.
    pub(crate) fn accept(&self, value: Value, cx: &MapContext<'_>) -> Result<Value> {
        match (self, &value) {
            (_, Value::Null) => Ok(value),
            (TypeHandle::Scalar(kind), _) => cx
                .scalar(&value, &scalar_native_type(*kind))
                .map(Value::Scalar),
            _ => Ok(value),
        }
    }
}

fn native_properties(fields: &[(String, TypeHandle)]) -> Vec<NativeProperty> {
    fields
        .iter()
        .map(|(name, ty)| NativeProperty::new(name.clone(), ty.native_type().into()))
        .collect()
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypeHandle::Scalar(a), TypeHandle::Scalar(b)) => a == b,
            (TypeHandle::Object, TypeHandle::Object) => true,
            (TypeHandle::Array(a), TypeHandle::Array(b)) => a == b,
            (TypeHandle::Native(a), TypeHandle::Native(b)) => Arc::ptr_eq(a, b),
            (TypeHandle::Synthesized(a), TypeHandle::Synthesized(b)) => Arc::ptr_eq(a, b),
            (TypeHandle::Closed(a), TypeHandle::Closed(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for TypeHandle {}

impl Hash for TypeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            TypeHandle::Scalar(kind) => kind.hash(state),
            TypeHandle::Object => {}
            TypeHandle::Array(element) => element.hash(state),
            TypeHandle::Native(entry) => Arc::as_ptr(entry).hash(state),
            TypeHandle::Synthesized(ty) => Arc::as_ptr(ty).hash(state),
            TypeHandle::Closed(closed) => Arc::as_ptr(closed).hash(state),
        }
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}
