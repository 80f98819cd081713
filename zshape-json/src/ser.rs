use std::{any::TypeId, cell::RefCell, sync::Arc};

use serde::ser::{Error as _, Serialize, SerializeMap, SerializeSeq, Serializer};
use zshape_core::{
    token, DynamicValue, ObjectKey, PropertySet, ReferenceSession, Scalar, ScalarKind,
    TypeDescriptor, Value, Visit,
};

use crate::{Error, Result};

/// State of one write: the session and the first core error hit.
pub(crate) struct Writer<'s> {
    session: RefCell<&'s mut ReferenceSession<()>>,
    error: RefCell<Option<zshape_core::Error>>,
}

impl<'s> Writer<'s> {
    fn new(session: &'s mut ReferenceSession<()>) -> Self {
        Self {
            session: RefCell::new(session),
            error: RefCell::new(None),
        }
    }

    fn visit<E: serde::ser::Error>(&self, key: ObjectKey) -> core::result::Result<Visit, E> {
        let visit = self.session.borrow_mut().visit(key, ());

        visit.map_err(|e| {
            let err = E::custom(&e);
            self.error.borrow_mut().get_or_insert(e);
            err
        })
    }

    fn finish<T>(self, result: serde_json::Result<T>) -> Result<T> {
        match (result, self.error.into_inner()) {
            (Ok(value), _) => Ok(value),
            (Err(_), Some(e)) => Err(Error::Core(e)),
            (Err(e), None) => Err(Error::Json(e)),
        }
    }
}

/// Serialize `value` with `emit`, tracking references in `session`.
pub(crate) fn encode<T>(
    session: &mut ReferenceSession<()>,
    value: &DynamicValue,
    emit: impl FnOnce(&Node<'_, '_>) -> serde_json::Result<T>,
) -> Result<T> {
    let writer = Writer::new(session);
    let result = emit(&Node {
        writer: &writer,
        key: ObjectKey::of(value),
        value,
    });

    writer.finish(result)
}

/// Serialize the descriptor `ty` with `emit`, tracking references in `session`.
pub(crate) fn encode_descriptor<T>(
    session: &mut ReferenceSession<()>,
    ty: &TypeDescriptor,
    emit: impl FnOnce(&Descriptor<'_, '_>) -> serde_json::Result<T>,
) -> Result<T> {
    let writer = Writer::new(session);
    let result = emit(&Descriptor {
        writer: &writer,
        ty,
    });

    writer.finish(result)
}

/// A dynamic value node.
pub(crate) struct Node<'a, 's> {
    writer: &'a Writer<'s>,
    key: ObjectKey,
    value: &'a DynamicValue,
}

impl<'a, 's> Node<'a, 's> {
    fn shared(writer: &'a Writer<'s>, value: &'a Arc<DynamicValue>) -> Self {
        Self {
            writer,
            key: ObjectKey::of_arc(value),
            value,
        }
    }
}

impl Serialize for Node<'_, '_> {
    fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if self.value.is_null() {
            return serializer.serialize_none();
        }
        let id = match self.writer.visit::<S::Error>(self.key)? {
            Visit::Repeat(id) => return reference(serializer, &id),
            Visit::First(id) => id,
        };

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(token::ID, &id)?;
        if let Some(ty) = self.value.ty() {
            let descriptor = Descriptor {
                writer: self.writer,
                ty,
            };
            map.serialize_entry(token::TYPE, &descriptor)?;
        }
        if let Some(properties) = self.value.properties() {
            let properties = Properties {
                writer: self.writer,
                properties,
            };
            map.serialize_entry(token::PROPERTIES, &properties)?;
        } else if let Some(wrapped) = self.value.wrapped_value() {
            wrapped_entries(&mut map, self.writer, wrapped)?;
        }

        map.end()
    }
}

fn reference<S: Serializer>(serializer: S, id: &str) -> core::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(token::REF, id)?;
    map.end()
}

/// The body of a wrapped node.
fn wrapped_entries<M: SerializeMap>(
    map: &mut M,
    writer: &Writer<'_>,
    value: &Value,
) -> core::result::Result<(), M::Error> {
    match value {
        Value::Null => map.serialize_entry(token::VALUE, &()),
        Value::Scalar(scalar) => {
            map.serialize_entry(token::SCALAR_TYPE, &scalar.kind())?;
            map.serialize_entry(token::VALUE, &Raw(scalar))
        }
        Value::Dynamic(dynamic) => {
            map.serialize_entry(token::DYNAMIC_VALUE, &Node::shared(writer, dynamic))
        }
        Value::Array(items) => match homogeneous(items) {
            Some(kind) => {
                map.serialize_entry(token::SCALAR_TYPE, &array_tag(kind.name()))?;
                map.serialize_entry(token::ITEMS, &RawItems(items))
            }
            None => {
                map.serialize_entry(token::SCALAR_TYPE, &array_tag(token::OBJECT_TAG))?;
                map.serialize_entry(token::DYNAMIC_ITEMS, &TaggedItems { writer, items })
            }
        },
    }
}

struct Properties<'a, 's> {
    writer: &'a Writer<'s>,
    properties: &'a PropertySet,
}

impl Serialize for Properties<'_, '_> {
    fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.properties.len()))?;
        for property in self.properties {
            seq.serialize_element(&Tagged {
                writer: self.writer,
                name: Some(property.name()),
                value: property.value(),
            })?;
        }
        seq.end()
    }
}

/// A value with its scalar tag: a `{Name, Type, Value}` triple, or an array element without the
/// name.
struct Tagged<'a, 's> {
    writer: &'a Writer<'s>,
    name: Option<&'a str>,
    value: &'a Value,
}

impl Serialize for Tagged<'_, '_> {
    fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        if let Some(name) = self.name {
            map.serialize_entry(token::NAME, name)?;
        }
        match self.value {
            Value::Null => map.serialize_entry(token::VALUE, &())?,
            Value::Scalar(scalar) => {
                map.serialize_entry(token::SCALAR_TYPE, &scalar.kind())?;
                map.serialize_entry(token::VALUE, &Raw(scalar))?;
            }
            Value::Dynamic(dynamic) => {
                map.serialize_entry(token::VALUE, &Node::shared(self.writer, dynamic))?;
            }
            Value::Array(items) => match homogeneous(items) {
                Some(kind) => {
                    map.serialize_entry(token::SCALAR_TYPE, &array_tag(kind.name()))?;
                    map.serialize_entry(token::VALUE, &RawItems(items))?;
                }
                None => {
                    map.serialize_entry(token::SCALAR_TYPE, &array_tag(token::OBJECT_TAG))?;
                    let items = TaggedItems {
                        writer: self.writer,
                        items,
                    };
                    map.serialize_entry(token::VALUE, &items)?;
                }
            },
        }
        map.end()
    }
}

struct TaggedItems<'a, 's> {
    writer: &'a Writer<'s>,
    items: &'a [Value],
}

impl Serialize for TaggedItems<'_, '_> {
    fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.items.iter().map(|value| Tagged {
            writer: self.writer,
            name: None,
            value,
        }))
    }
}

/// Elements of an array [`homogeneous`] found to hold scalars of one kind.
struct RawItems<'a>(&'a [Value]);

impl Serialize for RawItems<'_> {
    fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for item in self.0 {
            match item {
                Value::Scalar(scalar) => seq.serialize_element(&Raw(scalar))?,
                _ => return Err(S::Error::custom("non-scalar element in a scalar array")),
            }
        }
        seq.end()
    }
}

/// A scalar in its plain JSON form.
struct Raw<'a>(&'a Scalar);

impl Serialize for Raw<'_> {
    fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.0 {
            Scalar::Bool(v) => serializer.serialize_bool(*v),
            Scalar::I8(v) => serializer.serialize_i8(*v),
            Scalar::I16(v) => serializer.serialize_i16(*v),
            Scalar::I32(v) => serializer.serialize_i32(*v),
            Scalar::I64(v) => serializer.serialize_i64(*v),
            Scalar::U8(v) => serializer.serialize_u8(*v),
            Scalar::U16(v) => serializer.serialize_u16(*v),
            Scalar::U32(v) => serializer.serialize_u32(*v),
            Scalar::U64(v) => serializer.serialize_u64(*v),
            // Beyond what JSON numbers carry reliably.
            Scalar::I128(v) => serializer.collect_str(v),
            Scalar::U128(v) => serializer.collect_str(v),
            Scalar::F32(v) if v.is_finite() => serializer.serialize_f32(*v),
            Scalar::F64(v) if v.is_finite() => serializer.serialize_f64(*v),
            Scalar::F32(v) => serializer.collect_str(v),
            Scalar::F64(v) => serializer.collect_str(v),
            Scalar::Char(v) => serializer.serialize_char(*v),
            Scalar::String(v) => serializer.serialize_str(v),
            Scalar::Bytes(v) => serializer.collect_seq(v),
        }
    }
}

/// A type descriptor node.
pub(crate) struct Descriptor<'a, 's> {
    writer: &'a Writer<'s>,
    ty: &'a TypeDescriptor,
}

impl Serialize for Descriptor<'_, '_> {
    fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let key = ObjectKey::new(self.ty.node_addr(), TypeId::of::<TypeDescriptor>());
        let id = match self.writer.visit::<S::Error>(key)? {
            Visit::Repeat(id) => return reference(serializer, &id),
            Visit::First(id) => id,
        };

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(token::ID, &id)?;
        map.serialize_entry(token::NAME, self.ty.name())?;
        if let Some(namespace) = self.ty.namespace() {
            map.serialize_entry(token::NAMESPACE, namespace)?;
        }
        map.serialize_entry(token::IS_ARRAY, &self.ty.is_array())?;
        map.serialize_entry(token::IS_GENERIC_TYPE, &self.ty.is_generic_type())?;
        map.serialize_entry(
            token::IS_GENERIC_TYPE_DEFINITION,
            &self.ty.is_generic_type_definition(),
        )?;
        map.serialize_entry(token::IS_ANONYMOUS_TYPE, &self.ty.is_anonymous_type())?;

        let arguments = self.ty.generic_arguments();
        let arguments: Vec<_> = arguments
            .iter()
            .map(|ty| Descriptor {
                writer: self.writer,
                ty,
            })
            .collect();
        map.serialize_entry(token::GENERIC_ARGUMENTS, &arguments)?;

        if let Some(declaring) = self.ty.declaring_type() {
            let declaring = Descriptor {
                writer: self.writer,
                ty: &declaring,
            };
            map.serialize_entry(token::DECLARING_TYPE, &declaring)?;
        }

        let properties = self.ty.properties();
        let properties: Vec<_> = properties
            .iter()
            .map(|property| DescriptorProperty {
                name: property.name(),
                ty: Descriptor {
                    writer: self.writer,
                    ty: property.value_type(),
                },
            })
            .collect();
        map.serialize_entry(token::PROPERTIES, &properties)?;

        map.end()
    }
}

struct DescriptorProperty<'a, 's> {
    name: &'a str,
    ty: Descriptor<'a, 's>,
}

impl Serialize for DescriptorProperty<'_, '_> {
    fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(token::NAME, self.name)?;
        map.serialize_entry(token::PROPERTY_TYPE, &self.ty)?;
        map.end()
    }
}

/// The kind shared by all elements, if they are all scalars of one kind.
fn homogeneous(items: &[Value]) -> Option<ScalarKind> {
    let mut kinds = items.iter().map(|item| item.as_scalar().map(Scalar::kind));
    let first = kinds.next()??;

    kinds.all(|kind| kind == Some(first)).then_some(first)
}

fn array_tag(element: &str) -> String {
    format!("{}{element}", token::ARRAY_TAG_PREFIX)
}
