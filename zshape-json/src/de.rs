use std::sync::Arc;

use serde_json::{Map, Value as Json};
use zshape_core::{
    session::Lookup, token, DynamicValue, Property, ReferenceSession, Scalar, ScalarKind,
    TypeDescriptor, TypeEdges, TypeGraph, TypeHeader, Value,
};

use crate::{Error, Result};

/// What an `$id` stands for while reading.
#[derive(Debug, Clone)]
pub(crate) enum Tracked {
    Value(Arc<DynamicValue>),
    Type(TypeDescriptor),
}

/// State of one read.
pub(crate) struct Reader<'s> {
    session: &'s mut ReferenceSession<Tracked>,
    graph: Arc<TypeGraph>,
}

impl<'s> Reader<'s> {
    pub(crate) fn new(session: &'s mut ReferenceSession<Tracked>) -> Self {
        Self {
            session,
            graph: TypeGraph::new(),
        }
    }

    /// A dynamic value node, or `null`.
    pub(crate) fn node(&mut self, json: &Json) -> Result<Arc<DynamicValue>> {
        let map = match json {
            Json::Null => return Ok(Arc::new(DynamicValue::null())),
            Json::Object(map) => map,
            other => return Err(Error::malformed(format!("expected a node, found `{other}`"))),
        };
        if let Some(reference) = map.get(token::REF) {
            return match self.lookup(reference)? {
                Tracked::Value(value) => Ok(value),
                Tracked::Type(_) => Err(Error::malformed("`$ref` to a type where a value belongs")),
            };
        }

        let id = optional_str(map, token::ID)?;
        if let Some(id) = id {
            self.session.reserve(id)?;
        }
        let ty = match map.get(token::TYPE) {
            Some(ty) => Some(self.descriptor(ty)?),
            None => None,
        };

        let mut value = match map.get(token::PROPERTIES) {
            Some(properties) => self.record(properties)?,
            None => DynamicValue::wrapped(self.wrapped(map)?),
        };
        if let Some(ty) = ty {
            value = value.with_type(ty);
        }

        let value = Arc::new(value);
        if let Some(id) = id {
            self.session.complete(id, Tracked::Value(value.clone()))?;
        }

        Ok(value)
    }

    /// A type descriptor node.
    pub(crate) fn descriptor(&mut self, json: &Json) -> Result<TypeDescriptor> {
        let map = object(json, "type descriptor")?;
        if let Some(reference) = map.get(token::REF) {
            return match self.lookup(reference)? {
                Tracked::Type(ty) => Ok(ty),
                Tracked::Value(_) => Err(Error::malformed("`$ref` to a value where a type belongs")),
            };
        }

        let name = optional_str(map, token::NAME)?
            .ok_or_else(|| Error::malformed("type descriptor without a name"))?;
        let mut header = TypeHeader::new(name);
        header.namespace = optional_str(map, token::NAMESPACE)?.map(Into::into);
        header.is_array = flag(map, token::IS_ARRAY)?;
        header.is_generic_type = flag(map, token::IS_GENERIC_TYPE)?;
        header.is_generic_type_definition = flag(map, token::IS_GENERIC_TYPE_DEFINITION)?;
        header.is_anonymous_type = flag(map, token::IS_ANONYMOUS_TYPE)?;

        // Registered before the edges are read, so they can refer back to it.
        let ty = self.graph.reserve(header);
        if let Some(id) = optional_str(map, token::ID)? {
            self.session.register(id, Tracked::Type(ty.clone()))?;
        }

        let mut edges = TypeEdges::new();
        for argument in optional_array(map, token::GENERIC_ARGUMENTS)? {
            edges = edges.generic_argument(self.descriptor(argument)?);
        }
        if let Some(declaring) = map.get(token::DECLARING_TYPE).filter(|d| !d.is_null()) {
            edges = edges.declaring_type(self.descriptor(declaring)?);
        }
        for property in optional_array(map, token::PROPERTIES)? {
            let property = object(property, "descriptor property")?;
            let name = optional_str(property, token::NAME)?
                .ok_or_else(|| Error::malformed("descriptor property without a name"))?;
            let property_type = property
                .get(token::PROPERTY_TYPE)
                .ok_or_else(|| Error::malformed(format!("property `{name}` without a type")))?;
            edges = edges.property(name, self.descriptor(property_type)?);
        }
        ty.complete(edges)?;

        Ok(ty)
    }

    fn lookup(&mut self, reference: &Json) -> Result<Tracked> {
        let id = reference
            .as_str()
            .ok_or_else(|| Error::malformed("`$ref` is not a string"))?;

        match self.session.resolve(id)? {
            Lookup::Ready(tracked) => Ok(tracked.clone()),
            Lookup::Pending => Err(zshape_core::Error::UnsupportedGraphCycle { at: id.into() }.into()),
        }
    }

    fn record(&mut self, properties: &Json) -> Result<DynamicValue> {
        let properties = properties
            .as_array()
            .ok_or_else(|| Error::malformed("`Properties` is not an array"))?;

        let mut record = DynamicValue::record();
        for property in properties {
            let property = object(property, "property")?;
            let name = optional_str(property, token::NAME)?
                .ok_or_else(|| Error::malformed("property without a name"))?;
            let value = self.tagged(property)?;
            record.insert(Property::new(name, value))?;
        }

        Ok(record)
    }

    /// The body of a wrapped node.
    fn wrapped(&mut self, map: &Map<String, Json>) -> Result<Value> {
        let tag = optional_str(map, token::SCALAR_TYPE)?;
        if let Some(inner) = map.get(token::DYNAMIC_VALUE) {
            return self.node(inner).map(Value::Dynamic);
        }
        if let Some(items) = map.get(token::ITEMS) {
            let tag = tag.ok_or_else(|| Error::malformed("`Items` without a `Type`"))?;
            return self.typed(tag, items);
        }
        if let Some(items) = map.get(token::DYNAMIC_ITEMS) {
            return self.typed(tag.unwrap_or(OBJECT_ARRAY_TAG), items);
        }

        match (tag, map.get(token::VALUE)) {
            (Some(tag), Some(raw)) => self.typed(tag, raw),
            (None, Some(Json::Null)) => Ok(Value::Null),
            _ => Err(Error::malformed("node without a payload")),
        }
    }

    /// A `{Type, Value}` pair: a property triple without its name, or an array element.
    fn tagged(&mut self, map: &Map<String, Json>) -> Result<Value> {
        let raw = map
            .get(token::VALUE)
            .ok_or_else(|| Error::malformed("tagged value without a `Value`"))?;

        match optional_str(map, token::SCALAR_TYPE)? {
            Some(tag) => self.typed(tag, raw),
            None if raw.is_null() => Ok(Value::Null),
            None => self.node(raw).map(Value::Dynamic),
        }
    }

    fn typed(&mut self, tag: &str, raw: &Json) -> Result<Value> {
        let Some(element) = tag.strip_prefix(token::ARRAY_TAG_PREFIX) else {
            return scalar(kind(tag)?, raw).map(Value::Scalar);
        };
        let items = raw
            .as_array()
            .ok_or_else(|| Error::malformed(format!("`{tag}` value is not an array")))?;

        let items = if element == token::OBJECT_TAG {
            items
                .iter()
                .map(|item| self.tagged(object(item, "array element")?))
                .collect::<Result<Vec<_>>>()?
        } else {
            let kind = kind(element)?;
            items
                .iter()
                .map(|item| scalar(kind, item).map(Value::Scalar))
                .collect::<Result<Vec<_>>>()?
        };

        Ok(Value::Array(items))
    }
}

const OBJECT_ARRAY_TAG: &str = "[]Object";

fn kind(tag: &str) -> Result<ScalarKind> {
    ScalarKind::from_name(tag).ok_or_else(|| Error::malformed(format!("unknown scalar tag `{tag}`")))
}

/// A scalar from its plain JSON form.
fn scalar(kind: ScalarKind, raw: &Json) -> Result<Scalar> {
    let mismatch = || Error::malformed(format!("`{raw}` is not a valid `{kind}`"));
    let signed = || raw.as_i64().ok_or_else(mismatch);
    let unsigned = || raw.as_u64().ok_or_else(mismatch);

    let scalar = match kind {
        ScalarKind::Bool => Scalar::Bool(raw.as_bool().ok_or_else(mismatch)?),
        ScalarKind::I8 => Scalar::I8(signed()?.try_into().map_err(|_| mismatch())?),
        ScalarKind::I16 => Scalar::I16(signed()?.try_into().map_err(|_| mismatch())?),
        ScalarKind::I32 => Scalar::I32(signed()?.try_into().map_err(|_| mismatch())?),
        ScalarKind::I64 => Scalar::I64(signed()?),
        ScalarKind::U8 => Scalar::U8(unsigned()?.try_into().map_err(|_| mismatch())?),
        ScalarKind::U16 => Scalar::U16(unsigned()?.try_into().map_err(|_| mismatch())?),
        ScalarKind::U32 => Scalar::U32(unsigned()?.try_into().map_err(|_| mismatch())?),
        ScalarKind::U64 => Scalar::U64(unsigned()?),
        ScalarKind::I128 => Scalar::I128(match raw {
            Json::String(s) => s.parse().map_err(|_| mismatch())?,
            _ => signed()?.into(),
        }),
        ScalarKind::U128 => Scalar::U128(match raw {
            Json::String(s) => s.parse().map_err(|_| mismatch())?,
            _ => unsigned()?.into(),
        }),
        // Floats are narrowed from `f64`, which holds every `f32` exactly.
        ScalarKind::F32 => {
            let (narrow, wide) = match raw {
                Json::String(s) => (
                    s.parse::<f32>().map_err(|_| mismatch())?,
                    s.parse::<f64>().map_err(|_| mismatch())?,
                ),
                _ => {
                    let wide = raw.as_f64().ok_or_else(mismatch)?;
                    (wide as f32, wide)
                }
            };
            // A finite number beyond the `f32` range.
            if wide.is_finite() && !narrow.is_finite() {
                return Err(mismatch());
            }
            Scalar::F32(narrow)
        }
        ScalarKind::F64 => Scalar::F64(match raw {
            Json::String(s) => s.parse().map_err(|_| mismatch())?,
            _ => raw.as_f64().ok_or_else(mismatch)?,
        }),
        ScalarKind::Char => {
            let s = raw.as_str().ok_or_else(mismatch)?;
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Scalar::Char(c),
                _ => return Err(mismatch()),
            }
        }
        ScalarKind::String => Scalar::String(raw.as_str().ok_or_else(mismatch)?.into()),
        ScalarKind::Bytes => Scalar::Bytes(
            raw.as_array()
                .ok_or_else(mismatch)?
                .iter()
                .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()).ok_or_else(mismatch))
                .collect::<Result<Vec<_>>>()?,
        ),
    };

    Ok(scalar)
}

fn object<'j>(json: &'j Json, what: &str) -> Result<&'j Map<String, Json>> {
    json.as_object()
        .ok_or_else(|| Error::malformed(format!("{what} is not an object")))
}

fn optional_str<'j>(map: &'j Map<String, Json>, key: &str) -> Result<Option<&'j str>> {
    match map.get(key) {
        None | Some(Json::Null) => Ok(None),
        Some(Json::String(s)) => Ok(Some(s)),
        Some(other) => Err(Error::malformed(format!("`{key}` is not a string: `{other}`"))),
    }
}

fn optional_array<'j>(map: &'j Map<String, Json>, key: &str) -> Result<&'j [Json]> {
    match map.get(key) {
        None | Some(Json::Null) => Ok(&[]),
        Some(Json::Array(items)) => Ok(items),
        Some(other) => Err(Error::malformed(format!("`{key}` is not an array: `{other}`"))),
    }
}

fn flag(map: &Map<String, Json>, key: &str) -> Result<bool> {
    match map.get(key) {
        None | Some(Json::Null) => Ok(false),
        Some(Json::Bool(flag)) => Ok(*flag),
        Some(other) => Err(Error::malformed(format!("`{key}` is not a boolean: `{other}`"))),
    }
}
