#![deny(
    missing_debug_implementations,
    nonstandard_style,
    rust_2018_idioms,
    missing_docs
)]
#![warn(unreachable_pub)]
#![doc = include_str!("../README.md")]

mod de;
mod error;
pub use error::{Error, Result};
mod ser;

use std::{io, sync::Arc};

use zshape_core::{DynamicValue, SessionAdapter, TypeDescriptor};

/// Serialize `value` as a JSON string.
pub fn to_string(value: &DynamicValue) -> Result<String> {
    encode(value, |node| serde_json::to_string(node))
}

/// Serialize `value` as a pretty-printed JSON string.
pub fn to_string_pretty(value: &DynamicValue) -> Result<String> {
    encode(value, |node| serde_json::to_string_pretty(node))
}

/// Serialize `value` as JSON into `writer`.
pub fn to_writer<W: io::Write>(writer: W, value: &DynamicValue) -> Result<()> {
    encode(value, |node| serde_json::to_writer(writer, node))
}

/// Convert `value` to a [`serde_json::Value`].
pub fn to_value(value: &DynamicValue) -> Result<serde_json::Value> {
    encode(value, |node| serde_json::to_value(node))
}

/// Deserialize a dynamic value from a JSON string.
pub fn from_str(json: &str) -> Result<DynamicValue> {
    from_value(&serde_json::from_str(json)?)
}

/// Deserialize a dynamic value from JSON bytes.
pub fn from_slice(json: &[u8]) -> Result<DynamicValue> {
    from_value(&serde_json::from_slice(json)?)
}

/// Convert a [`serde_json::Value`] to a dynamic value.
///
/// Every `$ref` must name an `$id` that appeared earlier in the document. A `$ref` to a value
/// that is still being read (a cycle) is [`zshape_core::Error::UnsupportedGraphCycle`].
pub fn from_value(json: &serde_json::Value) -> Result<DynamicValue> {
    let value = SessionAdapter::root().with_session(|session| {
        let value = de::Reader::new(session).node(json);
        zshape_core::debug!("Read dynamic value with {} ids", session.len());

        Ok(value)
    })??;

    Ok(Arc::unwrap_or_clone(value))
}

/// Convert a type descriptor graph to a [`serde_json::Value`].
pub fn descriptor_to_value(ty: &TypeDescriptor) -> Result<serde_json::Value> {
    SessionAdapter::root().with_session(|session| {
        Ok(ser::encode_descriptor(session, ty, |node| {
            serde_json::to_value(node)
        }))
    })?
}

/// Convert a [`serde_json::Value`] to a type descriptor graph.
///
/// All descriptors read end up in one new [`TypeGraph`](zshape_core::TypeGraph).
pub fn descriptor_from_value(json: &serde_json::Value) -> Result<TypeDescriptor> {
    SessionAdapter::root().with_session(|session| Ok(de::Reader::new(session).descriptor(json)))?
}

fn encode<T>(
    value: &DynamicValue,
    emit: impl FnOnce(&ser::Node<'_, '_>) -> serde_json::Result<T>,
) -> Result<T> {
    SessionAdapter::root().with_session(|session| Ok(ser::encode(session, value, emit)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use zshape_core::{Scalar, ScalarKind, TypeEdges, TypeGraph, TypeHeader, Value};

    fn round_trip(value: &DynamicValue) -> DynamicValue {
        from_str(&to_string(value).unwrap()).unwrap()
    }

    #[test_log::test]
    fn scalars_round_trip() {
        let scalars = [
            Scalar::Bool(true),
            Scalar::I8(-8),
            Scalar::I16(-16),
            Scalar::I32(-32),
            Scalar::I64(i64::MIN),
            Scalar::I128(i128::MIN),
            Scalar::U8(8),
            Scalar::U16(16),
            Scalar::U32(32),
            Scalar::U64(u64::MAX),
            Scalar::U128(u128::MAX),
            Scalar::F32(0.1),
            Scalar::F64(9.99),
            Scalar::F64(f64::INFINITY),
            Scalar::Char('λ'),
            Scalar::String("Widget".into()),
            Scalar::Bytes(vec![0, 1, 255]),
        ];
        assert_eq!(scalars.len(), ScalarKind::ALL.len() + 1);

        for scalar in scalars {
            let value = DynamicValue::wrapped(scalar);
            assert_eq!(round_trip(&value), value);
        }

        let nan = round_trip(&DynamicValue::wrapped(f64::NAN));
        assert!(matches!(
            nan.wrapped_value(),
            Some(Value::Scalar(Scalar::F64(v))) if v.is_nan()
        ));
    }

    #[test]
    fn wire_format() {
        let value = DynamicValue::record()
            .with_property("Id", 1)
            .unwrap()
            .with_property("Big", u128::MAX)
            .unwrap()
            .with_property("Tags", vec![Value::from("a"), Value::from("b")])
            .unwrap()
            .with_property("Mixed", vec![Value::from(1), Value::Null])
            .unwrap();

        assert_eq!(
            to_value(&value).unwrap(),
            json!({
                "$id": "1",
                "Properties": [
                    { "Name": "Id", "Type": "i32", "Value": 1 },
                    { "Name": "Big", "Type": "u128", "Value": u128::MAX.to_string() },
                    { "Name": "Tags", "Type": "[]String", "Value": ["a", "b"] },
                    {
                        "Name": "Mixed",
                        "Type": "[]Object",
                        "Value": [{ "Type": "i32", "Value": 1 }, { "Value": null }],
                    },
                ],
            })
        );
        assert_eq!(round_trip(&value), value);
    }

    #[test]
    fn wrapped_arrays() {
        let ints = DynamicValue::wrapped(vec![Value::from(1u8), Value::from(2u8)]);
        assert_eq!(
            to_value(&ints).unwrap(),
            json!({ "$id": "1", "Type": "[]u8", "Items": [1, 2] })
        );
        assert_eq!(round_trip(&ints), ints);

        let nested = DynamicValue::wrapped(vec![Value::from(DynamicValue::wrapped(true))]);
        let json = to_value(&nested).unwrap();
        assert_eq!(json["Type"], "[]Object");
        assert!(json["DynamicItems"].is_array());
        assert_eq!(round_trip(&nested), nested);

        let empty = DynamicValue::wrapped(Vec::<Value>::new());
        assert_eq!(round_trip(&empty), empty);
    }

    #[test]
    fn shared_values_are_written_once() {
        let shared = Arc::new(DynamicValue::record().with_property("Id", 7).unwrap());
        let value = DynamicValue::record()
            .with_property("First", shared.clone())
            .unwrap()
            .with_property("Second", shared)
            .unwrap();

        let json = to_value(&value).unwrap();
        assert_eq!(json["Properties"][0]["Value"]["$id"], "2");
        assert_eq!(json["Properties"][1]["Value"], json!({ "$ref": "2" }));

        let back = from_value(&json).unwrap();
        let first = back.get("First").unwrap();
        assert!(first.ptr_eq(back.get("Second").unwrap()));
        assert_eq!(back, value);
    }

    #[test]
    fn reference_errors() {
        let unknown = json!({
            "$id": "1",
            "Properties": [{ "Name": "Next", "Value": { "$ref": "9" } }],
        });
        assert!(matches!(
            from_value(&unknown),
            Err(Error::Core(zshape_core::Error::UnresolvedReference { id })) if id == "9"
        ));

        let cycle = json!({
            "$id": "1",
            "Properties": [{ "Name": "Next", "Value": { "$ref": "1" } }],
        });
        assert!(matches!(
            from_value(&cycle),
            Err(Error::Core(zshape_core::Error::UnsupportedGraphCycle { .. }))
        ));

        let duplicate = json!({
            "$id": "1",
            "Properties": [{ "Name": "Next", "Value": { "$id": "1", "Properties": [] } }],
        });
        assert!(matches!(
            from_value(&duplicate),
            Err(Error::Core(zshape_core::Error::DuplicateReferenceId { .. }))
        ));

        assert!(matches!(from_str("[1, 2]"), Err(Error::Malformed(_))));
        assert!(matches!(from_str("{"), Err(Error::Json(_))));
    }

    #[test]
    fn out_of_range_floats_are_rejected() {
        let huge = json!({ "$id": "1", "Type": "f32", "Value": 1e300 });
        assert!(matches!(from_value(&huge), Err(Error::Malformed(_))));

        let huge = json!({ "$id": "1", "Type": "f32", "Value": "1e39" });
        assert!(matches!(from_value(&huge), Err(Error::Malformed(_))));

        let max = json!({ "$id": "1", "Type": "f32", "Value": f32::MAX });
        assert_eq!(
            from_value(&max).unwrap().wrapped_value(),
            Some(&Value::Scalar(Scalar::F32(f32::MAX)))
        );

        let inf = json!({ "$id": "1", "Type": "f32", "Value": "inf" });
        assert_eq!(
            from_value(&inf).unwrap().wrapped_value(),
            Some(&Value::Scalar(Scalar::F32(f32::INFINITY)))
        );
    }

    #[test]
    fn recursive_descriptors_round_trip() {
        let graph = TypeGraph::new();
        let int = graph
            .define(TypeHeader::new("i32"), TypeEdges::new())
            .unwrap();
        let node = graph.reserve(TypeHeader::new("Node").with_namespace("app"));
        node.complete(
            TypeEdges::new()
                .property("Value", int)
                .property("Next", node.clone()),
        )
        .unwrap();

        let json = descriptor_to_value(&node).unwrap();
        assert_eq!(json["Properties"][1]["PropertyType"], json!({ "$ref": "1" }));

        let back = descriptor_from_value(&json).unwrap();
        assert_eq!(back, node);
        assert_eq!(back.full_name(), "app::Node");
        let next = back.property("Next").unwrap();
        assert!(next.value_type().ptr_eq(&back));
    }

    #[test]
    fn annotated_values_carry_descriptors() {
        let graph = TypeGraph::new();
        let string = graph
            .define(TypeHeader::new("String"), TypeEdges::new())
            .unwrap();
        let ty = graph
            .define(
                TypeHeader::new("Entity").with_namespace("shop"),
                TypeEdges::new().property("Name", string),
            )
            .unwrap();
        let value = DynamicValue::record()
            .with_property("Name", "Widget")
            .unwrap()
            .with_type(ty.clone());

        let json = to_value(&value).unwrap();
        assert_eq!(json["$type"]["Name"], "Entity");
        assert_eq!(json["$type"]["Namespace"], "shop");

        let back = from_value(&json).unwrap();
        assert_eq!(back.ty(), Some(&ty));
        assert_eq!(back.get("Name"), Some(&Value::from("Widget")));
    }
}
