//! End-to-end mapping of derived types through the JSON codec.

use std::sync::Arc;

use zshape::{
    DynamicValue, Error, ObjectMapper, Property, Reflect, TypeRegistry, TypeResolver, Value,
};

#[derive(Debug, Default, Clone, PartialEq, Reflect)]
#[zshape(namespace = "shop", rename_all = "PascalCase")]
struct Entity {
    id: i32,
    name: String,
    price: f64,
}

#[derive(Debug, Default, PartialEq, Reflect)]
#[zshape(namespace = "app")]
struct Node<T> {
    value: T,
    next: Option<Box<Node<T>>>,
}

fn widget() -> Entity {
    Entity {
        id: 1,
        name: "Widget".into(),
        price: 9.99,
    }
}

#[test_log::test]
fn entity_round_trip() {
    let mapper = ObjectMapper::new();
    let dynamic = mapper.to_dynamic(&widget()).unwrap();

    let names: Vec<_> = dynamic.properties().unwrap().names().collect();
    assert_eq!(names, ["Id", "Name", "Price"]);
    assert!(dynamic.ty().unwrap().full_name().ends_with("Entity"));

    let json = zshape::json::to_string(&dynamic).unwrap();
    let back = zshape::json::from_str(&json).unwrap();
    assert_eq!(back.get("Id"), Some(&Value::from(1)));
    assert_eq!(back.get("Name"), Some(&Value::from("Widget")));
    assert_eq!(back.get("Price"), Some(&Value::from(9.99)));
    assert_eq!(back.ty().unwrap().full_name(), "shop::Entity");

    let entity: Entity = mapper.from_dynamic(&back).unwrap();
    assert_eq!(entity, widget());
}

#[test_log::test]
fn registered_types_materialize_natively() {
    let mapper = ObjectMapper::new();
    let json = zshape::json::to_string(&mapper.to_dynamic(&widget()).unwrap()).unwrap();
    let dynamic = zshape::json::from_str(&json).unwrap();

    let resolver = TypeResolver::with_registry(TypeRegistry::new().with::<Entity>());
    let entity = mapper
        .materialize(&dynamic, &resolver)
        .unwrap()
        .downcast::<Entity>()
        .unwrap();
    assert_eq!(entity, widget());
}

#[test_log::test]
fn unknown_types_are_synthesized() {
    let mapper = ObjectMapper::new();
    let json = zshape::json::to_string(&mapper.to_dynamic(&widget()).unwrap()).unwrap();
    let dynamic = zshape::json::from_str(&json).unwrap();

    let resolver = TypeResolver::new();
    let record = mapper
        .materialize(&dynamic, &resolver)
        .unwrap()
        .into_synthesized()
        .unwrap();
    assert_eq!(record.handle().full_name(), "shop::Entity");
    assert_eq!(record.get("Id"), Some(&Value::from(1)));
    assert_eq!(record.get("Price"), Some(&Value::from(9.99)));

    let again = resolver.resolve(dynamic.ty().unwrap()).unwrap();
    assert_eq!(&again, record.handle());
    assert_eq!(resolver.cached_shapes(), 1);
}

#[test]
fn recursive_generic_descriptor() {
    let node = Node {
        value: 1,
        next: Some(Box::new(Node {
            value: 2,
            next: None,
        })),
    };

    let mapper = ObjectMapper::new();
    let dynamic = mapper.to_dynamic(&node).unwrap();
    let ty = dynamic.ty().unwrap();
    assert_eq!(ty.full_name(), "app::Node<i32>");
    assert!(ty.property("next").unwrap().value_type().ptr_eq(ty));

    let json = zshape::json::to_value(&dynamic).unwrap();
    let back = zshape::json::from_value(&json).unwrap();
    let back_ty = back.ty().unwrap();
    assert!(back_ty.property("next").unwrap().value_type().ptr_eq(back_ty));

    let read: Node<i32> = mapper.from_dynamic(&back).unwrap();
    assert_eq!(read, node);
}

#[test]
fn shared_instances_keep_their_identity() {
    let mapper = ObjectMapper::new();
    let shared = Arc::new(mapper.to_dynamic(&widget()).unwrap());
    let order = DynamicValue::record()
        .with_property("Item", shared.clone())
        .unwrap()
        .with_property("Gift", shared)
        .unwrap();

    let json = zshape::json::to_string(&order).unwrap();
    assert_eq!(json.matches("\"$ref\"").count(), 1);
    assert_eq!(json.matches("\"Value\":\"Widget\"").count(), 1);

    let back = zshape::json::from_str(&json).unwrap();
    let item = back.get("Item").unwrap().as_dynamic().unwrap();
    let gift = back.get("Gift").unwrap().as_dynamic().unwrap();
    assert!(Arc::ptr_eq(item, gift));
}

#[test]
fn property_names_are_unique() {
    let mut record = DynamicValue::record().with_property("Id", 1).unwrap();

    let err = record.insert(Property::new("Id", 2)).unwrap_err();
    assert!(matches!(err, Error::PropertyNameCollision { .. }));
    assert_eq!(record.get("Id"), Some(&Value::from(1)));

    let properties = record.properties_mut().unwrap();
    let removed = properties.remove("Id").unwrap();
    assert_eq!(removed.value(), &Value::from(1));
    assert!(properties.is_empty());
}
