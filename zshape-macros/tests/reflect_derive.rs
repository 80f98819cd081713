use zshape::{NativeKind, ObjectMapper, Reflect, Value};

#[derive(Debug, Default, PartialEq, Reflect)]
struct Person {
    name: String,
    age: i32,
    active: bool,
}

#[derive(Debug, Default, Reflect)]
struct Unit;

#[derive(Debug, Default, PartialEq, Reflect)]
#[zshape(rename = "Item", namespace = "shop", rename_all = "PascalCase")]
struct CatalogItem {
    item_id: u64,
    #[zshape(rename = "Label")]
    description: Option<String>,
    tags: Vec<String>,
    #[zshape(skip)]
    scratch: u8,
}

#[derive(Debug, Default, PartialEq, Reflect)]
struct Pair<T> {
    first: T,
    second: T,
}

#[derive(Debug, Default, Reflect)]
#[zshape(anonymous)]
struct Anon {
    a: i32,
}

fn property_names<T: Reflect>() -> Vec<String> {
    T::native_type()
        .properties()
        .iter()
        .map(|p| p.name().to_owned())
        .collect()
}

#[test]
fn named_struct_properties() {
    let native = Person::native_type();
    assert!(matches!(native.kind(), NativeKind::Record));
    assert_eq!(native.name(), "Person");
    assert_eq!(native.namespace(), Some("reflect_derive"));
    assert_eq!(native.full_name(), "reflect_derive::Person");
    assert_eq!(property_names::<Person>(), ["name", "age", "active"]);

    let ty = native.properties()[1].ty().get();
    assert_eq!(ty.full_name(), "i32");
}

#[test]
fn unit_struct_has_no_properties() {
    assert!(Unit::native_type().properties().is_empty());

    let mapper = ObjectMapper::new();
    let dynamic = mapper.to_dynamic(&Unit).unwrap();
    assert!(dynamic.is_record());
    assert!(dynamic.properties().unwrap().is_empty());
}

#[test]
fn attributes_rename_and_skip() {
    let native = CatalogItem::native_type();
    assert_eq!(native.full_name(), "shop::Item");
    assert_eq!(property_names::<CatalogItem>(), ["ItemId", "Label", "Tags"]);

    let item = CatalogItem {
        item_id: 7,
        description: Some("A widget".into()),
        tags: vec!["new".into()],
        scratch: 3,
    };
    let mapper = ObjectMapper::new();
    let dynamic = mapper.to_dynamic(&item).unwrap();
    assert_eq!(dynamic.get("ItemId"), Some(&Value::from(7u64)));
    assert_eq!(dynamic.get("Label"), Some(&Value::from("A widget")));
    assert_eq!(
        dynamic.get("Tags"),
        Some(&Value::Array(vec![Value::from("new")]))
    );

    let back: CatalogItem = mapper.from_dynamic(&dynamic).unwrap();
    assert_eq!(back, CatalogItem { scratch: 0, ..item });
}

#[test]
fn generic_structs_carry_arguments() {
    let native = Pair::<i32>::native_type();
    assert_eq!(native.full_name(), "reflect_derive::Pair<i32>");
    assert_eq!(native.generic_arguments().len(), 1);

    let pair = Pair {
        first: 1,
        second: 2,
    };
    let mapper = ObjectMapper::new();
    let dynamic = mapper.to_dynamic(&pair).unwrap();
    let descriptor = dynamic.ty().unwrap();
    assert!(descriptor.is_generic_type());
    assert_eq!(descriptor.generic_arguments()[0].name(), "i32");

    let back: Pair<i32> = mapper.from_dynamic(&dynamic).unwrap();
    assert_eq!(back, pair);
}

#[test]
fn anonymous_flag() {
    assert!(Anon::native_type().is_anonymous());
    assert!(!Person::native_type().is_anonymous());

    let mapper = ObjectMapper::new();
    let dynamic = mapper.to_dynamic(&Anon { a: 1 }).unwrap();
    assert!(dynamic.ty().unwrap().is_anonymous_type());
}

mod reexport {
    pub use zshape::*;
}

#[derive(Debug, Default, Reflect)]
#[zshape(crate = "crate::reexport")]
struct ThroughReexport {
    value: f64,
}

#[test]
fn crate_path_attribute() {
    assert_eq!(property_names::<ThroughReexport>(), ["value"]);
}
