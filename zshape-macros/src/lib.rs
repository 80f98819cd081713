#![deny(
    missing_debug_implementations,
    nonstandard_style,
    rust_2018_idioms,
    missing_docs
)]
#![warn(unreachable_pub)]
#![doc = include_str!("../README.md")]

use proc_macro::TokenStream;

mod reflect;
mod utils;

/// Derives `Reflect`, `FromDynamic` and `Record` for structs.
///
/// Every named field becomes a property, in declaration order. The struct must implement
/// `Default`: that is how the mapper creates an instance before setting its properties, and
/// properties missing from a dynamic value keep their default.
///
/// The native type is named after the struct and lives in the namespace of the module the
/// struct is declared in. Type parameters become generic arguments and must themselves implement
/// `Reflect` (and `FromDynamic` for reading).
///
/// # Attributes
///
/// On the struct:
///
/// - `#[zshape(rename = "Name")]`: the type name.
/// - `#[zshape(namespace = "app::model")]`: the namespace, instead of the module path.
/// - `#[zshape(rename_all = "PascalCase")]`: rename every field (`PascalCase` or `camelCase`).
/// - `#[zshape(anonymous)]`: flag the type anonymous, so it resolves to a structural type.
/// - `#[zshape(crate = "path")]`: path to the zshape crate, `::zshape` by default.
///
/// On fields:
///
/// - `#[zshape(rename = "Name")]`: the property name.
/// - `#[zshape(skip)]`: not a property; keeps its default when read back.
///
/// # Limitations
///
/// Tuple structs, enums and unions are not supported: properties need names.
///
/// ```rust,compile_fail
/// # use zshape::Reflect;
/// #[derive(Default, Reflect)]  // This will fail to compile
/// struct Point(f32, f32);
/// ```
///
/// # Examples
///
/// ```rust
/// use zshape::{ObjectMapper, Reflect, Value};
///
/// #[derive(Debug, Default, PartialEq, Reflect)]
/// #[zshape(namespace = "shop", rename_all = "PascalCase")]
/// struct Entity {
///     id: i32,
///     name: String,
///     #[zshape(skip)]
///     cached: Option<String>,
/// }
///
/// let entity = Entity {
///     id: 1,
///     name: "Widget".into(),
///     cached: Some("ignored".into()),
/// };
///
/// let mapper = ObjectMapper::new();
/// let dynamic = mapper.to_dynamic(&entity).unwrap();
/// assert_eq!(dynamic.ty().unwrap().full_name(), "shop::Entity");
/// assert_eq!(dynamic.get("Id"), Some(&Value::from(1)));
/// assert_eq!(dynamic.get("Name"), Some(&Value::from("Widget")));
/// assert!(dynamic.get("Cached").is_none());
///
/// let back: Entity = mapper.from_dynamic(&dynamic).unwrap();
/// assert_eq!(back, Entity { cached: None, ..entity });
/// ```
#[proc_macro_derive(Reflect, attributes(zshape))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    reflect::derive_reflect(input)
}
