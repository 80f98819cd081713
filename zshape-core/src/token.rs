//! The token contract every tree-structured wire codec exposes.
//!
//! Codecs are free to choose their own framing, but the names below are what a reader expects to
//! find on the nodes of a serialized [`DynamicValue`](crate::DynamicValue) or
//! [`TypeDescriptor`](crate::TypeDescriptor) graph.

/// Assigns an identity to the payload of the node it appears on.
pub const ID: &str = "$id";
/// Refers to a previously emitted [`ID`] in place of a full payload.
pub const REF: &str = "$ref";
/// The shape of a node: a type descriptor node.
pub const TYPE: &str = "$type";

/// The single wrapped native scalar of a wrapped node.
pub const VALUE: &str = "Value";
/// The wrapped homogeneous array of native scalars of a wrapped node.
pub const ITEMS: &str = "Items";
/// Like [`VALUE`], but the wrapped element is itself a dynamic value node.
pub const DYNAMIC_VALUE: &str = "DynamicValue";
/// Like [`ITEMS`], but each element carries its own scalar tag or is a dynamic value node.
pub const DYNAMIC_ITEMS: &str = "DynamicItems";

/// Ordered property triples of a record node.
pub const PROPERTIES: &str = "Properties";
/// Name of a property triple (also the name of a descriptor node).
pub const NAME: &str = "Name";
/// Scalar tag of a property triple or wrapped node.
pub const SCALAR_TYPE: &str = "Type";

/// Descriptor node: namespace.
pub const NAMESPACE: &str = "Namespace";
/// Descriptor node: whether the type is an array.
pub const IS_ARRAY: &str = "IsArray";
/// Descriptor node: whether the type is generic.
pub const IS_GENERIC_TYPE: &str = "IsGenericType";
/// Descriptor node: whether the type is an open generic definition.
pub const IS_GENERIC_TYPE_DEFINITION: &str = "IsGenericTypeDefinition";
/// Descriptor node: whether the type is anonymous.
pub const IS_ANONYMOUS_TYPE: &str = "IsAnonymousType";
/// Descriptor node: ordered generic arguments.
pub const GENERIC_ARGUMENTS: &str = "GenericArguments";
/// Descriptor node: the declaring type of a nested type.
pub const DECLARING_TYPE: &str = "DeclaringType";
/// Descriptor property entry: the declared type of the property.
pub const PROPERTY_TYPE: &str = "PropertyType";

/// Prefix of array scalar tags (`[]i32`).
pub const ARRAY_TAG_PREFIX: &str = "[]";
/// Element tag of arrays that are not homogeneous native scalars.
pub const OBJECT_TAG: &str = "Object";
