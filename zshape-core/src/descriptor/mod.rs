//! Type descriptors: serializable, possibly cyclic descriptions of a type's shape.

mod describer;
pub use describer::Describer;
mod graph;
pub use graph::{TypeDescriptor, TypeEdges, TypeGraph, TypeHeader, TypeIndex};
mod member;
pub use member::{
    ConstructorDescriptor, FieldDescriptor, MemberDescriptor, MethodDescriptor,
    PropertyDescriptor, CONSTRUCTOR_NAME,
};
mod native;
pub use native::{
    is_anonymous_type_name, NativeKey, NativeKind, NativeProperty, NativeType, NativeTypeRef,
    ANONYMOUS_NAME_PREFIX, OBJECT_TYPE_NAME,
};
