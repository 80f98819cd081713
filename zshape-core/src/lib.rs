#![deny(
    missing_debug_implementations,
    nonstandard_style,
    rust_2018_idioms,
    missing_docs
)]
#![warn(unreachable_pub)]
#![doc = include_str!("../README.md")]

#[macro_use]
#[doc(hidden)]
pub mod log;

pub mod descriptor;
pub use descriptor::{
    is_anonymous_type_name, ConstructorDescriptor, Describer, FieldDescriptor, MemberDescriptor,
    MethodDescriptor, NativeKey, NativeKind, NativeProperty, NativeType, NativeTypeRef,
    PropertyDescriptor, TypeDescriptor, TypeEdges, TypeGraph, TypeHeader, TypeIndex,
    ANONYMOUS_NAME_PREFIX, CONSTRUCTOR_NAME, OBJECT_TYPE_NAME,
};
pub mod dynamic;
pub use dynamic::{DynamicValue, Property, PropertySet, Value};
mod error;
pub use error::{Error, Result};
pub mod mapper;
pub use mapper::{
    CoercionTable, DefaultPolicy, MapContext, MappingPolicy, Materialized, ObjectMapper, TypeHint,
};
pub mod reflect;
pub use reflect::{scalar_native_type, Bytes, FromDynamic, Record, Reflect, Reflected};
pub mod resolve;
pub use resolve::{
    ClosedType, NativeEntry, SynthesizedRecord, SynthesizedType, TypeHandle, TypeNameResolver,
    TypeRegistry, TypeResolver,
};
mod scalar;
pub use scalar::{Scalar, ScalarKind};
pub mod session;
pub use session::{ObjectKey, ReferenceSession, SessionAdapter, SessionState, Visit};
pub mod token;
