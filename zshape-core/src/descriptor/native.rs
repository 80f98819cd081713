use std::{
    any::TypeId,
    borrow::Cow,
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, OnceLock,
    },
};

use parking_lot::Mutex;

use crate::ScalarKind;

/// Name of the type every heterogeneous value is typed as.
pub const OBJECT_TYPE_NAME: &str = "Object";

/// Prefix marking a type name as anonymous.
pub const ANONYMOUS_NAME_PREFIX: &str = "<>";

/// Whether `name` follows the anonymous type naming convention.
pub fn is_anonymous_type_name(name: &str) -> bool {
    name.starts_with(ANONYMOUS_NAME_PREFIX)
}

/// Identity of a native type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeKey {
    /// A compiled Rust type.
    Rust(TypeId),
    /// A type synthesized at runtime. Ids are never reused within a process.
    Synthetic(u64),
}

impl NativeKey {
    /// A fresh synthetic key.
    pub fn synthetic() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);

        NativeKey::Synthetic(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// The synthetic key of a runtime array of `element`s.
    ///
    /// The same element key always yields the same array key.
    pub fn array_of(element: NativeKey) -> Self {
        static ARRAYS: OnceLock<Mutex<HashMap<NativeKey, NativeKey>>> = OnceLock::new();

        *ARRAYS
            .get_or_init(Default::default)
            .lock()
            .entry(element)
            .or_insert_with(NativeKey::synthetic)
    }
}

/// A lazy reference to a [`NativeType`].
///
/// Recursive types refer to each other through function pointers, so describing one never needs
/// the whole (possibly infinite) tree up front.
#[derive(Debug, Clone)]
pub enum NativeTypeRef {
    /// Computed on demand.
    Static(fn() -> NativeType),
    /// Already computed.
    Shared(Arc<NativeType>),
}

impl NativeTypeRef {
    /// A reference to `T`'s native type.
    pub fn of<T: crate::Reflect>() -> Self {
        NativeTypeRef::Static(T::native_type)
    }

    /// The referenced type.
    pub fn get(&self) -> NativeType {
        match self {
            NativeTypeRef::Static(f) => f(),
            NativeTypeRef::Shared(ty) => NativeType::clone(ty),
        }
    }
}

impl From<NativeType> for NativeTypeRef {
    fn from(ty: NativeType) -> Self {
        NativeTypeRef::Shared(Arc::new(ty))
    }
}

/// How values of a native type map onto dynamic values.
#[derive(Debug, Clone)]
pub enum NativeKind {
    /// A scalar, mapped to a wrapped value.
    Scalar(ScalarKind),
    /// A collection of the element type, mapped to a wrapped array.
    Sequence(NativeTypeRef),
    /// A plain object with named properties, mapped to a record.
    Record,
    /// Any value; the concrete shape is only known per instance.
    Object,
}

/// A named, typed property of a native type.
#[derive(Debug, Clone)]
pub struct NativeProperty {
    name: Cow<'static, str>,
    ty: NativeTypeRef,
}

impl NativeProperty {
    /// Create a property.
    pub fn new(name: impl Into<Cow<'static, str>>, ty: NativeTypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    /// The property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type.
    pub fn ty(&self) -> &NativeTypeRef {
        &self.ty
    }
}

/// Host-side description of a native type.
#[derive(Debug, Clone)]
pub struct NativeType {
    key: NativeKey,
    name: Cow<'static, str>,
    namespace: Option<Cow<'static, str>>,
    kind: NativeKind,
    generic_arguments: Vec<NativeTypeRef>,
    properties: Vec<NativeProperty>,
    declaring_type: Option<NativeTypeRef>,
    anonymous: bool,
    synthesized: bool,
    generic_definition: bool,
}

impl NativeType {
    /// A native type of the given kind.
    pub fn new(key: NativeKey, name: impl Into<Cow<'static, str>>, kind: NativeKind) -> Self {
        let generic_arguments = match &kind {
            NativeKind::Sequence(element) => vec![element.clone()],
            _ => Vec::new(),
        };

        Self {
            key,
            name: name.into(),
            namespace: None,
            kind,
            generic_arguments,
            properties: Vec::new(),
            declaring_type: None,
            anonymous: false,
            synthesized: false,
            generic_definition: false,
        }
    }

    /// The scalar type `T`.
    pub fn scalar<T: 'static>(kind: ScalarKind) -> Self {
        Self::new(NativeKey::Rust(TypeId::of::<T>()), kind.name(), NativeKind::Scalar(kind))
    }

    /// The collection type `T` holding `element`s.
    pub fn sequence<T: 'static>(name: &'static str, element: NativeTypeRef) -> Self {
        Self::new(
            NativeKey::Rust(TypeId::of::<T>()),
            name,
            NativeKind::Sequence(element),
        )
    }

    /// The record type `T`.
    pub fn record<T: 'static>(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(NativeKey::Rust(TypeId::of::<T>()), name, NativeKind::Record)
    }

    /// The heterogeneous type `T`.
    pub fn object<T: 'static>() -> Self {
        Self::new(
            NativeKey::Rust(TypeId::of::<T>()),
            OBJECT_TYPE_NAME,
            NativeKind::Object,
        )
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<Cow<'static, str>>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the generic arguments.
    pub fn with_generic_arguments(mut self, arguments: Vec<NativeTypeRef>) -> Self {
        self.generic_arguments = arguments;
        self
    }

    /// Set the properties.
    pub fn with_properties(mut self, properties: Vec<NativeProperty>) -> Self {
        self.properties = properties;
        self
    }

    /// Set the declaring type.
    pub fn with_declaring_type(mut self, declaring_type: NativeTypeRef) -> Self {
        self.declaring_type = Some(declaring_type);
        self
    }

    /// Flag the type as anonymous.
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    /// Flag the type as synthesized at runtime.
    pub fn synthesized(mut self) -> Self {
        self.synthesized = true;
        self
    }

    /// Flag the type as an open generic definition.
    pub fn generic_definition(mut self) -> Self {
        self.generic_definition = true;
        self
    }

    /// The type's identity.
    pub fn key(&self) -> NativeKey {
        self.key
    }

    /// The simple name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The namespace.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The kind.
    pub fn kind(&self) -> &NativeKind {
        &self.kind
    }

    /// The scalar kind, for scalar types.
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self.kind {
            NativeKind::Scalar(kind) => Some(kind),
            _ => None,
        }
    }

    /// The element type, for collection types.
    pub fn element_type(&self) -> Option<&NativeTypeRef> {
        match &self.kind {
            NativeKind::Sequence(element) => Some(element),
            _ => None,
        }
    }

    /// Ordered generic arguments.
    pub fn generic_arguments(&self) -> &[NativeTypeRef] {
        &self.generic_arguments
    }

    /// Ordered properties.
    pub fn properties(&self) -> &[NativeProperty] {
        &self.properties
    }

    /// The declaring type.
    pub fn declaring_type(&self) -> Option<&NativeTypeRef> {
        self.declaring_type.as_ref()
    }

    /// Whether the type is anonymous: flagged, synthesized or named by the anonymous convention.
    pub fn is_anonymous(&self) -> bool {
        self.anonymous || self.synthesized || is_anonymous_type_name(&self.name)
    }

    /// Whether the type was synthesized at runtime.
    pub fn is_synthesized(&self) -> bool {
        self.synthesized
    }

    /// Whether the type is an open generic definition.
    pub fn is_generic_definition(&self) -> bool {
        self.generic_definition
    }

    /// Whether values of this type map to a wrapped array.
    pub fn is_sequence(&self) -> bool {
        matches!(self.kind, NativeKind::Sequence(_))
    }

    /// `namespace::Declaring::Name<Arg, ...>`, matching [`TypeDescriptor::full_name`].
    ///
    /// [`TypeDescriptor::full_name`]: super::TypeDescriptor::full_name
    pub fn full_name(&self) -> String {
        let mut out = String::new();
        if let Some(declaring) = &self.declaring_type {
            out.push_str(&declaring.get().full_name());
            out.push_str("::");
        } else if let Some(namespace) = &self.namespace {
            out.push_str(namespace);
            out.push_str("::");
        }
        out.push_str(&self.name);
        if !self.generic_arguments.is_empty() {
            let arguments: Vec<_> = self
                .generic_arguments
                .iter()
                .map(|argument| argument.get().full_name())
                .collect();
            out.push('<');
            out.push_str(&arguments.join(", "));
            out.push('>');
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_keys_are_unique() {
        let first = NativeKey::synthetic();
        let second = NativeKey::synthetic();
        assert_ne!(first, second);

        let array = NativeKey::array_of(first);
        assert_eq!(NativeKey::array_of(first), array);
        assert_ne!(NativeKey::array_of(second), array);
        assert_ne!(array, first);
    }

    #[test]
    fn sequences_carry_their_element_as_argument() {
        let ints = NativeType::sequence::<Vec<i32>>(
            "Vec",
            NativeTypeRef::Static(|| NativeType::scalar::<i32>(ScalarKind::I32)),
        );

        assert!(ints.is_sequence());
        assert_eq!(ints.generic_arguments().len(), 1);
        assert_eq!(ints.full_name(), "Vec<i32>");
    }

    #[test]
    fn anonymous_flags() {
        let named = NativeType::record::<()>("Entity").with_namespace("app");
        assert!(!named.is_anonymous());
        assert_eq!(named.full_name(), "app::Entity");

        assert!(NativeType::record::<()>("<>Pair").is_anonymous());
        assert!(NativeType::record::<()>("Pair").anonymous().is_anonymous());
        assert!(NativeType::record::<()>("Pair").synthesized().is_anonymous());
    }
}
