//! Turning type descriptors back into usable types.
//!
//! A descriptor resolves to a registered native type when one with the same full name is known,
//! and to a synthesized type otherwise. Synthesized types are cached per resolver by shape, so the
//! same shape always resolves to the same handle.

use std::sync::Arc;

use crate::{
    DynamicValue, Error, Result, ScalarKind, TypeDescriptor, TypeEdges, TypeGraph, TypeHeader,
    ANONYMOUS_NAME_PREFIX, OBJECT_TYPE_NAME,
};

mod handle;
pub use handle::{ClosedType, NativeEntry, SynthesizedType, TypeHandle};
mod record;
pub use record::SynthesizedRecord;
mod registry;
pub use registry::{TypeNameResolver, TypeRegistry};
mod signature;
use signature::{ShapeCache, ShapeSignature};

/// Resolves [`TypeDescriptor`]s to [`TypeHandle`]s.
///
/// Safe to share between threads.
#[derive(Default)]
pub struct TypeResolver {
    registry: TypeRegistry,
    fallback: Option<Arc<dyn TypeNameResolver>>,
    shapes: ShapeCache,
}

impl TypeResolver {
    /// A resolver without registered types.
    pub fn new() -> Self {
        Self::default()
    }

    /// A resolver for the types in `registry`.
    pub fn with_registry(registry: TypeRegistry) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }

    /// Consult `fallback` for full names the registry does not know.
    pub fn with_fallback(mut self, fallback: impl TypeNameResolver + 'static) -> Self {
        self.fallback = Some(Arc::new(fallback));
        self
    }

    /// The registered native types.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Number of cached shapes.
    pub fn cached_shapes(&self) -> usize {
        self.shapes.len()
    }

    /// Resolve `ty`.
    ///
    /// Fails with [`Error::ShapeSynthesisCycle`] if a type that needs synthesizing refers to
    /// itself. Nothing is cached for a failed resolution.
    pub fn resolve(&self, ty: &TypeDescriptor) -> Result<TypeHandle> {
        Resolution {
            resolver: self,
            stack: Vec::new(),
        }
        .resolve(ty)
    }

    /// The type of an unannotated value: records resolve to an anonymous type of `Object`
    /// properties, anything else to `Object`.
    pub fn resolve_untyped(&self, value: &DynamicValue) -> Result<TypeHandle> {
        let Some(properties) = value.properties() else {
            return Ok(TypeHandle::Object);
        };

        let graph = TypeGraph::new();
        let object = graph.define(TypeHeader::new(OBJECT_TYPE_NAME), TypeEdges::new())?;
        let edges = properties.names().fold(TypeEdges::new(), |edges, name| {
            edges.property(name, object.clone())
        });
        let header = TypeHeader::new(format!("{ANONYMOUS_NAME_PREFIX}Record")).anonymous();

        self.resolve(&graph.define(header, edges)?)
    }

    fn lookup(&self, full_name: &str) -> Option<TypeHandle> {
        if let Some(entry) = self.registry.get(full_name) {
            return Some(TypeHandle::Native(entry.clone()));
        }

        self.fallback.as_ref()?.resolve_type_name(full_name)
    }
}

impl core::fmt::Debug for TypeResolver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TypeResolver")
            .field("registry", &self.registry)
            .field("fallback", &self.fallback.is_some())
            .field("shapes", &self.shapes.len())
            .finish()
    }
}

/// One `resolve` call: the descriptors being resolved, outermost first.
struct Resolution<'r> {
    resolver: &'r TypeResolver,
    stack: Vec<TypeDescriptor>,
}

impl Resolution<'_> {
    fn resolve(&mut self, ty: &TypeDescriptor) -> Result<TypeHandle> {
        if ty.is_array() {
            let element = match ty.element_type() {
                Some(element) => self.resolve(&element)?,
                None => TypeHandle::Object,
            };
            return Ok(TypeHandle::Array(Arc::new(element)));
        }
        if let Some(builtin) = builtin(ty) {
            return Ok(builtin);
        }

        if self.stack.iter().any(|outer| outer.ptr_eq(ty)) {
            return Err(Error::ShapeSynthesisCycle {
                type_name: ty.full_name(),
            });
        }
        self.stack.push(ty.clone());
        let resolved = self.resolve_named(ty);
        self.stack.pop();

        resolved
    }

    fn resolve_named(&mut self, ty: &TypeDescriptor) -> Result<TypeHandle> {
        let arguments = ty
            .generic_arguments()
            .iter()
            .map(|argument| self.resolve(argument))
            .collect::<Result<Vec<_>>>()?;
        let full_name = closed_name(ty, &arguments);
        if let Some(handle) = self.resolver.lookup(&full_name) {
            trace!("Resolved `{}` to a known type", full_name);
            return Ok(handle);
        }

        let properties = ty
            .properties()
            .iter()
            .map(|property| {
                let handle = self.resolve(property.value_type())?;
                Ok((property.name().to_owned(), handle))
            })
            .collect::<Result<Vec<_>>>()?;

        if ty.is_anonymous_type() {
            Ok(self.anonymous(ty, properties))
        } else {
            Ok(self.named(ty, full_name, properties))
        }
    }

    fn named(
        &self,
        ty: &TypeDescriptor,
        full_name: String,
        properties: Vec<(String, TypeHandle)>,
    ) -> TypeHandle {
        let signature = ShapeSignature::Named {
            full_name,
            properties: properties.clone(),
        };

        self.resolver.shapes.get_or_insert_with(signature, || {
            TypeHandle::Synthesized(Arc::new(SynthesizedType::named(
                ty.name().into(),
                namespace_of(ty),
                properties,
            )))
        })
    }

    fn anonymous(&self, ty: &TypeDescriptor, properties: Vec<(String, TypeHandle)>) -> TypeHandle {
        let (names, arguments): (Vec<_>, Vec<_>) = properties.into_iter().unzip();

        let definition = self.resolver.shapes.get_or_insert_with(
            ShapeSignature::AnonymousDefinition {
                names: names.clone(),
            },
            || {
                TypeHandle::Synthesized(Arc::new(SynthesizedType::generic_definition(
                    ty.name().into(),
                    namespace_of(ty),
                    names.clone(),
                )))
            },
        );
        let TypeHandle::Synthesized(definition) = definition else {
            return definition;
        };

        self.resolver.shapes.get_or_insert_with(
            ShapeSignature::AnonymousClosed {
                names,
                arguments: arguments.clone(),
            },
            || TypeHandle::Closed(Arc::new(ClosedType::new(definition, arguments))),
        )
    }
}

/// Scalars and `Object`: plain names without namespace or arguments.
fn builtin(ty: &TypeDescriptor) -> Option<TypeHandle> {
    if ty.namespace().is_some() || ty.is_generic_type() || ty.declaring_type().is_some() {
        return None;
    }
    if ty.name() == OBJECT_TYPE_NAME {
        return Some(TypeHandle::Object);
    }

    ScalarKind::from_name(ty.name()).map(TypeHandle::Scalar)
}

fn closed_name(ty: &TypeDescriptor, arguments: &[TypeHandle]) -> String {
    let mut name = ty.qualified_name();
    if !arguments.is_empty() {
        let arguments: Vec<_> = arguments.iter().map(TypeHandle::full_name).collect();
        name.push('<');
        name.push_str(&arguments.join(", "));
        name.push('>');
    }

    name
}

fn namespace_of(ty: &TypeDescriptor) -> Option<String> {
    match ty.declaring_type() {
        Some(declaring) => Some(declaring.full_name()),
        None => ty.namespace().map(Into::into),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(graph: &Arc<TypeGraph>, kind: ScalarKind) -> TypeDescriptor {
        graph
            .define(TypeHeader::new(kind.name()), TypeEdges::new())
            .unwrap()
    }

    fn shape(name: &str, properties: &[(&str, ScalarKind)]) -> TypeDescriptor {
        let graph = TypeGraph::new();
        let edges = properties.iter().fold(TypeEdges::new(), |edges, (n, kind)| {
            edges.property(*n, scalar(&graph, *kind))
        });
        let header = TypeHeader::new(name).with_namespace("shop");
        let header = if name.starts_with(ANONYMOUS_NAME_PREFIX) {
            header.anonymous()
        } else {
            header
        };

        graph.define(header, edges).unwrap()
    }

    #[test_log::test]
    fn same_shape_same_handle() {
        let resolver = TypeResolver::new();
        let entity = [("Id", ScalarKind::I32), ("Name", ScalarKind::String)];

        let first = resolver.resolve(&shape("Entity", &entity)).unwrap();
        let second = resolver.resolve(&shape("Entity", &entity)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.full_name(), "shop::Entity");

        let changed = [("Id", ScalarKind::I64), ("Name", ScalarKind::String)];
        let third = resolver.resolve(&shape("Entity", &changed)).unwrap();
        assert_ne!(first, third);
    }

    #[test]
    fn synthesized_types_have_fields_and_a_constructor() {
        let resolver = TypeResolver::new();
        let handle = resolver
            .resolve(&shape(
                "Entity",
                &[("Id", ScalarKind::I32), ("Name", ScalarKind::String)],
            ))
            .unwrap();

        let members = handle.members();
        let names: Vec<_> = members.iter().map(|m| m.name()).collect();
        assert_eq!(names, ["Id", "Name", ".ctor"]);
        assert!(members[..2]
            .iter()
            .all(|m| matches!(m, crate::MemberDescriptor::Field(_))));
        assert!(members[2].parameters().is_empty());

        let mut record = handle.create_instance().unwrap().into_synthesized().unwrap();
        assert_eq!(record.get("Id"), Some(&crate::Value::from(0)));
        record.set("Id", 7i64).unwrap();
        assert_eq!(record.get("Id"), Some(&crate::Value::from(7)));
        assert!(matches!(
            record.set("Price", 1),
            Err(Error::UnknownProperty { .. })
        ));
    }

    #[test]
    fn anonymous_shapes_share_a_definition() {
        let resolver = TypeResolver::new();
        let ints = resolver
            .resolve(&shape("<>Anon", &[("A", ScalarKind::I32), ("B", ScalarKind::I32)]))
            .unwrap();
        let mixed = resolver
            .resolve(&shape("<>Anon", &[("A", ScalarKind::String), ("B", ScalarKind::I32)]))
            .unwrap();

        let (TypeHandle::Closed(ints), TypeHandle::Closed(mixed)) = (&ints, &mixed) else {
            panic!("anonymous shapes resolve to closed definitions");
        };
        assert!(Arc::ptr_eq(ints.definition(), mixed.definition()));
        assert_ne!(ints.arguments(), mixed.arguments());
    }

    #[test]
    fn constructor_arguments_use_the_mapper_coercions() {
        let handle = TypeResolver::new()
            .resolve(&shape("<>Anon", &[("A", ScalarKind::I32)]))
            .unwrap();
        let mapper = crate::ObjectMapper::new().with_coercions(
            crate::CoercionTable::new().with("i32", |scalar| match scalar {
                crate::Scalar::String(s) if s == "five" => Ok(crate::Scalar::I32(5)),
                other => Ok(other.clone()),
            }),
        );

        let record = handle
            .create_instance_with_in(&mapper, vec![crate::Value::from("five")])
            .unwrap()
            .into_synthesized()
            .unwrap();
        assert_eq!(record.get("A"), Some(&crate::Value::from(5)));
        assert!(handle
            .create_instance_with(vec![crate::Value::from("five")])
            .is_err());
    }

    #[test]
    fn anonymous_instances_are_read_only() {
        let resolver = TypeResolver::new();
        let handle = resolver
            .resolve(&shape("<>Anon", &[("A", ScalarKind::I32)]))
            .unwrap();

        assert!(matches!(
            handle.create_instance(),
            Err(Error::ArgumentCount {
                expected: 1,
                found: 0,
                ..
            })
        ));
        let mut record = handle
            .create_instance_with(vec![crate::Value::from("5")])
            .unwrap()
            .into_synthesized()
            .unwrap();
        assert_eq!(record.get("A"), Some(&crate::Value::from(5)));
        assert!(matches!(
            record.set("A", 6),
            Err(Error::ReadOnlyProperty { .. })
        ));

        let ctor = handle.members().pop().unwrap();
        assert_eq!(ctor.parameters().len(), 1);
    }

    #[test]
    fn self_reference_fails_without_caching() {
        let graph = TypeGraph::new();
        let node = graph.reserve(TypeHeader::new("Node").with_namespace("shop"));
        node.complete(
            TypeEdges::new()
                .property("Value", scalar(&graph, ScalarKind::I32))
                .property("Next", node.clone()),
        )
        .unwrap();

        let resolver = TypeResolver::new();
        let err = resolver.resolve(&node).unwrap_err();
        assert_eq!(
            err,
            Error::ShapeSynthesisCycle {
                type_name: "shop::Node".into()
            }
        );
        assert_eq!(resolver.cached_shapes(), 0);
    }

    #[test]
    fn fallback_is_consulted_after_the_registry() {
        let resolver = TypeResolver::new().with_fallback(|name: &str| {
            (name == "shop::Entity").then_some(TypeHandle::Scalar(ScalarKind::String))
        });

        let handle = resolver
            .resolve(&shape("Entity", &[("Id", ScalarKind::I32)]))
            .unwrap();
        assert_eq!(handle, TypeHandle::Scalar(ScalarKind::String));
        assert_eq!(resolver.cached_shapes(), 0);
    }

    #[test]
    fn arrays_and_builtins() {
        let graph = TypeGraph::new();
        let element = scalar(&graph, ScalarKind::U8);
        let array = graph
            .define(
                TypeHeader::new("Vec").array(),
                TypeEdges::new().generic_argument(element),
            )
            .unwrap();

        let resolver = TypeResolver::new();
        let handle = resolver.resolve(&array).unwrap();
        assert_eq!(
            handle,
            TypeHandle::Array(Arc::new(TypeHandle::Scalar(ScalarKind::U8)))
        );
        assert_eq!(handle.full_name(), "Vec<u8>");
    }

    #[test]
    fn synthesized_types_of_dropped_resolvers_keep_their_properties() {
        let mapper = crate::ObjectMapper::new();

        for i in 0..64 {
            let name = format!("T{i}");
            let property = format!("P{i}");
            let record = TypeResolver::new()
                .resolve(&shape(&name, &[(property.as_str(), ScalarKind::I32)]))
                .unwrap()
                .create_instance()
                .unwrap()
                .into_synthesized()
                .unwrap();

            let dynamic = mapper.to_dynamic(&record).unwrap();
            assert_eq!(dynamic.get(&property), Some(&crate::Value::from(0)), "{name}");
        }
    }
}
