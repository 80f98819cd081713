use std::{collections::HashMap, sync::Arc};

use super::{NativeKey, NativeKind, NativeType, TypeDescriptor, TypeEdges, TypeGraph, TypeHeader};

/// Builds [`TypeDescriptor`]s from [`NativeType`]s.
///
/// Every type is described at most once per describer (once shallow, once with properties), so
/// all descriptors it hands out live in one graph and recursive types yield cyclic graphs instead
/// of infinite ones.
#[derive(Debug)]
pub struct Describer {
    graph: Arc<TypeGraph>,
    full: HashMap<NativeKey, TypeDescriptor>,
    shallow: HashMap<NativeKey, TypeDescriptor>,
}

impl Describer {
    /// A describer over a new graph.
    pub fn new() -> Self {
        Self::with_graph(TypeGraph::new())
    }

    /// A describer appending to `graph`.
    pub fn with_graph(graph: Arc<TypeGraph>) -> Self {
        Self {
            graph,
            full: HashMap::new(),
            shallow: HashMap::new(),
        }
    }

    /// The graph descriptors are added to.
    pub fn graph(&self) -> &Arc<TypeGraph> {
        &self.graph
    }

    /// Describe `native`.
    ///
    /// With `include_properties` unset only the name and generic shape are described.
    pub fn describe(&mut self, native: &NativeType, include_properties: bool) -> TypeDescriptor {
        let visited = if include_properties {
            &self.full
        } else {
            &self.shallow
        };
        if let Some(descriptor) = visited.get(&native.key()) {
            return descriptor.clone();
        }

        let mut header = TypeHeader::new(native.name());
        header.namespace = native.namespace().map(Into::into);
        header.is_array = matches!(native.kind(), NativeKind::Sequence(_));
        header.is_generic_type = !native.generic_arguments().is_empty();
        header.is_generic_type_definition = native.is_generic_definition();
        header.is_anonymous_type = native.is_anonymous();

        // Visible before its edges are, so recursion ends on this node.
        let descriptor = self.graph.reserve(header);
        let visited = if include_properties {
            &mut self.full
        } else {
            &mut self.shallow
        };
        visited.insert(native.key(), descriptor.clone());

        let mut edges = TypeEdges::new();
        for argument in native.generic_arguments() {
            edges = edges.generic_argument(self.describe(&argument.get(), include_properties));
        }
        if let Some(declaring) = native.declaring_type() {
            edges = edges.declaring_type(self.describe(&declaring.get(), false));
        }
        if include_properties {
            for property in native.properties() {
                let ty = self.describe(&property.ty().get(), true);
                edges = edges.property(property.name(), ty);
            }
        }
        descriptor.fill(edges);
        trace!("Described type `{}`", descriptor.full_name());

        descriptor
    }
}

impl Default for Describer {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeGraph {
    /// Describe `native` in a new graph.
    pub fn describe(native: &NativeType, include_properties: bool) -> TypeDescriptor {
        Describer::new().describe(native, include_properties)
    }
}
