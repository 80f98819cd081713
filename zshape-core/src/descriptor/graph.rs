use core::{
    fmt,
    hash::{Hash, Hasher},
};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use super::PropertyDescriptor;
use crate::{Error, Result};

/// Position of a node in a [`TypeGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeIndex(u32);

impl TypeIndex {
    /// The raw index.
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

/// Arena holding the nodes of one or more (possibly cyclic) type descriptor graphs.
///
/// Nodes are only ever appended. A node is first reserved with its header and later completed
/// with its edges exactly once, which is what lets a node point at itself.
#[derive(Debug, Default)]
pub struct TypeGraph {
    nodes: RwLock<Vec<Arc<TypeNode>>>,
}

impl TypeGraph {
    /// Create an empty graph.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Append a node with the given header. Its edges are empty until
    /// [`TypeDescriptor::complete`] is called.
    pub fn reserve(self: &Arc<Self>, header: TypeHeader) -> TypeDescriptor {
        let node = Arc::new(TypeNode {
            header,
            edges: OnceLock::new(),
        });
        let mut nodes = self.nodes.write();
        let index = TypeIndex(nodes.len() as u32);
        nodes.push(node.clone());

        TypeDescriptor {
            graph: self.clone(),
            node,
            index,
        }
    }

    /// Append a complete node.
    pub fn define(self: &Arc<Self>, header: TypeHeader, edges: TypeEdges) -> Result<TypeDescriptor> {
        let descriptor = self.reserve(header);
        descriptor.complete(edges)?;

        Ok(descriptor)
    }

    /// The descriptor at `index`.
    pub fn get(self: &Arc<Self>, index: TypeIndex) -> Option<TypeDescriptor> {
        let node = self.nodes.read().get(index.get())?.clone();

        Some(TypeDescriptor {
            graph: self.clone(),
            node,
            index,
        })
    }

    /// Number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn node(&self, index: TypeIndex) -> Option<Arc<TypeNode>> {
        self.nodes.read().get(index.get()).cloned()
    }
}

/// The scalar part of a type descriptor node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeHeader {
    /// Simple name of the type, without namespace or generic arguments.
    pub name: String,
    /// Namespace (module path) of the type.
    pub namespace: Option<String>,
    /// Whether the type is an array (its element is the single generic argument).
    pub is_array: bool,
    /// Whether the type has generic arguments.
    pub is_generic_type: bool,
    /// Whether the type is an open generic definition.
    pub is_generic_type_definition: bool,
    /// Whether the type is anonymous or synthesized.
    pub is_anonymous_type: bool,
}

impl TypeHeader {
    /// A header with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Mark as an array type.
    pub fn array(mut self) -> Self {
        self.is_array = true;
        self.is_generic_type = true;
        self
    }

    /// Mark as a generic type.
    pub fn generic(mut self) -> Self {
        self.is_generic_type = true;
        self
    }

    /// Mark as an open generic definition.
    pub fn generic_definition(mut self) -> Self {
        self.is_generic_type = true;
        self.is_generic_type_definition = true;
        self
    }

    /// Mark as anonymous.
    pub fn anonymous(mut self) -> Self {
        self.is_anonymous_type = true;
        self
    }
}

/// The edges of a type descriptor node, used to complete it.
#[derive(Debug, Clone, Default)]
pub struct TypeEdges {
    generic_arguments: Vec<TypeDescriptor>,
    declaring_type: Option<TypeDescriptor>,
    properties: Vec<(String, TypeDescriptor)>,
}

impl TypeEdges {
    /// No edges.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a generic argument.
    pub fn generic_argument(mut self, ty: TypeDescriptor) -> Self {
        self.generic_arguments.push(ty);
        self
    }

    /// Set the declaring type.
    pub fn declaring_type(mut self, ty: TypeDescriptor) -> Self {
        self.declaring_type = Some(ty);
        self
    }

    /// Append a property.
    pub fn property(mut self, name: impl Into<String>, ty: TypeDescriptor) -> Self {
        self.properties.push((name.into(), ty));
        self
    }
}

#[derive(Debug)]
pub(crate) struct TypeNode {
    header: TypeHeader,
    edges: OnceLock<NodeEdges>,
}

#[derive(Debug, Default)]
struct NodeEdges {
    generic_arguments: Vec<TypeIndex>,
    declaring_type: Option<TypeIndex>,
    properties: Vec<(String, TypeIndex)>,
}

static NO_EDGES: NodeEdges = NodeEdges {
    generic_arguments: Vec::new(),
    declaring_type: None,
    properties: Vec::new(),
};

/// A node of a [`TypeGraph`]: the serializable description of a type's shape.
///
/// Cloning is cheap; clones refer to the same node. Equality is structural (name, namespace,
/// declaring chain, generic arguments and property signatures) and terminates on cyclic graphs.
/// Use [`TypeDescriptor::ptr_eq`] for identity.
#[derive(Clone)]
pub struct TypeDescriptor {
    graph: Arc<TypeGraph>,
    node: Arc<TypeNode>,
    index: TypeIndex,
}

impl TypeDescriptor {
    /// The type's simple name.
    pub fn name(&self) -> &str {
        &self.node.header.name
    }

    /// The type's namespace.
    pub fn namespace(&self) -> Option<&str> {
        self.node.header.namespace.as_deref()
    }

    /// The scalar part of the node.
    pub fn header(&self) -> &TypeHeader {
        &self.node.header
    }

    /// Whether the type is an array.
    pub fn is_array(&self) -> bool {
        self.node.header.is_array
    }

    /// Whether the type is generic.
    pub fn is_generic_type(&self) -> bool {
        self.node.header.is_generic_type
    }

    /// Whether the type is an open generic definition.
    pub fn is_generic_type_definition(&self) -> bool {
        self.node.header.is_generic_type_definition
    }

    /// Whether the type is anonymous or synthesized.
    pub fn is_anonymous_type(&self) -> bool {
        self.node.header.is_anonymous_type
    }

    /// Whether the node's edges were set.
    pub fn is_complete(&self) -> bool {
        self.node.edges.get().is_some()
    }

    /// Set the edges of a reserved node.
    ///
    /// Fails if the node is already complete or if any edge points into another graph.
    pub fn complete(&self, edges: TypeEdges) -> Result<()> {
        let foreign = edges
            .generic_arguments
            .iter()
            .chain(edges.declaring_type.iter())
            .chain(edges.properties.iter().map(|(_, ty)| ty))
            .find(|ty| !Arc::ptr_eq(&ty.graph, &self.graph));
        if let Some(foreign) = foreign {
            return Err(Error::ForeignDescriptor {
                type_name: foreign.name().into(),
            });
        }

        let edges = NodeEdges {
            generic_arguments: edges.generic_arguments.iter().map(|t| t.index).collect(),
            declaring_type: edges.declaring_type.map(|t| t.index),
            properties: edges
                .properties
                .into_iter()
                .map(|(name, ty)| (name, ty.index))
                .collect(),
        };
        self.node
            .edges
            .set(edges)
            .map_err(|_| Error::DescriptorCompleted {
                type_name: self.name().into(),
            })
    }

    /// Ordered generic arguments.
    pub fn generic_arguments(&self) -> Vec<TypeDescriptor> {
        self.edges()
            .generic_arguments
            .iter()
            .filter_map(|index| self.sibling(*index))
            .collect()
    }

    /// The element type of an array type.
    pub fn element_type(&self) -> Option<TypeDescriptor> {
        if !self.is_array() {
            return None;
        }
        let index = *self.edges().generic_arguments.first()?;

        self.sibling(index)
    }

    /// The declaring type of a nested type.
    pub fn declaring_type(&self) -> Option<TypeDescriptor> {
        self.edges()
            .declaring_type
            .and_then(|index| self.sibling(index))
    }

    /// Ordered properties.
    pub fn properties(&self) -> Vec<PropertyDescriptor> {
        self.edges()
            .properties
            .iter()
            .filter_map(|(name, index)| {
                let ty = self.sibling(*index)?;
                Some(PropertyDescriptor::new(name.clone(), self.clone(), ty))
            })
            .collect()
    }

    /// The property with the given name.
    pub fn property(&self, name: &str) -> Option<PropertyDescriptor> {
        let (name, index) = self.edges().properties.iter().find(|(n, _)| n == name)?;
        let ty = self.sibling(*index)?;

        Some(PropertyDescriptor::new(name.clone(), self.clone(), ty))
    }

    /// Number of properties.
    pub fn property_count(&self) -> usize {
        self.edges().properties.len()
    }

    /// `namespace::Declaring::Name<Arg, ...>`.
    pub fn full_name(&self) -> String {
        let mut name = String::new();
        self.write_full_name(&mut name, &mut Vec::new());

        name
    }

    /// `namespace::Declaring::Name`, without generic arguments.
    pub fn qualified_name(&self) -> String {
        let mut name = match self.declaring_type() {
            Some(declaring) => declaring.full_name() + "::",
            None => self
                .namespace()
                .map(|namespace| format!("{namespace}::"))
                .unwrap_or_default(),
        };
        name.push_str(self.name());

        name
    }

    /// The graph this node lives in.
    pub fn graph(&self) -> &Arc<TypeGraph> {
        &self.graph
    }

    /// The index of this node in its graph.
    pub fn index(&self) -> TypeIndex {
        self.index
    }

    /// Whether both descriptors are the same node.
    pub fn ptr_eq(&self, other: &TypeDescriptor) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    /// Address of the node, unique while the node is alive.
    pub fn node_addr(&self) -> usize {
        Arc::as_ptr(&self.node) as usize
    }

    /// Like `complete` but for freshly reserved nodes only.
    pub(crate) fn fill(&self, edges: TypeEdges) {
        let filled = self.complete(edges);
        debug_assert!(filled.is_ok(), "{filled:?}");
    }

    fn edges(&self) -> &NodeEdges {
        self.node.edges.get().unwrap_or(&NO_EDGES)
    }

    fn sibling(&self, index: TypeIndex) -> Option<TypeDescriptor> {
        let node = self.graph.node(index)?;

        Some(TypeDescriptor {
            graph: self.graph.clone(),
            node,
            index,
        })
    }

    fn write_full_name(&self, out: &mut String, stack: &mut Vec<usize>) {
        if let Some(declaring) = self.declaring_type() {
            declaring.write_full_name(out, stack);
            out.push_str("::");
        } else if let Some(namespace) = self.namespace() {
            out.push_str(namespace);
            out.push_str("::");
        }
        out.push_str(self.name());

        let arguments = self.generic_arguments();
        if arguments.is_empty() || stack.contains(&self.node_addr()) {
            return;
        }
        stack.push(self.node_addr());
        out.push('<');
        for (i, argument) in arguments.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            argument.write_full_name(out, stack);
        }
        out.push('>');
        stack.pop();
    }

    fn structurally_eq(&self, other: &TypeDescriptor, assumed: &mut Vec<(usize, usize)>) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let pair = (self.node_addr(), other.node_addr());
        if assumed.contains(&pair) {
            return true;
        }
        if self.name() != other.name() || self.namespace() != other.namespace() {
            return false;
        }
        assumed.push(pair);

        let declaring_eq = match (self.declaring_type(), other.declaring_type()) {
            (None, None) => true,
            (Some(a), Some(b)) => a.structurally_eq(&b, assumed),
            _ => false,
        };
        if !declaring_eq {
            return false;
        }

        let (args, other_args) = (self.generic_arguments(), other.generic_arguments());
        if args.len() != other_args.len()
            || !args
                .iter()
                .zip(&other_args)
                .all(|(a, b)| a.structurally_eq(b, assumed))
        {
            return false;
        }

        let (props, other_props) = (self.properties(), other.properties());
        props.len() == other_props.len()
            && props.iter().zip(&other_props).all(|(a, b)| {
                a.name() == b.name() && a.value_type().structurally_eq(b.value_type(), assumed)
            })
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.structurally_eq(other, &mut Vec::new())
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
        self.namespace().hash(state);
        self.edges().properties.len().hash(state);
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("index", &self.index.get())
            .field("full_name", &self.full_name())
            .field("properties", &self.property_count())
            .finish()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(graph: &Arc<TypeGraph>, name: &str) -> TypeDescriptor {
        graph
            .define(TypeHeader::new(name), TypeEdges::new())
            .unwrap()
    }

    #[test]
    fn reserve_then_complete_ties_a_cycle() {
        let graph = TypeGraph::new();
        let node = graph.reserve(TypeHeader::new("Node").with_namespace("app"));
        let int = scalar(&graph, "i32");
        node.complete(
            TypeEdges::new()
                .property("Value", int)
                .property("Next", node.clone()),
        )
        .unwrap();

        let next = node.property("Next").unwrap();
        assert!(next.value_type().ptr_eq(&node));
        assert_eq!(node.full_name(), "app::Node");
        assert_eq!(graph.len(), 2);

        let err = node.complete(TypeEdges::new()).unwrap_err();
        assert_eq!(
            err,
            Error::DescriptorCompleted {
                type_name: "Node".into()
            }
        );
    }

    #[test]
    fn edges_must_share_the_graph() {
        let graph = TypeGraph::new();
        let other = TypeGraph::new();
        let foreign = scalar(&other, "i32");
        let node = graph.reserve(TypeHeader::new("Entity"));

        let err = node
            .complete(TypeEdges::new().property("Id", foreign))
            .unwrap_err();
        assert_eq!(
            err,
            Error::ForeignDescriptor {
                type_name: "i32".into()
            }
        );
        assert!(!node.is_complete());
    }

    #[test]
    fn equality_is_structural_and_terminates() {
        let build = |namespace: &str| {
            let graph = TypeGraph::new();
            let node = graph.reserve(TypeHeader::new("Node").with_namespace(namespace));
            node.complete(TypeEdges::new().property("Next", node.clone()))
                .unwrap();
            node
        };

        let a = build("app");
        let b = build("app");
        assert!(!a.ptr_eq(&b));
        assert_eq!(a, b);
        assert_ne!(a, build("other"));
    }

    #[test]
    fn full_name_includes_declaring_chain_and_arguments() {
        let graph = TypeGraph::new();
        let outer = scalar(&graph, "Outer");
        let int = scalar(&graph, "i32");
        let text = scalar(&graph, "String");
        let pair = graph
            .define(
                TypeHeader::new("Pair").with_namespace("app").generic(),
                TypeEdges::new()
                    .declaring_type(outer)
                    .generic_argument(int)
                    .generic_argument(text),
            )
            .unwrap();

        assert_eq!(pair.full_name(), "Outer::Pair<i32, String>");
        assert_eq!(pair.to_string(), pair.full_name());
    }
}
