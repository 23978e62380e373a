//! Reflection model consumed by the diagram pipeline.
//!
//! A [`Project`] is a flat list of [`Node`]s (classes, interfaces and any other
//! reflected declarations). Relations between nodes are expressed as
//! [`TypeRef`]s, which point at another node by id when the referenced type is
//! part of the project, or carry only a display name for external types.
//!
//! The model is read-only from the pipeline's point of view. With the `serde`
//! feature enabled it can be deserialized from the JSON produced by the
//! documentation extractor.

use std::collections::HashMap;

/// Stable identity of a reflected declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of a reflected declaration.
///
/// Only classes and interfaces get a box in a diagram. Everything else the
/// extractor reports (enums, type aliases, namespaces) maps to [`NodeKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum NodeKind {
    #[default]
    Class,
    Interface,
    #[cfg_attr(feature = "serde", serde(other))]
    Other,
}

impl NodeKind {
    /// Diagram keyword for this kind, or `None` when the kind has no box.
    #[must_use]
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Self::Class => Some("class"),
            Self::Interface => Some("interface"),
            Self::Other => None,
        }
    }
}

/// Modifier flags on a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct NodeFlags {
    pub is_static: bool,
    pub is_abstract: bool,
}

/// Reference to a type in an `extends`/`implements` position.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct TypeRef {
    /// Referenced node, when the type is declared inside the project.
    pub target: Option<NodeId>,
    /// Display name of the referenced type.
    pub name: String,
    /// Type arguments applied at the reference site (`Base<string>` → `["string"]`).
    pub type_arguments: Vec<String>,
}

impl TypeRef {
    /// Reference to a node declared in the project.
    #[must_use]
    pub fn to_node(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            target: Some(id),
            name: name.into(),
            type_arguments: Vec::new(),
        }
    }

    /// Reference to a type declared outside the project.
    #[must_use]
    pub fn external(name: impl Into<String>) -> Self {
        Self {
            target: None,
            name: name.into(),
            type_arguments: Vec::new(),
        }
    }

    /// Attach type arguments to this reference.
    #[must_use]
    pub fn with_type_arguments<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.type_arguments = args.into_iter().map(Into::into).collect();
        self
    }
}

/// Kind of a class member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MemberKind {
    #[default]
    Property,
    Method,
    #[cfg_attr(feature = "serde", serde(other))]
    Other,
}

/// Member visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    /// PlantUML visibility glyph.
    #[must_use]
    pub fn glyph(self) -> char {
        match self {
            Self::Public => '+',
            Self::Protected => '#',
            Self::Private => '-',
        }
    }
}

/// Modifier flags on a [`Member`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct MemberFlags {
    pub is_static: bool,
    pub is_abstract: bool,
}

/// Method parameter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct Parameter {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub type_name: Option<String>,
}

/// A property or method declared on a [`Node`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct Member {
    pub name: String,
    pub kind: MemberKind,
    pub visibility: Visibility,
    pub flags: MemberFlags,
    /// Declared type of a property. Missing types render as `unknown`.
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub type_name: Option<String>,
    pub parameters: Vec<Parameter>,
    /// Return type of a method. Missing return types render as `void`.
    pub return_type: Option<String>,
}

/// A reflected class, interface or other declaration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub flags: NodeFlags,
    pub type_parameters: Vec<String>,
    pub extended_types: Vec<TypeRef>,
    pub implemented_types: Vec<TypeRef>,
    pub extended_by: Vec<TypeRef>,
    pub implemented_by: Vec<TypeRef>,
    pub children: Vec<Member>,
}

impl Node {
    /// Create an empty node of the given kind.
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: NodeId(id),
            name: name.into(),
            kind,
            ..Self::default()
        }
    }

    /// Reference pointing at this node without type arguments.
    #[must_use]
    pub fn type_ref(&self) -> TypeRef {
        TypeRef::to_node(self.id, &self.name)
    }

    /// Whether this node can appear as a box in a class diagram.
    #[must_use]
    pub fn has_box(&self) -> bool {
        self.kind.keyword().is_some()
    }
}

/// All reflected declarations of one documentation run.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "ProjectRaw", into = "ProjectRaw"))]
pub struct Project {
    nodes: Vec<Node>,
    index: HashMap<NodeId, usize>,
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct ProjectRaw {
    nodes: Vec<Node>,
}

#[cfg(feature = "serde")]
impl From<ProjectRaw> for Project {
    fn from(raw: ProjectRaw) -> Self {
        Self::new(raw.nodes)
    }
}

#[cfg(feature = "serde")]
impl From<Project> for ProjectRaw {
    fn from(project: Project) -> Self {
        Self {
            nodes: project.nodes,
        }
    }
}

impl Project {
    /// Build a project from its nodes.
    ///
    /// When two nodes share an id, the later one wins the id lookup.
    #[must_use]
    pub fn new(nodes: Vec<Node>) -> Self {
        let index = nodes
            .iter()
            .enumerate()
            .map(|(position, node)| (node.id, position))
            .collect();
        Self { nodes, index }
    }

    /// Look up a node by id.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).map(|&position| &self.nodes[position])
    }

    /// Resolve a type reference to a project node.
    #[must_use]
    pub fn resolve(&self, reference: &TypeRef) -> Option<&Node> {
        reference.target.and_then(|id| self.get(id))
    }

    /// First node with the given display name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name == name)
    }

    /// All nodes in declaration order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Nodes that may get a class diagram (classes and interfaces).
    pub fn diagram_subjects(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|node| node.has_box())
    }
}
