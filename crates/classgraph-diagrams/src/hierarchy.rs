//! Inheritance graph resolution for a single diagram subject.
//!
//! [`HierarchyResolver`] picks the direct ancestors and descendants of a node
//! that are worth drawing:
//!
//! - every direct `extends` supertype,
//! - direct `implements` interfaces, minus interfaces already implemented
//!   somewhere along the `extends` chain,
//! - direct subtypes and implementors, minus those that are already reachable
//!   through another direct descendant.
//!
//! Identities are node ids for project types and display names for external
//! types. Traversals keep a visited set, so cyclic input terminates.

use std::collections::HashSet;

use crate::model::{Node, NodeId, Project, TypeRef};

/// Kind of relationship between a subtype and a supertype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Extends,
    Implements,
}

impl EdgeKind {
    /// PlantUML arrow, written as `<super> <arrow> <sub>`.
    #[must_use]
    pub fn arrow(self) -> &'static str {
        match self {
            Self::Extends => "<|--",
            Self::Implements => "<|..",
        }
    }
}

/// Identity used for de-duplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identity<'a> {
    Node(NodeId),
    External(&'a str),
}

/// One side of an [`Edge`].
#[derive(Debug, Clone, Copy)]
pub struct Endpoint<'a> {
    /// Display name used in relationship lines.
    pub name: &'a str,
    /// Project node, `None` for types declared outside the project.
    pub node: Option<&'a Node>,
    /// Type arguments applied at the reference site.
    pub type_arguments: &'a [String],
    target: Option<NodeId>,
}

impl<'a> Endpoint<'a> {
    fn subject(node: &'a Node) -> Self {
        Self {
            name: &node.name,
            node: Some(node),
            type_arguments: &[],
            target: Some(node.id),
        }
    }

    fn reference(project: &'a Project, reference: &'a TypeRef) -> Self {
        let node = project.resolve(reference);
        Self {
            name: node.map_or(reference.name.as_str(), |n| n.name.as_str()),
            node,
            type_arguments: &reference.type_arguments,
            target: reference.target,
        }
    }

    /// Identity of this endpoint.
    #[must_use]
    pub fn identity(&self) -> Identity<'a> {
        match self.target {
            Some(id) => Identity::Node(id),
            None => Identity::External(self.name),
        }
    }
}

fn identity_of(reference: &TypeRef) -> Identity<'_> {
    match reference.target {
        Some(id) => Identity::Node(id),
        None => Identity::External(&reference.name),
    }
}

/// Directed relation from a subtype (`from`) to a supertype (`to`).
#[derive(Debug, Clone, Copy)]
pub struct Edge<'a> {
    pub from: Endpoint<'a>,
    pub to: Endpoint<'a>,
    pub kind: EdgeKind,
}

impl Edge<'_> {
    /// Relationship line for this edge (`Super <|-- Sub`).
    #[must_use]
    pub fn line(&self) -> String {
        format!("{} {} {}", self.to.name, self.kind.arrow(), self.from.name)
    }
}

/// Result of resolving one subject.
///
/// Ancestor edges come first (extends, then implements), followed by the
/// descendant edges (subtypes, then implementors).
#[derive(Debug, Clone)]
pub struct ResolvedGraph<'a> {
    pub subject: &'a Node,
    pub edges: Vec<Edge<'a>>,
    /// Number of ancestor edges.
    pub siblings_above: usize,
    /// Number of descendant edges.
    pub siblings_below: usize,
}

impl<'a> ResolvedGraph<'a> {
    /// Whether the subject has no relations worth drawing.
    #[must_use]
    pub fn is_isolated(&self) -> bool {
        self.siblings_above + self.siblings_below == 0
    }

    /// The subject as an edge endpoint.
    #[must_use]
    pub fn subject_endpoint(&self) -> Endpoint<'a> {
        Endpoint::subject(self.subject)
    }

    /// Supertypes of the subject, in edge order.
    pub fn ancestors(&self) -> impl Iterator<Item = &Endpoint<'a>> {
        self.edges[..self.siblings_above].iter().map(|edge| &edge.to)
    }

    /// Subtypes and implementors of the subject, in edge order.
    pub fn descendants(&self) -> impl Iterator<Item = &Endpoint<'a>> {
        self.edges[self.siblings_above..].iter().map(|edge| &edge.from)
    }
}

/// Computes the [`ResolvedGraph`] of a node within a [`Project`].
#[derive(Debug, Clone, Copy)]
pub struct HierarchyResolver<'a> {
    project: &'a Project,
}

impl<'a> HierarchyResolver<'a> {
    #[must_use]
    pub fn new(project: &'a Project) -> Self {
        Self { project }
    }

    /// Resolve the direct ancestors and descendants of `subject`.
    #[must_use]
    pub fn resolve(&self, subject: &'a Node) -> ResolvedGraph<'a> {
        let this = Endpoint::subject(subject);
        let mut seen = HashSet::from([this.identity()]);
        let mut edges = Vec::new();

        for reference in &subject.extended_types {
            let parent = Endpoint::reference(self.project, reference);
            if seen.insert(parent.identity()) {
                edges.push(Edge {
                    from: this,
                    to: parent,
                    kind: EdgeKind::Extends,
                });
            }
        }

        let inherited = self.inherited_interfaces(subject);
        for reference in &subject.implemented_types {
            if inherited.contains(&identity_of(reference)) {
                continue;
            }
            let interface = Endpoint::reference(self.project, reference);
            if seen.insert(interface.identity()) {
                edges.push(Edge {
                    from: this,
                    to: interface,
                    kind: EdgeKind::Implements,
                });
            }
        }

        let siblings_above = edges.len();

        let indirect = self.indirect_descendants(subject);
        let direct = [
            (&subject.extended_by, EdgeKind::Extends),
            (&subject.implemented_by, EdgeKind::Implements),
        ];
        for (references, kind) in direct {
            for reference in references {
                if indirect.contains(&identity_of(reference)) {
                    continue;
                }
                let child = Endpoint::reference(self.project, reference);
                if seen.insert(child.identity()) {
                    edges.push(Edge {
                        from: child,
                        to: this,
                        kind,
                    });
                }
            }
        }

        let siblings_below = edges.len() - siblings_above;
        tracing::debug!(
            subject = %subject.name,
            siblings_above,
            siblings_below,
            "resolved hierarchy"
        );

        ResolvedGraph {
            subject,
            edges,
            siblings_above,
            siblings_below,
        }
    }

    /// Every interface implemented anywhere along the `extends` chain of `subject`.
    ///
    /// Interfaces extended by those interfaces are included as well.
    fn inherited_interfaces(&self, subject: &'a Node) -> HashSet<Identity<'a>> {
        let mut visited = HashSet::from([subject.id]);
        let mut stack: Vec<&'a Node> = self.resolved(&subject.extended_types).collect();
        let mut implemented: Vec<&'a TypeRef> = Vec::new();

        while let Some(ancestor) = stack.pop() {
            if !visited.insert(ancestor.id) {
                continue;
            }
            implemented.extend(&ancestor.implemented_types);
            stack.extend(self.resolved(&ancestor.extended_types));
        }

        self.closure(implemented, |node| {
            [&node.extended_types, &node.implemented_types]
        })
    }

    /// Every type reachable below a direct descendant of `subject`.
    fn indirect_descendants(&self, subject: &'a Node) -> HashSet<Identity<'a>> {
        let start = self
            .resolved(&subject.extended_by)
            .chain(self.resolved(&subject.implemented_by))
            .filter(|node| node.id != subject.id)
            .flat_map(|node| node.extended_by.iter().chain(&node.implemented_by));

        self.closure(start, |node| [&node.extended_by, &node.implemented_by])
    }

    /// Transitive closure over `follow`, starting from (and including) `start`.
    fn closure<I>(
        &self,
        start: I,
        follow: fn(&'a Node) -> [&'a Vec<TypeRef>; 2],
    ) -> HashSet<Identity<'a>>
    where
        I: IntoIterator<Item = &'a TypeRef>,
    {
        let mut reached = HashSet::new();
        let mut stack: Vec<&'a TypeRef> = start.into_iter().collect();

        while let Some(reference) = stack.pop() {
            if !reached.insert(identity_of(reference)) {
                continue;
            }
            if let Some(node) = self.project.resolve(reference) {
                stack.extend(follow(node).into_iter().flatten());
            }
        }

        reached
    }

    fn resolved(&self, references: &'a [TypeRef]) -> impl Iterator<Item = &'a Node> + 'a {
        let project = self.project;
        references
            .iter()
            .filter_map(move |reference| project.resolve(reference))
    }
}
