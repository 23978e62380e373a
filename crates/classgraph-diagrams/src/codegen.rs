//! Class diagram markup generation.
//!
//! [`DiagramCodeGenerator`] turns a [`ResolvedGraph`] into PlantUML lines:
//!
//! 1. one box per node (ancestors, subject, descendants), each at most once,
//! 2. one relationship line per edge,
//! 3. global style directives prepended in front of everything else.
//!
//! Directives are prepended one at a time in a fixed order, so they end up in
//! the output in reverse order of consideration. PlantUML applies some
//! `skinparam` keys in declaration order, so the stacking order is part of the
//! output contract.

use std::collections::{HashSet, VecDeque};

use crate::boxes::{BoxFormatter, PlainBoxFormatter};
use crate::codegen_cache::CachingBoxFormatter;
use crate::hierarchy::{Edge, ResolvedGraph};
use crate::options::{CodeGenOptions, FontStyle, StyleOptions, VisibilityStyle};

/// Generator used for a documentation run: plain formatting behind a run-scoped cache.
pub type CachedGenerator = DiagramCodeGenerator<CachingBoxFormatter<PlainBoxFormatter>>;

/// Wrap diagram lines into a complete PlantUML document.
#[must_use]
pub fn markup_document(lines: &[String]) -> String {
    let mut document = String::from("@startuml\n");
    for line in lines {
        document.push_str(line);
        document.push('\n');
    }
    document.push_str("@enduml\n");
    document
}

/// Produces class diagram lines for resolved graphs.
#[derive(Debug)]
pub struct DiagramCodeGenerator<F> {
    formatter: F,
    style: StyleOptions,
}

impl CachedGenerator {
    /// Create a generator with a fresh box cache.
    #[must_use]
    pub fn new(options: &CodeGenOptions) -> Self {
        Self::with_formatter(
            CachingBoxFormatter::new(PlainBoxFormatter::new(options)),
            options,
        )
    }

    /// Number of distinct boxes formatted so far.
    #[must_use]
    pub fn cached_boxes(&self) -> usize {
        self.formatter.cache().len()
    }
}

impl<F: BoxFormatter> DiagramCodeGenerator<F> {
    #[must_use]
    pub fn with_formatter(formatter: F, options: &CodeGenOptions) -> Self {
        Self {
            formatter,
            style: options.style.clone(),
        }
    }

    /// Generate the diagram lines for `graph`.
    ///
    /// Returns no lines when the subject has neither ancestors nor descendants.
    pub fn generate(&mut self, graph: &ResolvedGraph<'_>) -> Vec<String> {
        if graph.is_isolated() {
            return Vec::new();
        }

        let mut lines = VecDeque::new();
        let mut drawn = HashSet::new();

        let subject = graph.subject_endpoint();

        let boxes = graph
            .ancestors()
            .chain(std::iter::once(&subject))
            .chain(graph.descendants());
        for endpoint in boxes {
            let Some(node) = endpoint.node else {
                continue;
            };
            if drawn.insert((node.id, endpoint.type_arguments)) {
                lines.extend(self.formatter.format_box(node, endpoint.type_arguments));
            }
        }

        lines.extend(graph.edges.iter().map(Edge::line));

        for directive in self.directives(graph) {
            lines.push_front(directive);
        }

        lines.into()
    }

    /// Style directives in the order they are considered.
    fn directives(&self, graph: &ResolvedGraph<'_>) -> Vec<String> {
        let style = &self.style;
        let mut directives = Vec::new();

        if style.hide_empty_members {
            directives.push("hide empty members".to_owned());
        }
        if style.hide_circled_char {
            directives.push("hide circle".to_owned());
        }
        let max_siblings = style.top_down_max_siblings;
        if graph.siblings_above > max_siblings || graph.siblings_below > max_siblings {
            directives.push("left to right direction".to_owned());
        }
        if style.visibility_style == VisibilityStyle::Text {
            directives.push("skinparam classAttributeIconSize 0".to_owned());
        }
        if style.hide_shadow {
            directives.push("skinparam shadowing false".to_owned());
        }

        let mut skinparam = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                directives.push(format!("skinparam {key} {value}"));
            }
        };
        skinparam("backgroundColor", style.background_color.clone());
        skinparam("classBackgroundColor", style.box_background_color.clone());
        skinparam("classBorderColor", style.box_border_color.clone());
        skinparam("roundCorner", style.box_border_radius.map(|v| v.to_string()));
        skinparam("classBorderThickness", style.box_border_width.map(|v| v.to_string()));
        skinparam("classArrowColor", style.arrow_color.clone());
        font_directives("class", &style.class_font, &mut skinparam);
        font_directives("classAttribute", &style.attribute_font, &mut skinparam);

        directives
    }
}

fn font_directives(prefix: &str, font: &FontStyle, emit: &mut impl FnMut(&str, Option<String>)) {
    emit(&format!("{prefix}FontName"), font.name.clone());
    emit(&format!("{prefix}FontSize"), font.size.map(|v| v.to_string()));
    emit(&format!("{prefix}FontStyle"), font.style.clone());
    emit(&format!("{prefix}FontColor"), font.color.clone());
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::hierarchy::HierarchyResolver;
    use crate::model::{Node, NodeId, NodeKind, Project, TypeRef};
    use crate::options::DetailLevel;

    /// Options with every style directive switched off.
    fn bare() -> CodeGenOptions {
        CodeGenOptions {
            style: StyleOptions {
                hide_empty_members: false,
                hide_shadow: false,
                ..StyleOptions::default()
            },
            ..CodeGenOptions::default()
        }
    }

    fn super_sub() -> Project {
        let mut sup = Node::new(1, "Super", NodeKind::Class);
        let mut sub = Node::new(2, "Sub", NodeKind::Class);
        sup.extended_by.push(sub.type_ref());
        sub.extended_types.push(sup.type_ref());
        Project::new(vec![sup, sub])
    }

    fn generate(project: &Project, id: u64, options: &CodeGenOptions) -> Vec<String> {
        let resolver = HierarchyResolver::new(project);
        let graph = resolver.resolve(project.get(NodeId(id)).unwrap());
        CachedGenerator::new(options).generate(&graph)
    }

    #[test]
    fn test_isolated_subject_yields_nothing() {
        let project = Project::new(vec![Node::new(1, "Lonely", NodeKind::Class)]);
        assert!(generate(&project, 1, &CodeGenOptions::default()).is_empty());
    }

    #[test]
    fn test_sub_extends_super() {
        let project = super_sub();
        assert_eq!(
            generate(&project, 2, &bare()),
            vec!["class Super {", "}", "class Sub {", "}", "Super <|-- Sub"]
        );
    }

    #[test]
    fn test_super_with_descendant() {
        let project = super_sub();
        assert_eq!(
            generate(&project, 1, &bare()),
            vec!["class Super {", "}", "class Sub {", "}", "Super <|-- Sub"]
        );
    }

    #[test]
    fn test_external_ancestor_has_no_box() {
        let mut error = Node::new(1, "HttpError", NodeKind::Class);
        error.extended_types.push(TypeRef::external("Error"));
        let project = Project::new(vec![error]);

        assert_eq!(
            generate(&project, 1, &bare()),
            vec!["class HttpError {", "}", "Error <|-- HttpError"]
        );
    }

    #[test]
    fn test_generic_ancestor_box_uses_type_arguments() {
        let mut base = Node::new(1, "Repository", NodeKind::Class);
        base.type_parameters = vec!["T".to_owned()];
        let mut users = Node::new(2, "UserRepository", NodeKind::Class);
        users
            .extended_types
            .push(base.type_ref().with_type_arguments(["User"]));
        base.extended_by.push(users.type_ref());
        let project = Project::new(vec![base, users]);

        let lines = generate(&project, 2, &bare());
        assert_eq!(lines[0], "class Repository<User> {");
        assert_eq!(lines.last().unwrap(), "Repository <|-- UserRepository");

        let lines = generate(&project, 1, &bare());
        assert_eq!(lines[0], "class Repository<T> {");
    }

    #[test]
    fn test_detailed_members() {
        let mut project_nodes = Vec::new();
        let mut sup = Node::new(1, "Super", NodeKind::Class);
        let mut sub = Node::new(2, "Sub", NodeKind::Class);
        sup.extended_by.push(sub.type_ref());
        sub.extended_types.push(sup.type_ref());
        sup.children.push(crate::model::Member {
            name: "id".to_owned(),
            type_name: Some("string".to_owned()),
            ..crate::model::Member::default()
        });
        project_nodes.push(sup);
        project_nodes.push(sub);
        let project = Project::new(project_nodes);

        let options = CodeGenOptions {
            detail: DetailLevel::Detailed,
            ..bare()
        };
        assert_eq!(
            generate(&project, 2, &options),
            vec!["class Super {", "+id: string", "}", "class Sub {", "}", "Super <|-- Sub"]
        );
    }

    #[test]
    fn test_directives_are_stacked_in_reverse() {
        let project = super_sub();
        let options = CodeGenOptions {
            style: StyleOptions {
                hide_empty_members: true,
                hide_circled_char: true,
                top_down_max_siblings: 0,
                visibility_style: VisibilityStyle::Text,
                hide_shadow: true,
                background_color: Some("transparent".to_owned()),
                box_border_radius: Some(4),
                class_font: FontStyle {
                    name: Some("Roboto".to_owned()),
                    size: Some(12),
                    ..FontStyle::default()
                },
                ..StyleOptions::default()
            },
            ..CodeGenOptions::default()
        };

        let lines = generate(&project, 2, &options);
        assert_eq!(
            lines[..9].to_vec(),
            vec![
                "skinparam classFontSize 12",
                "skinparam classFontName Roboto",
                "skinparam roundCorner 4",
                "skinparam backgroundColor transparent",
                "skinparam shadowing false",
                "skinparam classAttributeIconSize 0",
                "left to right direction",
                "hide circle",
                "hide empty members",
            ]
        );
        assert_eq!(lines[9], "class Super {");
    }

    #[test]
    fn test_left_to_right_only_above_threshold() {
        let mut base = Node::new(1, "Base", NodeKind::Class);
        let mut nodes = Vec::new();
        for id in 2..5 {
            let mut child = Node::new(id, format!("Child{id}"), NodeKind::Class);
            child.extended_types.push(base.type_ref());
            base.extended_by.push(child.type_ref());
            nodes.push(child);
        }
        nodes.push(base);
        let project = Project::new(nodes);

        let mut options = bare();
        options.style.top_down_max_siblings = 3;
        assert!(!generate(&project, 1, &options).contains(&"left to right direction".to_owned()));

        options.style.top_down_max_siblings = 2;
        assert_eq!(generate(&project, 1, &options)[0], "left to right direction");
    }

    #[test]
    fn test_shared_base_is_formatted_once_per_run() {
        let mut base = Node::new(1, "Base", NodeKind::Class);
        let mut left = Node::new(2, "Left", NodeKind::Class);
        let mut right = Node::new(3, "Right", NodeKind::Class);
        left.extended_types.push(base.type_ref());
        right.extended_types.push(base.type_ref());
        base.extended_by.push(left.type_ref());
        base.extended_by.push(right.type_ref());
        let project = Project::new(vec![base, left, right]);
        let resolver = HierarchyResolver::new(&project);

        let mut generator = CachedGenerator::new(&bare());
        let first = generator.generate(&resolver.resolve(project.get(NodeId(2)).unwrap()));
        let second = generator.generate(&resolver.resolve(project.get(NodeId(3)).unwrap()));
        generator.generate(&resolver.resolve(project.get(NodeId(1)).unwrap()));

        assert_eq!(first[..2].to_vec(), second[..2].to_vec());
        assert_eq!(generator.cached_boxes(), 3);
    }

    #[test]
    fn test_markup_document() {
        let lines = vec!["class A {".to_owned(), "}".to_owned()];
        assert_eq!(markup_document(&lines), "@startuml\nclass A {\n}\n@enduml\n");
    }
}
