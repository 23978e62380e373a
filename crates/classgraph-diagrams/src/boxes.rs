//! Per-node box formatting.
//!
//! A box is the block of markup lines describing one class or interface:
//!
//! ```text
//! abstract class Shape<T> {
//! +size: number
//! {static} +create(kind: string): Shape
//! }
//! ```
//!
//! [`BoxFormatter`] is the seam between the code generator and the formatter:
//! [`PlainBoxFormatter`] always formats, while
//! [`CachingBoxFormatter`](crate::codegen_cache::CachingBoxFormatter) wraps
//! another formatter and memoizes its output.

use std::cmp::Ordering;

use crate::model::{Member, MemberKind, Node};
use crate::options::{CodeGenOptions, DetailLevel, MemberOrder, ParameterMode};

/// Placeholder for a property or parameter without a resolvable type.
pub const UNKNOWN_TYPE: &str = "unknown";

/// Placeholder for a method without a return type.
pub const VOID_TYPE: &str = "void";

/// Produces the markup lines of a single box.
pub trait BoxFormatter {
    /// Format the box for `node` with `type_arguments` applied at the use site.
    ///
    /// Returns no lines for nodes that cannot be drawn as a box.
    fn format_box(&mut self, node: &Node, type_arguments: &[String]) -> Vec<String>;
}

/// Formats boxes directly from the reflection model.
#[derive(Debug, Clone, Copy)]
pub struct PlainBoxFormatter {
    detail: DetailLevel,
    parameters: ParameterMode,
    order: MemberOrder,
}

impl PlainBoxFormatter {
    #[must_use]
    pub fn new(options: &CodeGenOptions) -> Self {
        Self {
            detail: options.detail,
            parameters: options.method_parameters,
            order: options.member_order,
        }
    }

    fn header(node: &Node, keyword: &str, type_arguments: &[String]) -> String {
        let mut header = String::new();
        if node.flags.is_static {
            header.push_str("static ");
        }
        if node.flags.is_abstract {
            header.push_str("abstract ");
        }
        header.push_str(keyword);
        header.push(' ');
        header.push_str(&node.name);

        let generics = if type_arguments.is_empty() {
            node.type_parameters.as_slice()
        } else {
            type_arguments
        };
        if !generics.is_empty() {
            header.push('<');
            header.push_str(&generics.join(", "));
            header.push('>');
        }

        header.push_str(" {");
        header
    }

    fn sorted<'n>(&self, node: &'n Node, kind: MemberKind) -> Vec<&'n Member> {
        let mut members: Vec<_> = node.children.iter().filter(|m| m.kind == kind).collect();
        members.sort_by(|a, b| self.compare(a, b));
        members
    }

    fn compare(&self, a: &Member, b: &Member) -> Ordering {
        self.order
            .tier(a.visibility)
            .cmp(&self.order.tier(b.visibility))
            .then_with(|| a.name.cmp(&b.name))
    }

    fn property_line(member: &Member) -> String {
        let prefix = if member.flags.is_static { "{static} " } else { "" };
        format!(
            "{prefix}{}{}: {}",
            member.visibility.glyph(),
            member.name,
            member.type_name.as_deref().unwrap_or(UNKNOWN_TYPE)
        )
    }

    fn method_line(&self, member: &Member) -> String {
        let mut line = String::new();
        if member.flags.is_static {
            line.push_str("{static} ");
        }
        if member.flags.is_abstract {
            line.push_str("{abstract} ");
        }
        line.push(member.visibility.glyph());
        line.push_str(&member.name);
        line.push('(');
        line.push_str(&self.parameter_list(member));
        line.push_str("): ");
        line.push_str(member.return_type.as_deref().unwrap_or(VOID_TYPE));
        line
    }

    fn parameter_list(&self, member: &Member) -> String {
        let rendered: Vec<String> = match self.parameters {
            ParameterMode::None => return String::new(),
            ParameterMode::Names => member.parameters.iter().map(|p| p.name.clone()).collect(),
            ParameterMode::Types => member
                .parameters
                .iter()
                .map(|p| p.type_name.as_deref().unwrap_or(UNKNOWN_TYPE).to_owned())
                .collect(),
            ParameterMode::Complete => member
                .parameters
                .iter()
                .map(|p| {
                    format!(
                        "{}: {}",
                        p.name,
                        p.type_name.as_deref().unwrap_or(UNKNOWN_TYPE)
                    )
                })
                .collect(),
        };
        rendered.join(", ")
    }
}

impl BoxFormatter for PlainBoxFormatter {
    fn format_box(&mut self, node: &Node, type_arguments: &[String]) -> Vec<String> {
        let Some(keyword) = node.kind.keyword() else {
            return Vec::new();
        };

        let mut lines = vec![Self::header(node, keyword, type_arguments)];

        if self.detail == DetailLevel::Detailed {
            lines.extend(
                self.sorted(node, MemberKind::Property)
                    .into_iter()
                    .map(Self::property_line),
            );
            lines.extend(
                self.sorted(node, MemberKind::Method)
                    .into_iter()
                    .map(|m| self.method_line(m)),
            );
        }

        lines.push("}".to_owned());
        lines
    }
}
