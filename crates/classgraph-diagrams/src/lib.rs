//! UML class hierarchy diagrams for API documentation.
//!
//! For one class or interface this crate recovers the relevant part of the
//! inheritance graph, generates PlantUML class diagram markup for it, and
//! turns the markup into an image through a pool of local PlantUML processes
//! or into a URL on a remote PlantUML server.
//!
//! # Architecture
//!
//! The crate is organized into modules:
//! - [`model`]: Reflection input (`Project`, `Node`, `Member`, `TypeRef`)
//! - [`hierarchy`]: `HierarchyResolver` computing ancestor and descendant edges
//! - [`codegen`]: `DiagramCodeGenerator` producing markup lines
//! - [`boxes`]: Per-node box formatting
//! - [`codegen_cache`]: Run-scoped memoization of formatted boxes
//! - [`dispatcher`]: `RenderDispatcher` feeding a pool of rendering processes
//! - [`encoder`]: Markup encoding for remote PlantUML servers
//! - [`processor`]: `ClassDiagramProcessor` running a whole documentation pass
//!
//! # Example
//!
//! ```
//! use classgraph_diagrams::{CachedGenerator, CodeGenOptions, HierarchyResolver, Node, NodeKind, Project};
//!
//! let mut base = Node::new(1, "Shape", NodeKind::Class);
//! let mut circle = Node::new(2, "Circle", NodeKind::Class);
//! circle.extended_types.push(base.type_ref());
//! base.extended_by.push(circle.type_ref());
//! let project = Project::new(vec![base, circle]);
//!
//! let subject = project.find_by_name("Circle").unwrap();
//! let graph = HierarchyResolver::new(&project).resolve(subject);
//! let lines = CachedGenerator::new(&CodeGenOptions::default()).generate(&graph);
//! assert_eq!(lines.last().unwrap(), "Shape <|-- Circle");
//! ```

pub mod boxes;
mod cache;
pub mod codegen;
pub mod codegen_cache;
mod consts;
pub mod dispatcher;
pub mod encoder;
mod error;
mod format;
pub mod hierarchy;
pub mod model;
mod options;
mod output;
mod process;
pub mod processor;

pub use boxes::{BoxFormatter, PlainBoxFormatter};
pub use cache::DiagramKey;
pub use codegen::{CachedGenerator, DiagramCodeGenerator, markup_document};
pub use codegen_cache::{CacheKey, CachingBoxFormatter, CodeGenCache};
pub use consts::{DEFAULT_SERVER_URL, DEFAULT_TIMEOUT, PIPE_DELIMITER};
pub use dispatcher::{PendingRender, RenderDispatcher};
pub use encoder::{encode, remote_url};
pub use error::RenderError;
pub use format::RenderFormat;
pub use hierarchy::{Edge, EdgeKind, Endpoint, HierarchyResolver, ResolvedGraph};
pub use model::{
    Member, MemberFlags, MemberKind, Node, NodeFlags, NodeId, NodeKind, Parameter, Project,
    TypeRef, Visibility,
};
pub use options::{
    CodeGenOptions, DetailLevel, FontStyle, MemberOrder, ParameterMode, StyleOptions,
    VisibilityStyle,
};
pub use output::DiagramOutput;
pub use process::{DelimitedOutput, PlantUmlSpawner, ProcessPipes, ProcessSpawner};
pub use processor::{
    ClassDiagramProcessor, DiagramContent, DiagramError, ProcessResult, RenderedDiagram,
};
