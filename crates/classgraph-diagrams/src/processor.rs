//! Class diagram generation for a whole project.
//!
//! [`ClassDiagramProcessor`] runs one documentation pass: it resolves the
//! hierarchy of every class and interface, generates markup with a single
//! run-scoped box cache, and turns the markup into either remote URLs or
//! locally rendered images.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use classgraph_cache::{Cache, CacheBucket, NullCache};

use crate::cache::DiagramKey;
use crate::codegen::{CachedGenerator, markup_document};
use crate::consts::DEFAULT_TIMEOUT;
use crate::dispatcher::{PendingRender, RenderDispatcher};
use crate::encoder::remote_url;
use crate::error::RenderError;
use crate::format::RenderFormat;
use crate::hierarchy::HierarchyResolver;
use crate::model::{Node, NodeId, Project};
use crate::options::{CodeGenOptions, DetailLevel};
use crate::output::DiagramOutput;
use crate::process::ProcessSpawner;

/// Diagram produced for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagramContent {
    /// Image URL on a remote PlantUML server.
    Url(String),
    /// Rendered image bytes.
    Image(Vec<u8>),
}

/// Successfully produced diagram.
#[derive(Debug)]
pub struct RenderedDiagram {
    pub node: NodeId,
    /// Display name of the subject node.
    pub name: String,
    pub format: RenderFormat,
    /// Markup document the diagram was produced from.
    pub markup: String,
    pub content: DiagramContent,
}

/// Diagram that could not be rendered.
#[derive(Debug, thiserror::Error)]
#[error("diagram for {name}: {kind}")]
pub struct DiagramError {
    pub node: NodeId,
    pub name: String,
    #[source]
    pub kind: RenderError,
}

/// Outcome of a documentation run, with partial failure support.
#[derive(Debug, Default)]
pub struct ProcessResult {
    /// Diagrams produced, in project order.
    pub rendered: Vec<RenderedDiagram>,
    /// Diagrams that failed to render, in project order.
    pub errors: Vec<DiagramError>,
}

/// Markup generated for one subject, waiting to be rendered.
struct DiagramJob<'a> {
    node: &'a Node,
    markup: String,
}

impl DiagramJob<'_> {
    fn rendered(self, format: RenderFormat, content: DiagramContent) -> RenderedDiagram {
        RenderedDiagram {
            node: self.node.id,
            name: self.node.name.clone(),
            format,
            markup: self.markup,
            content,
        }
    }

    fn failed(&self, kind: RenderError) -> DiagramError {
        DiagramError {
            node: self.node.id,
            name: self.node.name.clone(),
            kind,
        }
    }
}

/// Produces class diagrams for every class and interface of a project.
///
/// # Configuration
///
/// - [`options`](Self::options): code generation and style options
/// - [`output`](Self::output): remote URLs (default) or local rendering
/// - [`timeout`](Self::timeout): per-diagram limit for local rendering (default: 30 seconds)
/// - [`with_cache`](Self::with_cache): cross-run cache for rendered images
///
/// # Example
///
/// ```
/// use classgraph_diagrams::{ClassDiagramProcessor, Project};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let project = Project::new(Vec::new());
/// let result = ClassDiagramProcessor::new().process(&project).await.unwrap();
/// assert!(result.rendered.is_empty());
/// # });
/// ```
pub struct ClassDiagramProcessor {
    options: CodeGenOptions,
    output: DiagramOutput,
    timeout: Duration,
    cache: Box<dyn CacheBucket>,
}

impl Default for ClassDiagramProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassDiagramProcessor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: CodeGenOptions::default(),
            output: DiagramOutput::default(),
            timeout: DEFAULT_TIMEOUT,
            cache: NullCache.bucket("diagrams"),
        }
    }

    #[must_use]
    pub fn options(mut self, options: CodeGenOptions) -> Self {
        self.options = options;
        self
    }

    /// Set how markup is turned into diagrams.
    ///
    /// Default is [`DiagramOutput::Remote`] on the public PlantUML server.
    #[must_use]
    pub fn output(mut self, output: DiagramOutput) -> Self {
        self.output = output;
        self
    }

    /// Set how long one diagram may take to render locally.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the cache for rendered images.
    ///
    /// Only local rendering consults it: images are looked up by the content
    /// hash of their markup and format, and stored after rendering.
    #[must_use]
    pub fn with_cache(mut self, cache: Box<dyn CacheBucket>) -> Self {
        self.cache = cache;
        self
    }

    /// Diagram lines for a single node, or `None` if it gets no diagram.
    #[must_use]
    pub fn markup_for(&self, project: &Project, node: &Node) -> Option<Vec<String>> {
        if self.options.detail == DetailLevel::None || !node.has_box() {
            return None;
        }
        let graph = HierarchyResolver::new(project).resolve(node);
        let lines = CachedGenerator::new(&self.options).generate(&graph);
        (!lines.is_empty()).then_some(lines)
    }

    /// Produce diagrams for every class and interface in `project`.
    ///
    /// Nodes without ancestors or descendants get no diagram. Failures are
    /// collected per node; the remaining diagrams are still produced.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidPoolSize`] if local rendering is
    /// configured with an empty pool.
    pub async fn process(&self, project: &Project) -> Result<ProcessResult, RenderError> {
        let jobs = self.generate_all(project);
        if jobs.is_empty() {
            return Ok(ProcessResult::default());
        }

        match &self.output {
            DiagramOutput::Remote { server_url, format } => {
                Ok(Self::link_remote(jobs, server_url, *format))
            }
            DiagramOutput::Local {
                pool_size,
                format,
                spawner,
            } => {
                self.render_local(jobs, *pool_size, *format, Arc::clone(spawner))
                    .await
            }
        }
    }

    /// Generate markup for every diagram subject with one generator, so
    /// shared boxes are formatted once.
    fn generate_all<'a>(&self, project: &'a Project) -> Vec<DiagramJob<'a>> {
        if self.options.detail == DetailLevel::None {
            return Vec::new();
        }

        let resolver = HierarchyResolver::new(project);
        let mut generator = CachedGenerator::new(&self.options);
        let mut jobs = Vec::new();

        for node in project.diagram_subjects() {
            let lines = generator.generate(&resolver.resolve(node));
            if lines.is_empty() {
                tracing::debug!(node = %node.name, "no hierarchy, skipping diagram");
                continue;
            }
            tracing::debug!(node = %node.name, lines = lines.len(), "generated diagram markup");
            jobs.push(DiagramJob {
                node,
                markup: markup_document(&lines),
            });
        }

        tracing::info!(
            diagrams = jobs.len(),
            boxes = generator.cached_boxes(),
            "generated class diagrams"
        );
        jobs
    }

    fn link_remote(jobs: Vec<DiagramJob<'_>>, server_url: &str, format: RenderFormat) -> ProcessResult {
        let rendered = jobs
            .into_iter()
            .map(|job| {
                let url = remote_url(server_url, format, &job.markup);
                job.rendered(format, DiagramContent::Url(url))
            })
            .collect();
        ProcessResult {
            rendered,
            errors: Vec::new(),
        }
    }

    /// Render cache misses through a fresh dispatcher, then shut it down.
    ///
    /// A slot answers in submission order, so once one of its jobs times out
    /// the jobs queued behind it fail without waiting again.
    async fn render_local(
        &self,
        jobs: Vec<DiagramJob<'_>>,
        pool_size: usize,
        format: RenderFormat,
        spawner: Arc<dyn ProcessSpawner>,
    ) -> Result<ProcessResult, RenderError> {
        let mut dispatcher = RenderDispatcher::new(pool_size, format, spawner)?;

        // Submit everything first so the pool works in parallel.
        let steps: Vec<_> = jobs
            .into_iter()
            .map(|job| {
                let hash = DiagramKey {
                    markup: &job.markup,
                    format,
                }
                .compute_hash();
                if let Some(image) = self.cache.get(&hash) {
                    tracing::debug!(node = %job.node.name, "diagram cache hit");
                    return LocalStep::Cached(job, image);
                }
                match dispatcher.submit(&job.markup) {
                    Ok(pending) => LocalStep::Submitted(job, hash, pending),
                    Err(e) => LocalStep::Failed(job, e),
                }
            })
            .collect();

        let mut result = ProcessResult::default();
        let mut timed_out = HashSet::new();
        for step in steps {
            let (job, outcome) = match step {
                LocalStep::Cached(job, image) => {
                    result.rendered.push(job.rendered(format, DiagramContent::Image(image)));
                    continue;
                }
                LocalStep::Failed(job, e) => (job, Err(e)),
                LocalStep::Submitted(job, hash, pending) => {
                    let outcome = self.await_render(pending, &mut timed_out).await;
                    if let Ok(image) = &outcome {
                        self.cache.set(&hash, image);
                    }
                    (job, outcome)
                }
            };
            match outcome {
                Ok(image) => {
                    result.rendered.push(job.rendered(format, DiagramContent::Image(image)));
                }
                Err(e) => {
                    tracing::warn!(node = %job.node.name, error = %e, "failed to render diagram");
                    result.errors.push(job.failed(e));
                }
            }
        }

        dispatcher.shutdown();
        Ok(result)
    }

    async fn await_render(
        &self,
        pending: PendingRender,
        timed_out: &mut HashSet<usize>,
    ) -> Result<Vec<u8>, RenderError> {
        let slot = pending.slot();
        let timeout = RenderError::Timeout {
            slot,
            timeout: self.timeout,
        };
        if timed_out.contains(&slot) {
            return Err(timeout);
        }
        match tokio::time::timeout(self.timeout, pending).await {
            Ok(outcome) => outcome,
            Err(_) => {
                timed_out.insert(slot);
                Err(timeout)
            }
        }
    }
}

/// Where one diagram stands after submission.
enum LocalStep<'a> {
    Cached(DiagramJob<'a>, Vec<u8>),
    Submitted(DiagramJob<'a>, String, PendingRender),
    Failed(DiagramJob<'a>, RenderError),
}

#[cfg(test)]
mod tests {
    use classgraph_cache::FileCache;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::encoder::encode;
    use crate::model::NodeKind;
    use crate::process::fake::{Behaviour, FakeSpawner, svg};

    /// `Shape <|-- Circle`, `Shape <|-- Square`, plus an unrelated `Lonely`.
    fn shapes() -> Project {
        let mut shape = Node::new(1, "Shape", NodeKind::Class);
        let mut circle = Node::new(2, "Circle", NodeKind::Class);
        let mut square = Node::new(3, "Square", NodeKind::Class);
        for sub in [&mut circle, &mut square] {
            sub.extended_types.push(shape.type_ref());
            shape.extended_by.push(sub.type_ref());
        }
        let lonely = Node::new(4, "Lonely", NodeKind::Class);
        Project::new(vec![shape, circle, square, lonely])
    }

    fn local(spawner: Arc<FakeSpawner>, pool_size: usize) -> DiagramOutput {
        DiagramOutput::Local {
            pool_size,
            format: RenderFormat::Svg,
            spawner,
        }
    }

    /// Line after `@startuml`, which the fake process echoes back.
    fn first_line(markup: &str) -> &str {
        markup.lines().nth(1).unwrap()
    }

    #[test]
    fn test_markup_for_isolated_node_is_none() {
        let project = shapes();
        let processor = ClassDiagramProcessor::new();
        let lonely = project.find_by_name("Lonely").unwrap();

        assert_eq!(processor.markup_for(&project, lonely), None);
    }

    #[test]
    fn test_markup_for_detail_none() {
        let project = shapes();
        let processor = ClassDiagramProcessor::new().options(CodeGenOptions {
            detail: DetailLevel::None,
            ..CodeGenOptions::default()
        });
        let circle = project.find_by_name("Circle").unwrap();

        assert_eq!(processor.markup_for(&project, circle), None);
    }

    #[test]
    fn test_markup_for_subclass() {
        let project = shapes();
        let processor = ClassDiagramProcessor::new();
        let circle = project.find_by_name("Circle").unwrap();

        let lines = processor.markup_for(&project, circle).unwrap();
        assert_eq!(lines.last().unwrap(), "Shape <|-- Circle");
    }

    #[tokio::test]
    async fn test_remote_output_yields_urls() {
        let project = shapes();
        let processor = ClassDiagramProcessor::new().output(DiagramOutput::Remote {
            server_url: "https://uml.example.org/".to_owned(),
            format: RenderFormat::Png,
        });

        let result = processor.process(&project).await.unwrap();
        let names: Vec<_> = result.rendered.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Shape", "Circle", "Square"]);
        assert!(result.errors.is_empty());

        let circle = &result.rendered[1];
        assert_eq!(
            circle.content,
            DiagramContent::Url(format!(
                "https://uml.example.org/png/{}",
                encode(&circle.markup)
            ))
        );
    }

    #[tokio::test]
    async fn test_detail_none_produces_nothing() {
        let processor = ClassDiagramProcessor::new().options(CodeGenOptions {
            detail: DetailLevel::None,
            ..CodeGenOptions::default()
        });

        let result = processor.process(&shapes()).await.unwrap();
        assert!(result.rendered.is_empty());
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_local_rendering() {
        let spawner = Arc::new(FakeSpawner::default());
        let processor = ClassDiagramProcessor::new().output(local(spawner.clone(), 2));

        let result = processor.process(&shapes()).await.unwrap();

        assert!(result.errors.is_empty());
        assert_eq!(result.rendered.len(), 3);
        for (index, diagram) in result.rendered.iter().enumerate() {
            let expected = svg(index % 2, first_line(&diagram.markup));
            assert_eq!(diagram.content, DiagramContent::Image(expected));
        }
        assert_eq!(spawner.spawned(), 2);
    }

    #[tokio::test]
    async fn test_empty_pool_is_fatal() {
        let processor =
            ClassDiagramProcessor::new().output(local(Arc::new(FakeSpawner::default()), 0));

        assert!(matches!(
            processor.process(&shapes()).await,
            Err(RenderError::InvalidPoolSize(0))
        ));
    }

    #[tokio::test]
    async fn test_partial_failure_when_process_exits() {
        let spawner = Arc::new(FakeSpawner::new(Behaviour::ExitAfter(1)));
        let processor = ClassDiagramProcessor::new().output(local(spawner, 1));

        let result = processor.process(&shapes()).await.unwrap();

        let rendered: Vec<_> = result.rendered.iter().map(|d| d.name.as_str()).collect();
        let failed: Vec<_> = result.errors.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(rendered, vec!["Shape"]);
        assert_eq!(failed, vec!["Circle", "Square"]);
        assert!(matches!(
            result.errors[0].kind,
            RenderError::ProcessExited { slot: 0 }
        ));
    }

    #[tokio::test]
    async fn test_hanging_process_times_out() {
        let spawner = Arc::new(FakeSpawner::new(Behaviour::Hang));
        let processor = ClassDiagramProcessor::new()
            .output(local(spawner, 1))
            .timeout(Duration::from_millis(20));

        let result = processor.process(&shapes()).await.unwrap();

        assert!(result.rendered.is_empty());
        assert_eq!(result.errors.len(), 3);
        assert!(matches!(
            result.errors[0].kind,
            RenderError::Timeout { slot: 0, .. }
        ));
    }

    #[tokio::test]
    async fn test_hung_slot_fails_queued_jobs_without_waiting_again() {
        let mut base = Node::new(1, "Base", NodeKind::Class);
        let mut nodes = Vec::new();
        for id in 2..12 {
            let mut sub = Node::new(id, format!("Sub{id}"), NodeKind::Class);
            sub.extended_types.push(base.type_ref());
            base.extended_by.push(sub.type_ref());
            nodes.push(sub);
        }
        nodes.insert(0, base);
        let timeout = Duration::from_millis(100);
        let processor = ClassDiagramProcessor::new()
            .output(local(Arc::new(FakeSpawner::new(Behaviour::Hang)), 1))
            .timeout(timeout);

        let started = tokio::time::Instant::now();
        let result = processor.process(&Project::new(nodes)).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(result.errors.len(), 11);
        assert!(
            result
                .errors
                .iter()
                .all(|e| matches!(e.kind, RenderError::Timeout { slot: 0, .. }))
        );
        assert!(elapsed < timeout * 4, "took {elapsed:?}");
    }

    #[tokio::test]
    async fn test_cache_hits_keep_project_order() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().to_path_buf(), "1");
        let project = shapes();
        let square = project.find_by_name("Square").unwrap();
        let lines = ClassDiagramProcessor::new()
            .markup_for(&project, square)
            .unwrap();
        let markup = markup_document(&lines);
        let hash = DiagramKey {
            markup: &markup,
            format: RenderFormat::Svg,
        }
        .compute_hash();
        cache.bucket("diagrams").set(&hash, b"<svg>cached</svg>");

        let result = ClassDiagramProcessor::new()
            .output(local(Arc::new(FakeSpawner::default()), 1))
            .with_cache(cache.bucket("diagrams"))
            .process(&project)
            .await
            .unwrap();

        let names: Vec<_> = result.rendered.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Shape", "Circle", "Square"]);
        assert_eq!(
            result.rendered[2].content,
            DiagramContent::Image(b"<svg>cached</svg>".to_vec())
        );
    }

    #[tokio::test]
    async fn test_rendered_images_are_cached_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().to_path_buf(), "1");

        let first = Arc::new(FakeSpawner::default());
        let result = ClassDiagramProcessor::new()
            .output(local(first.clone(), 1))
            .with_cache(cache.bucket("diagrams"))
            .process(&shapes())
            .await
            .unwrap();
        assert_eq!(result.rendered.len(), 3);
        assert_eq!(first.spawned(), 1);

        let second = Arc::new(FakeSpawner::default());
        let cached = ClassDiagramProcessor::new()
            .output(local(second.clone(), 1))
            .with_cache(cache.bucket("diagrams"))
            .process(&shapes())
            .await
            .unwrap();

        assert_eq!(second.spawned(), 0);
        let contents: Vec<_> = cached.rendered.iter().map(|d| &d.content).collect();
        let expected: Vec<_> = result.rendered.iter().map(|d| &d.content).collect();
        assert_eq!(contents, expected);
    }
}
