//! `classgraph build` command implementation.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use classgraph_cache::{Cache, FileCache};
use classgraph_config::{CliSettings, Config, RenderConfig, RenderLocation};
use classgraph_diagrams::{
    ClassDiagramProcessor, DiagramContent, DiagramOutput, PlantUmlSpawner, RenderFormat,
    RenderedDiagram,
};

use super::{ensure_project_dir, load_project};
use crate::error::CliError;
use crate::output::Output;

/// File listing diagram URLs when rendering remotely.
const URL_INDEX_FILENAME: &str = "diagrams.json";

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover classgraph.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reflection project JSON file (overrides config).
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output directory for diagrams (overrides config).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Where diagrams are rendered: remote or local (overrides config).
    #[arg(long, value_parser = parse_location)]
    location: Option<RenderLocation>,

    /// Image format: svg or png (overrides config).
    #[arg(long, value_parser = parse_format)]
    format: Option<RenderFormat>,

    /// PlantUML server URL for remote rendering (overrides config).
    #[arg(long, env = "CLASSGRAPH_SERVER_URL")]
    server_url: Option<String>,

    /// Number of local PlantUML processes, 0 for one per CPU (overrides config).
    #[arg(long)]
    pool_size: Option<usize>,

    /// Disable caching of rendered images.
    #[arg(long)]
    no_cache: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

fn parse_location(s: &str) -> Result<RenderLocation, String> {
    RenderLocation::parse(s).ok_or_else(|| format!("unknown location '{s}' (expected remote or local)"))
}

fn parse_format(s: &str) -> Result<RenderFormat, String> {
    RenderFormat::parse(s).ok_or_else(|| format!("unknown format '{s}' (expected svg or png)"))
}

impl BuildArgs {
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            project: self.input,
            output_dir: self.output,
            location: self.location,
            format: self.format,
            server_url: self.server_url,
            pool_size: self.pool_size,
            cache_enabled: self.no_cache.then_some(false),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let render = &config.render_resolved;

        if let Some(path) = &config.config_path {
            output.info(&format!("Config: {}", path.display()));
        }
        output.info(&format!(
            "Project: {}",
            config.input_resolved.project.display()
        ));
        let project = load_project(&config.input_resolved.project)?;

        let mut processor = ClassDiagramProcessor::new()
            .options(config.diagrams.clone())
            .output(diagram_output(render))
            .timeout(render.timeout);

        if render.location == RenderLocation::Local && render.cache_enabled {
            ensure_project_dir(&render.project_dir)?;
            let cache = FileCache::new(render.cache_dir(), env!("CARGO_PKG_VERSION"));
            processor = processor.with_cache(cache.bucket(render.format.as_str()));
        }

        let result = processor.process(&project).await?;

        std::fs::create_dir_all(&render.output_dir)?;
        let written = write_diagrams(&result.rendered, &render.output_dir)?;

        for error in &result.errors {
            output.warning(&format!("Warning: {error}"));
        }

        output.success(&format!(
            "Generated {written} diagram(s) in {}",
            render.output_dir.display()
        ));

        if result.errors.is_empty() {
            Ok(())
        } else {
            Err(CliError::Failed(result.errors.len()))
        }
    }
}

fn diagram_output(render: &RenderConfig) -> DiagramOutput {
    match render.location {
        RenderLocation::Remote => DiagramOutput::Remote {
            server_url: render.server_url.clone(),
            format: render.format,
        },
        RenderLocation::Local => DiagramOutput::Local {
            pool_size: render.pool_size,
            format: render.format,
            spawner: Arc::new(PlantUmlSpawner::new(&render.command).args(&render.args)),
        },
    }
}

/// Write images as `<name>.<ext>` and URLs into one index file.
///
/// Returns the number of diagrams written.
fn write_diagrams(diagrams: &[RenderedDiagram], dir: &Path) -> Result<usize, CliError> {
    let mut used = HashSet::new();
    let mut urls = BTreeMap::new();

    for diagram in diagrams {
        let stem = unique_stem(diagram, &mut used);
        match &diagram.content {
            DiagramContent::Image(bytes) => {
                let path = dir.join(format!("{stem}.{}", diagram.format.as_str()));
                tracing::debug!(path = %path.display(), "writing diagram");
                std::fs::write(path, bytes)?;
            }
            DiagramContent::Url(url) => {
                urls.insert(stem, url.as_str());
            }
        }
    }

    if !urls.is_empty() {
        let json = serde_json::to_string_pretty(&urls)?;
        std::fs::write(dir.join(URL_INDEX_FILENAME), json)?;
    }

    Ok(diagrams.len())
}

/// File stem for a diagram, suffixed with the node id when the name is taken.
fn unique_stem(diagram: &RenderedDiagram, used: &mut HashSet<String>) -> String {
    let base: String = diagram
        .name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = if used.contains(&base) {
        format!("{base}-{}", diagram.node.0)
    } else {
        base
    };
    used.insert(stem.clone());
    stem
}
