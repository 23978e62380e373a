//! `classgraph markup` command implementation.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use classgraph_config::{CliSettings, Config};
use classgraph_diagrams::{ClassDiagramProcessor, markup_document};

use super::load_project;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the markup command.
#[derive(Args)]
pub(crate) struct MarkupArgs {
    /// Name of the class or interface.
    name: String,

    /// Path to configuration file (default: auto-discover classgraph.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reflection project JSON file (overrides config).
    #[arg(short, long)]
    input: Option<PathBuf>,
}

impl MarkupArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            project: self.input,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let project = load_project(&config.input_resolved.project)?;

        let node = project.find_by_name(&self.name).ok_or_else(|| {
            CliError::Validation(format!("No declaration named '{}'", self.name))
        })?;

        let processor = ClassDiagramProcessor::new().options(config.diagrams.clone());
        match processor.markup_for(&project, node) {
            Some(lines) => io::stdout().write_all(markup_document(&lines).as_bytes())?,
            None => output.warning(&format!("{} has no class hierarchy", node.name)),
        }
        Ok(())
    }
}
