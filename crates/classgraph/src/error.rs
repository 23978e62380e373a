//! CLI error types.

use classgraph_config::ConfigError;
use classgraph_diagrams::RenderError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Render(#[from] RenderError),

    #[error("invalid reflection project: {0}")]
    Project(#[from] serde_json::Error),

    #[error("{0} diagram(s) failed to render")]
    Failed(usize),

    #[error("{0}")]
    Validation(String),
}
