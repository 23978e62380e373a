//! Output mode for rendered diagrams.
//!
//! - [`Remote`](DiagramOutput::Remote): encode markup into a PlantUML server URL (default)
//! - [`Local`](DiagramOutput::Local): render image bytes through a pool of local processes

use std::sync::Arc;

use crate::consts::DEFAULT_SERVER_URL;
use crate::format::RenderFormat;
use crate::process::{PlantUmlSpawner, ProcessSpawner};

/// How the processor turns markup into a diagram.
#[derive(Clone)]
pub enum DiagramOutput {
    /// Reference a remote PlantUML server; nothing is rendered locally.
    Remote {
        server_url: String,
        format: RenderFormat,
    },
    /// Render with `pool_size` long-lived processes started by `spawner`.
    Local {
        pool_size: usize,
        format: RenderFormat,
        spawner: Arc<dyn ProcessSpawner>,
    },
}

impl Default for DiagramOutput {
    fn default() -> Self {
        Self::Remote {
            server_url: DEFAULT_SERVER_URL.to_owned(),
            format: RenderFormat::default(),
        }
    }
}

impl DiagramOutput {
    /// Local rendering through the `plantuml` executable.
    #[must_use]
    pub fn plantuml(pool_size: usize, format: RenderFormat) -> Self {
        Self::Local {
            pool_size,
            format,
            spawner: Arc::new(PlantUmlSpawner::default()),
        }
    }

    #[must_use]
    pub fn format(&self) -> RenderFormat {
        match self {
            Self::Remote { format, .. } | Self::Local { format, .. } => *format,
        }
    }
}

impl std::fmt::Debug for DiagramOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote { server_url, format } => f
                .debug_struct("Remote")
                .field("server_url", server_url)
                .field("format", format)
                .finish(),
            Self::Local {
                pool_size, format, ..
            } => f
                .debug_struct("Local")
                .field("pool_size", pool_size)
                .field("format", format)
                .finish_non_exhaustive(),
        }
    }
}
