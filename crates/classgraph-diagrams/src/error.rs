//! Rendering errors.

use std::time::Duration;

/// Error produced while rendering a diagram through the process pool.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The dispatcher was configured with an empty pool.
    #[error("render pool size must be positive, got {0}")]
    InvalidPoolSize(usize),
    /// A rendering process could not be started.
    #[error("failed to start render process {slot}: {source}")]
    Spawn {
        slot: usize,
        #[source]
        source: std::io::Error,
    },
    /// The rendering process stopped before answering this job.
    #[error("render process {slot} exited before producing output")]
    ProcessExited { slot: usize },
    /// The rendering process did not answer in time.
    #[error("render process {slot} timed out after {}s", .timeout.as_secs())]
    Timeout { slot: usize, timeout: Duration },
}
