//! Configuration management for classgraph.
//!
//! Parses `classgraph.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Sections
//!
//! - `[input]`: location of the reflection project (`project`)
//! - `[diagrams]`: code generation options, with style settings under `[diagrams.style]`
//! - `[render]`: where and how diagrams are rendered
//!
//! ## Environment Variable Expansion
//!
//! `render.server_url` supports environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

mod expand;

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use classgraph_diagrams::{CodeGenOptions, DEFAULT_SERVER_URL, RenderFormat};
use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override reflection project path.
    pub project: Option<PathBuf>,
    /// Override output directory.
    pub output_dir: Option<PathBuf>,
    /// Override render location.
    pub location: Option<RenderLocation>,
    /// Override output format.
    pub format: Option<RenderFormat>,
    /// Override remote PlantUML server.
    pub server_url: Option<String>,
    /// Override process pool size (0 means one per CPU).
    pub pool_size: Option<usize>,
    /// Override cache enabled flag.
    pub cache_enabled: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "classgraph.toml";

/// Default per-diagram render timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Code generation options.
    pub diagrams: CodeGenOptions,
    /// Input configuration (paths are relative strings from TOML).
    input: InputConfigRaw,
    /// Render configuration as written in TOML.
    render: RenderConfigRaw,

    /// Resolved input configuration (set after loading).
    #[serde(skip)]
    pub input_resolved: InputConfig,
    /// Resolved render configuration (set after loading).
    #[serde(skip)]
    pub render_resolved: RenderConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw input configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct InputConfigRaw {
    project: Option<String>,
}

/// Resolved input configuration with absolute paths.
#[derive(Debug, Default)]
pub struct InputConfig {
    /// Reflection project JSON file.
    pub project: PathBuf,
}

/// Where diagrams are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderLocation {
    /// Link to a remote PlantUML server.
    #[default]
    Remote,
    /// Render with local PlantUML processes.
    Local,
}

impl RenderLocation {
    /// Parse location from a CLI value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "remote" => Some(Self::Remote),
            "local" => Some(Self::Local),
            _ => None,
        }
    }
}

/// Raw render configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RenderConfigRaw {
    location: Option<RenderLocation>,
    format: Option<RenderFormat>,
    server_url: Option<String>,
    /// Non-positive or missing means one process per CPU.
    pool_size: Option<i64>,
    command: Option<String>,
    args: Option<Vec<String>>,
    timeout_secs: Option<u64>,
    cache_enabled: Option<bool>,
    output_dir: Option<String>,
}

/// Resolved render configuration.
#[derive(Debug)]
pub struct RenderConfig {
    pub location: RenderLocation,
    pub format: RenderFormat,
    /// PlantUML server for remote rendering.
    pub server_url: String,
    /// Number of local PlantUML processes.
    pub pool_size: usize,
    /// PlantUML launcher for local rendering.
    pub command: String,
    /// Arguments passed to `command` before the pipe-mode flags.
    pub args: Vec<String>,
    /// Per-diagram render timeout.
    pub timeout: Duration,
    /// Whether rendered images are cached between runs.
    pub cache_enabled: bool,
    /// Directory diagrams are written to.
    pub output_dir: PathBuf,
    /// Project directory for classgraph data (`.classgraph/`).
    pub project_dir: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

impl RenderConfig {
    fn default_with_base(base: &Path) -> Self {
        Self {
            location: RenderLocation::default(),
            format: RenderFormat::default(),
            server_url: DEFAULT_SERVER_URL.to_owned(),
            pool_size: host_parallelism(),
            command: "plantuml".to_owned(),
            args: Vec::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache_enabled: true,
            output_dir: base.join("diagrams"),
            project_dir: base.join(".classgraph"),
        }
    }

    /// Cache directory path (`.classgraph/cache/`).
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.project_dir.join("cache")
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`render.server_url`").
        field: String,
        /// Error message (e.g., "${`PLANTUML_SERVER`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Pool size for a configured value; non-positive means one process per CPU.
fn resolve_pool_size(configured: Option<i64>) -> usize {
    configured
        .and_then(|n| usize::try_from(n).ok())
        .filter(|&n| n > 0)
        .unwrap_or_else(host_parallelism)
}

fn host_parallelism() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `classgraph.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        let render = &mut self.render_resolved;
        if let Some(project) = &settings.project {
            self.input_resolved.project.clone_from(project);
        }
        if let Some(output_dir) = &settings.output_dir {
            render.output_dir.clone_from(output_dir);
        }
        if let Some(location) = settings.location {
            render.location = location;
        }
        if let Some(format) = settings.format {
            render.format = format;
        }
        if let Some(server_url) = &settings.server_url {
            render.server_url.clone_from(server_url);
        }
        if let Some(pool_size) = settings.pool_size {
            render.pool_size = if pool_size == 0 {
                host_parallelism()
            } else {
                pool_size
            };
        }
        if let Some(cache_enabled) = settings.cache_enabled {
            render.cache_enabled = cache_enabled;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            diagrams: CodeGenOptions::default(),
            input: InputConfigRaw::default(),
            render: RenderConfigRaw::default(),
            input_resolved: InputConfig {
                project: base.join("project.json"),
            },
            render_resolved: RenderConfig::default_with_base(base),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let render = &self.render_resolved;

        if render.location == RenderLocation::Remote {
            require_non_empty(&render.server_url, "render.server_url")?;
            require_http_url(&render.server_url, "render.server_url")?;
        }
        if render.location == RenderLocation::Local {
            require_non_empty(&render.command, "render.command")?;
        }
        if render.timeout.is_zero() {
            return Err(ConfigError::Validation(
                "render.timeout_secs must be greater than 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref url) = self.render.server_url {
            self.render.server_url = Some(expand::expand_env(url, "render.server_url")?);
        }
        Ok(())
    }

    /// Resolve raw sections against defaults and the config directory.
    fn resolve(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));
        let defaults = RenderConfig::default_with_base(config_dir);
        let raw = &self.render;

        self.input_resolved = InputConfig {
            project: resolve(self.input.project.as_deref(), "project.json"),
        };

        self.render_resolved = RenderConfig {
            location: raw.location.unwrap_or(defaults.location),
            format: raw.format.unwrap_or(defaults.format),
            server_url: raw.server_url.clone().unwrap_or(defaults.server_url),
            pool_size: resolve_pool_size(raw.pool_size),
            command: raw.command.clone().unwrap_or(defaults.command),
            args: raw.args.clone().unwrap_or_default(),
            timeout: raw
                .timeout_secs
                .map_or(defaults.timeout, Duration::from_secs),
            cache_enabled: raw.cache_enabled.unwrap_or(defaults.cache_enabled),
            output_dir: resolve(raw.output_dir.as_deref(), "diagrams"),
            project_dir: defaults.project_dir,
        };
    }
}
