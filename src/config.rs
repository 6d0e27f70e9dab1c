//! Layered configuration for the board client.
//!
//! Settings are read from `.kanban/kanban.toml` in the project directory,
//! falling back to `<config dir>/kanban/kanban.toml`, then overridden by the
//! environment and finally by CLI flags.
//!
//! # Configuration File Format
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:4000"
//! token = "eyJhbGciOi..."
//! timeout_secs = 30
//!
//! [reorder]
//! cross_scope_numbering = "preserve"
//! reject_out_of_range = false
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! dir = ".kanban/logs"
//! ```
//!
//! # Environment
//!
//! A `.env` file in the project directory is loaded first. Recognized
//! variables: `KANBAN_API_URL`, `KANBAN_TOKEN`, `KANBAN_LOG_FORMAT`,
//! `KANBAN_CROSS_SCOPE_NUMBERING`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::board::ReorderOptions;
use crate::board::reorder::CrossScopeNumbering;

pub const CONFIG_DIR: &str = ".kanban";
pub const CONFIG_FILE: &str = "kanban.toml";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Invalid log format '{}'. Valid values: pretty, json", s),
        }
    }
}

/// Board API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Transport timeout for a single request.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:4000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Reordering edge-case policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReorderSection {
    #[serde(default)]
    pub cross_scope_numbering: CrossScopeNumbering,
    #[serde(default)]
    pub reject_out_of_range: bool,
}

impl ReorderSection {
    pub fn to_options(&self) -> ReorderOptions {
        ReorderOptions {
            cross_scope_numbering: self.cross_scope_numbering,
            reject_out_of_range: self.reject_out_of_range,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    /// Write a daily-rolling log file here in addition to stderr.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            dir: None,
        }
    }
}

/// The complete kanban.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KanbanToml {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub reorder: ReorderSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl KanbanToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse kanban.toml")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize kanban.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply environment overrides on top of file values.
    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = env("KANBAN_API_URL") {
            self.api.base_url = url;
        }
        if let Some(token) = env("KANBAN_TOKEN") {
            self.api.token = Some(token);
        }
        if let Some(format) = env("KANBAN_LOG_FORMAT") {
            self.logging.format = format.parse().context("KANBAN_LOG_FORMAT")?;
        }
        if let Some(numbering) = env("KANBAN_CROSS_SCOPE_NUMBERING") {
            self.reorder.cross_scope_numbering =
                numbering.parse().context("KANBAN_CROSS_SCOPE_NUMBERING")?;
        }
        Ok(())
    }
}

/// Values a user can pass on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_url: Option<String>,
    pub token: Option<String>,
    pub verbose: bool,
}

/// Resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub project_dir: PathBuf,
    /// File the settings were read from, if any.
    pub source: Option<PathBuf>,
    pub verbose: bool,
    pub file: KanbanToml,
}

impl Settings {
    /// Resolve settings for `project_dir`: file, then `.env` and process
    /// environment, then CLI flags.
    pub fn load(project_dir: &Path, overrides: CliOverrides) -> Result<Self> {
        // A missing .env is normal.
        let _ = dotenvy::from_path(project_dir.join(".env"));

        Self::resolve(
            project_dir,
            dirs::config_dir().as_deref(),
            |key| std::env::var(key).ok(),
            overrides,
        )
    }

    /// Layering behind [`Settings::load`] with the user config dir and the
    /// environment lookup supplied by the caller.
    pub fn resolve(
        project_dir: &Path,
        user_config_dir: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
        overrides: CliOverrides,
    ) -> Result<Self> {
        let source = Self::find_config_file(project_dir, user_config_dir);
        let mut file = match &source {
            Some(path) => KanbanToml::load(path)?,
            None => KanbanToml::default(),
        };
        file.apply_env(env)?;

        if let Some(url) = overrides.api_url {
            file.api.base_url = url;
        }
        if let Some(token) = overrides.token {
            file.api.token = Some(token);
        }

        Ok(Self {
            project_dir: project_dir.to_path_buf(),
            source,
            verbose: overrides.verbose,
            file,
        })
    }

    /// `.kanban/kanban.toml` under the project, then
    /// `<user_config_dir>/kanban/kanban.toml`.
    pub fn find_config_file(
        project_dir: &Path,
        user_config_dir: Option<&Path>,
    ) -> Option<PathBuf> {
        let local = Self::project_config_path(project_dir);
        if local.exists() {
            return Some(local);
        }
        user_config_dir
            .map(|dir| dir.join("kanban").join(CONFIG_FILE))
            .filter(|path| path.exists())
    }

    pub fn project_config_path(project_dir: &Path) -> PathBuf {
        project_dir.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    pub fn base_url(&self) -> &str {
        &self.file.api.base_url
    }

    pub fn token(&self) -> Option<String> {
        self.file.api.token.clone()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.file.api.timeout_secs)
    }

    pub fn reorder_options(&self) -> ReorderOptions {
        self.file.reorder.to_options()
    }

    /// Default log filter: `debug` for this crate with `--verbose`, the
    /// configured level otherwise.
    pub fn log_filter(&self) -> String {
        if self.verbose {
            "kanban=debug".to_string()
        } else {
            self.file.logging.level.clone()
        }
    }

    /// Log directory, resolved against the project directory.
    pub fn log_dir(&self) -> Option<PathBuf> {
        self.file.logging.dir.as_ref().map(|dir| {
            if dir.is_absolute() {
                dir.clone()
            } else {
                self.project_dir.join(dir)
            }
        })
    }

    /// Settings as TOML with the token masked.
    pub fn redacted_toml(&self) -> Result<String> {
        let mut file = self.file.clone();
        if file.api.token.is_some() {
            file.api.token = Some("********".to_string());
        }
        toml::to_string_pretty(&file).context("Failed to serialize settings")
    }
}
