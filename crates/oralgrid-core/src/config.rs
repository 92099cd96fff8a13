//! oralgrid configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::export::{ExportLayout, ExportOptions};
use crate::model::Status;
use crate::store::DEFAULT_CONFIRM_TTL_SECS;

/// Status assumed when the evaluator leaves a criterion's answer empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultStatus {
    /// No default: every criterion needs an explicit answer or skip.
    #[default]
    Unset,
    Satisfied,
    Unsatisfied,
}

impl DefaultStatus {
    pub fn status(&self) -> Option<Status> {
        match self {
            DefaultStatus::Unset => None,
            DefaultStatus::Satisfied => Some(Status::Satisfied),
            DefaultStatus::Unsatisfied => Some(Status::Unsatisfied),
        }
    }
}

/// Top-level oralgrid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OralgridConfig {
    /// Catalog TOML file; the built-in grid when absent.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    /// Answer assumed for an empty input in the form.
    #[serde(default)]
    pub default_status: DefaultStatus,
    /// Directory receiving export and HTML files.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Seconds a clear request stays open for confirmation (1 to 86400).
    #[serde(default = "default_confirm_ttl")]
    pub confirm_ttl_secs: u64,
    /// Export layout used by the session's `export` command.
    #[serde(default)]
    pub export_layout: ExportLayout,
    /// Escape non-ASCII characters in exports.
    #[serde(default)]
    pub ascii_only: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_confirm_ttl() -> u64 {
    DEFAULT_CONFIRM_TTL_SECS
}

impl Default for OralgridConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            default_status: DefaultStatus::default(),
            output_dir: default_output_dir(),
            confirm_ttl_secs: default_confirm_ttl(),
            export_layout: ExportLayout::default(),
            ascii_only: false,
        }
    }
}

impl OralgridConfig {
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            layout: self.export_layout,
            ascii_only: self.ascii_only,
        }
    }

    /// Load the configured catalog, or the built-in grid.
    pub fn load_catalog(&self) -> Result<Catalog> {
        match &self.catalog {
            Some(path) => Catalog::load(path),
            None => Ok(Catalog::builtin()),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not scanned again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + end];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `oralgrid.toml` in the current directory
/// 2. `~/.config/oralgrid/config.toml`
///
/// Environment variable overrides: `ORALGRID_CATALOG`, `ORALGRID_OUTPUT_DIR`.
pub fn load_config() -> Result<OralgridConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<OralgridConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("oralgrid.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match &config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<OralgridConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => OralgridConfig::default(),
    };

    if let Ok(catalog) = std::env::var("ORALGRID_CATALOG") {
        config.catalog = Some(PathBuf::from(catalog));
    }
    if let Ok(dir) = std::env::var("ORALGRID_OUTPUT_DIR") {
        config.output_dir = PathBuf::from(dir);
    }

    config.catalog = config.catalog.as_deref().map(resolve_path);
    config.output_dir = resolve_path(&config.output_dir);

    match &config_path {
        Some(path) => tracing::debug!(path = %path.display(), "configuration loaded"),
        None => tracing::debug!("no configuration file, using defaults"),
    }

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("oralgrid"))
}
