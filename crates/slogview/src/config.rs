//! Project configuration file support for slogview.
//!
//! Loads defaults from `slogview.toml` in the working directory.

use anyhow::{Context, Result};
use serde::Deserialize;
use slogview_logging::LogFormat;
use slogview_parser::LogEncoding;
use std::path::{Path, PathBuf};

/// Project-level configuration loaded from `slogview.toml`
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Directory holding `<project_code>_db.sqlite`
    pub store_path: Option<PathBuf>,
    /// Directory for rendered timelines
    pub html_dir: Option<PathBuf>,
    pub encoding: Option<LogEncoding>,
    pub pair_syncs: Option<bool>,
    pub log_format: Option<LogFormat>,
    /// Tracing filter, e.g. `debug` or `slogview_parser=trace`
    pub log_level: Option<String>,
}

/// The config file name
pub const CONFIG_FILE_NAME: &str = "slogview.toml";

impl ProjectConfig {
    /// Load configuration from the working directory.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(working_dir: &Path) -> Result<Option<Self>> {
        let config_path = working_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(Some(config))
    }
}
