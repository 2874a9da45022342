//! Configuration for mend, loaded from `config.toml`.
//!
//! [`Config::load_with_overrides`] picks the file: a `--config` path, then
//! the per-user file found by [`Config::discover`], then the defaults
//! embedded at build time. Every field is optional.

use crate::{analysis::AnalysisMode, prompt::Pass};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Suggestions requested per prompt.
    pub max_suggestions: usize,

    /// Suggestions kept after ranking.
    pub max_ranked: usize,

    pub mode: AnalysisMode,

    /// Focused passes run in thorough mode, in order.
    pub passes: Vec<Pass>,

    /// Whether thorough mode ends with the structured JSON check.
    pub structured_check: bool,

    /// Start an analysis whenever the user completes a sentence.
    pub auto_analyze: bool,

    pub backend: BackendConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_suggestions: 5,
            max_ranked: 200,
            mode: AnalysisMode::Quick,
            passes: Pass::ALL.to_vec(),
            structured_check: true,
            auto_analyze: false,
            backend: BackendConfig::default(),
        }
    }
}

/// The command-line model client to run for each request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    /// Program to spawn. The prompt is written to its stdin.
    pub program: String,

    pub args: Vec<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            program: "llm".to_string(),
            args: vec!["-m".to_string(), "gemini-2.5-flash".to_string()],
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    60
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Read a mend config file. Keys it leaves out keep their defaults;
    /// keys mend does not know about are rejected so a typo in a pass name
    /// or backend field is not silently ignored.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load the config the `mend` CLI runs with: the `--config` path wins
    /// over the per-user file, and with neither the repository's
    /// `config.toml` compiled into the binary is used.
    pub fn load_with_overrides(cli_override: Option<&Path>, discovered_path: Option<&Path>) -> Result<Self> {
        match cli_override.or(discovered_path) {
            Some(path) => Self::load(path),
            None => Self::load_embedded(),
        }
    }

    /// `<config_dir>/mend/config.toml`, when it exists.
    pub fn discover() -> Option<PathBuf> {
        let path = dirs::config_dir()?.join("mend").join("config.toml");
        path.is_file().then_some(path)
    }

    /// Defaults shipped with mend: quick mode against the `llm` client, with
    /// every focused pass enabled for thorough mode.
    fn load_embedded() -> Result<Self> {
        debug!("No config file, using embedded defaults");
        toml::from_str(include_str!("../../config.toml")).context("Failed to parse embedded config.toml")
    }
}
