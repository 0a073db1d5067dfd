//! Application configuration for ResearchDesk.
//!
//! User config lives at `~/.researchdesk/researchdesk.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ResearchDeskError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "researchdesk.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".researchdesk";

// ---------------------------------------------------------------------------
// Config structs (matching researchdesk.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Generative backend settings.
    #[serde(default)]
    pub llm: LlmConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory where run bundles are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Number of evidence items considered when deriving bullet citations.
    #[serde(default = "default_evidence_bullet_limit")]
    pub evidence_bullet_limit: usize,

    /// Maximum number of source documents harvested per run.
    #[serde(default = "default_max_sources")]
    pub max_sources: usize,

    /// Maximum number of quotes extracted from a single source.
    #[serde(default = "default_max_quotes")]
    pub max_quotes_per_source: usize,

    /// Keywords that anchor quote extraction.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            evidence_bullet_limit: default_evidence_bullet_limit(),
            max_sources: default_max_sources(),
            max_quotes_per_source: default_max_quotes(),
            keywords: Vec::new(),
        }
    }
}

fn default_output_dir() -> String {
    "./var/runs".into()
}
fn default_evidence_bullet_limit() -> usize {
    5
}
fn default_max_sources() -> usize {
    8
}
fn default_max_quotes() -> usize {
    2
}

/// Which generative backend synthesizes reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LlmProvider {
    /// No backend: the heuristic fallback builds every report.
    #[default]
    None,
    /// Any OpenAI-compatible chat completions endpoint.
    Openai,
}

/// `[llm]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Base URL of the chat completions API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Number of evidence quotes included in the synthesis prompt.
    #[serde(default = "default_max_evidence_in_prompt")]
    pub max_evidence_in_prompt: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            max_evidence_in_prompt: default_max_evidence_in_prompt(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_max_evidence_in_prompt() -> usize {
    10
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.researchdesk/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ResearchDeskError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.researchdesk/researchdesk.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ResearchDeskError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ResearchDeskError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ResearchDeskError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ResearchDeskError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ResearchDeskError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Resolve the backend API key from the configured env var.
///
/// Returns `Ok(None)` when the provider is `none`. A configured provider
/// without a key is a config error.
pub fn resolve_api_key(config: &AppConfig) -> Result<Option<String>> {
    if config.llm.provider == LlmProvider::None {
        return Ok(None);
    }

    let var_name = &config.llm.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(Some(val)),
        _ => Err(ResearchDeskError::config(format!(
            "LLM API key not found. Set the {var_name} environment variable \
             or set `provider = \"none\"` under [llm]."
        ))),
    }
}
