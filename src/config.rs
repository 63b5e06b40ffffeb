use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Default config directory: ~/.swarmd/
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".swarmd")
}

/// Default config file path: ~/.swarmd/settings.json
pub fn default_config_path() -> PathBuf {
    config_dir().join("settings.json")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Ingress HTTP port.
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Empty disables the researcher worker.
    #[serde(default)]
    pub tavily_api_key: String,
}

fn default_version() -> u32 {
    1
}
fn default_port() -> u16 {
    8000
}
fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_llm_base_url(),
            model: default_llm_model(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            port: default_port(),
            llm: LlmConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {e}", path.display()))?;
        Ok(config)
    }

    /// Apply `SWARMD_*` (and provider-conventional) env overrides on top
    /// of whatever the file provided.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(port) = env_or(&["SWARMD_PORT"]).and_then(|v| v.parse().ok()) {
            self.port = port;
        }
        if let Some(key) = env_or(&["SWARMD_LLM_API_KEY", "OPENAI_API_KEY"]) {
            self.llm.api_key = key;
        }
        if let Some(base_url) = env_or(&["SWARMD_LLM_BASE_URL"]) {
            self.llm.base_url = base_url;
        }
        if let Some(model) = env_or(&["SWARMD_LLM_MODEL", "OPENAI_MODEL"]) {
            self.llm.model = model;
        }
        if let Some(key) = env_or(&["SWARMD_TAVILY_API_KEY", "TAVILY_API_KEY"]) {
            self.search.tavily_api_key = key;
        }
        self
    }

    /// True when the environment alone is enough to run (no config file).
    pub fn has_required_env_vars() -> bool {
        env_or(&["SWARMD_LLM_API_KEY", "OPENAI_API_KEY"]).is_some()
    }
}

fn env_or(keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
}
