//! Settings structures for SearchChat-RS configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Desktop browser identity sent to the search provider unless rotation is enabled
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Main settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub model: ModelSettings,
    pub search: SearchSettings,
    pub memory: MemorySettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables (SEARCHCHAT_* prefix)
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("SEARCHCHAT_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Ok(val) = std::env::var("SEARCHCHAT_MODEL") {
            self.model.name = val;
        }
        if let Ok(val) = std::env::var("SEARCHCHAT_OLLAMA_URL") {
            self.model.base_url = val;
        }
        if let Ok(val) = std::env::var("SEARCHCHAT_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                self.model.timeout_secs = secs;
            }
        }
    }

    /// Reject configurations the assistant cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.model.name.trim().is_empty() {
            bail!("model name must not be empty");
        }
        if let Err(e) = Url::parse(&self.model.base_url) {
            bail!("invalid model base_url '{}': {}", self.model.base_url, e);
        }
        if self.model.timeout_secs == 0 {
            bail!("model timeout must be greater than zero");
        }
        if !(0.0..=1.0).contains(&self.model.temperature) {
            bail!(
                "model temperature must be within 0.0..=1.0, got {}",
                self.model.temperature
            );
        }
        if let Err(e) = Url::parse(&self.search.endpoint) {
            bail!("invalid search endpoint '{}': {}", self.search.endpoint, e);
        }
        if self.search.request_timeout_secs == 0 {
            bail!("search request timeout must be greater than zero");
        }
        if self.memory.max_turns == 0 {
            bail!("memory must hold at least one turn");
        }
        let min_chars = MemorySettings::MIN_TEXT_CHARS;
        if self.memory.user_max_chars < min_chars || self.memory.assistant_max_chars < min_chars {
            bail!("memory text limits must be at least {} characters", min_chars);
        }
        Ok(())
    }

    /// The immutable model configuration owned by the orchestrator
    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            model_name: self.model.name.clone(),
            timeout: Duration::from_secs(self.model.timeout_secs),
            temperature: self.model.temperature,
        }
    }
}

/// General settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
}

/// Language model backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Model to request from the backend
    pub name: String,
    /// Ollama server URL
    pub base_url: String,
    /// Deadline for a whole turn, in seconds
    pub timeout_secs: u64,
    /// Sampling temperature
    pub temperature: f32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: "llama3.1".to_string(),
            base_url: "http://localhost:11434".to_string(),
            timeout_secs: 120,
            temperature: 0.5,
        }
    }
}

/// Search provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// HTML results endpoint
    pub endpoint: String,
    /// Client-side request timeout in seconds
    pub request_timeout_secs: u64,
    /// Pause before every outbound request, in milliseconds
    pub rate_limit_delay_ms: u64,
    /// Maximum number of hits kept per query
    pub max_results: usize,
    /// User agent string (none = random)
    pub user_agent: Option<String>,
    /// Generate a fresh random user agent on every request
    pub rotate_user_agent: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://duckduckgo.com/html/".to_string(),
            request_timeout_secs: 10,
            rate_limit_delay_ms: 2000,
            max_results: 5,
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
            rotate_user_agent: false,
        }
    }
}

impl SearchSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }
}

/// Conversation memory bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySettings {
    /// Maximum stored turns (two per exchange)
    pub max_turns: usize,
    /// Stored length limit for user input, in characters
    pub user_max_chars: usize,
    /// Stored length limit for assistant output, in characters
    pub assistant_max_chars: usize,
}

impl MemorySettings {
    /// Room for the "..." that marks truncated text
    pub const MIN_TEXT_CHARS: usize = 3;
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            max_turns: 10,
            user_max_chars: 100,
            assistant_max_chars: 200,
        }
    }
}

/// Model name and per-turn deadline, fixed for the process lifetime
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub model_name: String,
    pub timeout: Duration,
    pub temperature: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Settings::default().model_config()
    }
}
