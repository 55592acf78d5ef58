//! Bot configuration: TOML file plus environment overrides for credentials.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{BotError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub telegram_bot_token: String,
    #[serde(default)]
    pub openweather_api_key: String,
    #[serde(default)]
    pub nasa_api_key: String,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

fn default_database_path() -> String {
    "budvabot.db".into()
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            telegram_bot_token: String::new(),
            openweather_api_key: String::new(),
            nasa_api_key: String::new(),
            database_path: default_database_path(),
            llm: LlmConfig::default(),
            watch: WatchConfig::default(),
            dispatch: DispatchConfig::default(),
        }
    }
}

impl BotConfig {
    /// Load from a TOML file if it exists, then apply environment
    /// overrides for credentials.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BotError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| BotError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Environment variables take precedence over file values.
    pub fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("TELEGRAM_BOT_TOKEN") {
            self.telegram_bot_token = v;
        }
        if let Ok(v) = std::env::var("OPENWEATHERMAP_API_KEY") {
            self.openweather_api_key = v;
        }
        if let Ok(v) = std::env::var("NASA_API_KEY") {
            self.nasa_api_key = v;
        }
        if let Ok(v) = std::env::var("LLM_API_KEY") {
            self.llm.api_key = v;
        }
        if let Ok(v) = std::env::var("BUDVABOT_DB") {
            self.database_path = v;
        }
    }

    /// Fail fast before any loop or polling starts: a partially
    /// configured process must not serve commands.
    pub fn validate(&self) -> Result<()> {
        if self.telegram_bot_token.is_empty() {
            return Err(BotError::ApiKeyMissing("telegram".into()));
        }
        if self.openweather_api_key.is_empty() {
            return Err(BotError::ApiKeyMissing("openweathermap".into()));
        }
        if self.nasa_api_key.is_empty() {
            return Err(BotError::ApiKeyMissing("nasa".into()));
        }
        if self.llm.api_key.is_empty() {
            return Err(BotError::ApiKeyMissing("llm".into()));
        }
        if self.watch.water_check_secs == 0 || self.watch.flare_check_secs == 0 {
            return Err(BotError::Config("watch intervals must be non-zero".into()));
        }
        Ok(())
    }

    /// Whether LLM commentary is available.
    pub fn llm_enabled(&self) -> bool {
        !self.llm.api_key.is_empty()
    }
}

/// LLM commentary configuration. The API key is part of the required
/// credential set; endpoint, model, and temperature have defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,
}

fn default_llm_endpoint() -> String {
    "https://api.openai.com/v1".into()
}
fn default_llm_model() -> String {
    "gpt-4o-mini".into()
}
fn default_llm_temperature() -> f32 {
    0.8
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            temperature: default_llm_temperature(),
        }
    }
}

/// Background watch loop intervals, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_water_check_secs")]
    pub water_check_secs: u64,
    #[serde(default = "default_flare_check_secs")]
    pub flare_check_secs: u64,
}

fn default_water_check_secs() -> u64 {
    3600
}
fn default_flare_check_secs() -> u64 {
    43200
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            water_check_secs: default_water_check_secs(),
            flare_check_secs: default_flare_check_secs(),
        }
    }
}

/// Outbound delivery pacing and flood-control retry bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Fixed delay between successive provider sends.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    /// Retries per recipient per message after a rate-limit signal.
    #[serde(default = "default_max_send_retries")]
    pub max_send_retries: u32,
}

fn default_pacing_ms() -> u64 {
    1200
}
fn default_max_send_retries() -> u32 {
    1
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            pacing_ms: default_pacing_ms(),
            max_send_retries: default_max_send_retries(),
        }
    }
}
