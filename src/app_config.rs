use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Model tier configuration (primary / lite / pro)
    #[serde(default)]
    pub tiers: TierSettings,

    /// Residue classification thresholds
    #[serde(default)]
    pub thresholds: ResidueThresholds,

    /// Maximum characters per shard when splitting a chapter
    #[serde(default = "default_max_shard_chars")]
    pub max_shard_chars: usize,

    /// Minimum interval between over-budget batches, in seconds
    #[serde(default = "default_batch_interval_secs")]
    pub batch_interval_secs: u64,

    /// Hard per-call timeout for model requests, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// API endpoint base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tiers: TierSettings::default(),
            thresholds: ResidueThresholds::default(),
            max_shard_chars: default_max_shard_chars(),
            batch_interval_secs: default_batch_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            api_key_env: default_api_key_env(),
            endpoint: default_endpoint(),
            log_level: LogLevel::default(),
        }
    }
}

/// Per-model settings for one tier
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ModelSettings {
    /// Model name (e.g. "gemini-2.0-flash")
    pub model: String,

    /// Worker pool size and rate-limit budget for this tier
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,

    /// Top probability mass to consider (nucleus sampling)
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Top k tokens to consider
    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Maximum number of tokens to generate
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl ModelSettings {
    fn with_model(model: &str, batch_size: usize) -> Self {
        Self {
            model: model.to_string(),
            batch_size,
            temperature: 0.0,
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

/// The three model tiers used by the orchestrator phases
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TierSettings {
    /// First-pass translation of new shards
    #[serde(default = "default_primary_settings")]
    pub primary: ModelSettings,

    /// Cheaper model used only for residue-cleanup retries
    #[serde(default = "default_lite_settings")]
    pub lite: ModelSettings,

    /// Stronger model used for full retries of outright failures
    #[serde(default = "default_pro_settings")]
    pub pro: ModelSettings,
}

impl Default for TierSettings {
    fn default() -> Self {
        Self {
            primary: default_primary_settings(),
            lite: default_lite_settings(),
            pro: default_pro_settings(),
        }
    }
}

/// Thresholds for classifying untranslated-residue ratios, in percent.
///
/// The second-pass bound is tighter than the first-pass one because the lite
/// tier operates on already-mostly-translated text.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ResidueThresholds {
    /// At or below this ratio the output counts as a success
    #[serde(default = "default_success_max_pct")]
    pub success_max_pct: f64,

    /// Above success and at or below this ratio the output is kept but
    /// recorded as partial residue
    #[serde(default = "default_partial_max_pct")]
    pub partial_max_pct: f64,

    /// Success bound for residue-cleanup retries on the lite tier
    #[serde(default = "default_retry_success_max_pct")]
    pub retry_success_max_pct: f64,
}

impl Default for ResidueThresholds {
    fn default() -> Self {
        Self {
            success_max_pct: default_success_max_pct(),
            partial_max_pct: default_partial_max_pct(),
            retry_success_max_pct: default_retry_success_max_pct(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_max_shard_chars() -> usize {
    6000
}

fn default_batch_interval_secs() -> u64 {
    66
}

fn default_request_timeout_secs() -> u64 {
    180
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_batch_size() -> usize {
    15
}

fn default_top_p() -> f32 {
    0.95
}

fn default_top_k() -> u32 {
    64
}

fn default_max_output_tokens() -> u32 {
    8192
}

fn default_primary_settings() -> ModelSettings {
    ModelSettings::with_model("gemini-2.0-flash", 15)
}

fn default_lite_settings() -> ModelSettings {
    ModelSettings::with_model("gemini-2.0-flash-lite", 30)
}

fn default_pro_settings() -> ModelSettings {
    ModelSettings::with_model("gemini-2.0-pro-exp", 5)
}

fn default_success_max_pct() -> f64 {
    0.5
}

fn default_partial_max_pct() -> f64 {
    20.0
}

fn default_retry_success_max_pct() -> f64 {
    10.0
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.max_shard_chars == 0 {
            return Err(anyhow!("max_shard_chars must be greater than zero"));
        }
        for (name, tier) in [
            ("primary", &self.tiers.primary),
            ("lite", &self.tiers.lite),
            ("pro", &self.tiers.pro),
        ] {
            if tier.model.is_empty() {
                return Err(anyhow!("Model name for {} tier cannot be empty", name));
            }
            if tier.batch_size == 0 {
                return Err(anyhow!("Batch size for {} tier must be greater than zero", name));
            }
        }
        let t = &self.thresholds;
        if !(0.0..=100.0).contains(&t.success_max_pct)
            || !(0.0..=100.0).contains(&t.partial_max_pct)
            || !(0.0..=100.0).contains(&t.retry_success_max_pct)
        {
            return Err(anyhow!("Residue thresholds must be percentages between 0 and 100"));
        }
        if t.success_max_pct > t.partial_max_pct {
            return Err(anyhow!(
                "success_max_pct ({}) cannot exceed partial_max_pct ({})",
                t.success_max_pct,
                t.partial_max_pct
            ));
        }
        Ok(())
    }

    /// Retrieve the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env)
            .map_err(|_| anyhow!("API key not found. Set environment variable: {}", self.api_key_env))
    }
}
