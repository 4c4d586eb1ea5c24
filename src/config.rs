use crate::error::{Result, VidsubError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings for the subtitle translation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Master switch; when false the translation orchestrator is never invoked.
    pub enabled: bool,
    /// Human-readable target language name, e.g. "Vietnamese".
    pub target_language: String,
    /// Claude model identifier.
    pub model: String,
    /// Maximum cues per translation request.
    pub batch_size: usize,
    /// Minimum delay between consecutive provider calls, in milliseconds.
    pub rate_limit_delay_ms: u64,
    /// Retries per batch after the initial attempt.
    pub max_retries: u32,
    /// Token cap for a single provider response.
    pub max_tokens: u32,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            target_language: "Vietnamese".to_string(),
            model: "claude-3-haiku-20240307".to_string(),
            batch_size: 25,
            rate_limit_delay_ms: 500,
            max_retries: 2,
            max_tokens: 4096,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub anthropic_api_key: Option<String>,
    pub output_dir: PathBuf,
    pub translation: TranslationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            output_dir: PathBuf::from("download-data"),
            translation: TranslationConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the config file (if present) and environment
    /// variables. Called once at startup; the result is passed by reference
    /// into the pipeline so core logic never does ambient lookups.
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                if let Ok(file_config) = toml::from_str::<Config>(&contents) {
                    config = file_config;
                }
            }
        }

        // Environment overrides
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            config.anthropic_api_key = Some(key);
        }
        if let Ok(dir) = std::env::var("VIDSUB_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Ok(lang) = std::env::var("VIDSUB_TARGET_LANGUAGE") {
            config.translation.target_language = lang;
        }
        if let Ok(batch) = std::env::var("VIDSUB_BATCH_SIZE") {
            if let Ok(b) = batch.parse() {
                config.translation.batch_size = b;
            }
        }
        if let Ok(delay) = std::env::var("VIDSUB_RATE_LIMIT_DELAY_MS") {
            if let Ok(d) = delay.parse() {
                config.translation.rate_limit_delay_ms = d;
            }
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.translation.enabled && self.anthropic_api_key.is_none() {
            return Err(VidsubError::Config(
                "ANTHROPIC_API_KEY not set. Export it or disable translation with --no-translate."
                    .to_string(),
            ));
        }

        if self.translation.batch_size == 0 {
            return Err(VidsubError::Config(
                "Translation batch size must be greater than 0".to_string(),
            ));
        }

        if self.translation.target_language.trim().is_empty() {
            return Err(VidsubError::Config(
                "Target language must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("vidsub").join("config.toml"))
    }
}
