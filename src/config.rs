//! Configuration management for the extraction and evaluation pipeline
//!
//! Loads settings from TOML files and provides runtime access. All state is
//! carried explicitly: components receive the sections they need at
//! construction time instead of reading process-wide globals.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base directory holding docs/, templates/, output/, validation/ and
    /// evaluation/ subtrees.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Generative model selection and request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_name")]
    pub name: String,
    #[serde(default)]
    pub generation: GenerationSettings,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            generation: GenerationSettings::default(),
        }
    }
}

/// Request-level generation settings. The defaults pin the model to
/// deterministic decoding so extraction runs are reproducible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    #[serde(default)]
    pub temperature: f32,
    #[serde(default)]
    pub top_p: f32,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_candidate_count")]
    pub candidate_count: u32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            top_p: 0.0,
            top_k: default_top_k(),
            candidate_count: default_candidate_count(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

/// Batch extraction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of documents processed concurrently
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,
    /// Per-request timeout applied by the HTTP client
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_model_name() -> String {
    "gemini-1.5-pro-002".to_string()
}
fn default_top_k() -> u32 {
    1
}
fn default_candidate_count() -> u32 {
    1
}
fn default_max_output_tokens() -> u32 {
    8192
}
fn default_concurrency() -> usize {
    5
}
fn default_retry_count() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    1000
}
fn default_max_retry_delay_ms() -> u64 {
    60_000
}
fn default_timeout_ms() -> u64 {
    120_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            model: ModelConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from default config locations or return defaults
    pub fn load_or_default() -> Self {
        let config_paths = ["enermetrics.toml", "config/enermetrics.toml"];

        for path in &config_paths {
            if let Ok(config) = Self::from_file(path) {
                tracing::info!("Loaded configuration from {}", path);
                return config;
            }
        }

        tracing::info!("Using default configuration");
        Self::default()
    }

    /// Save configuration to a TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Extraction workflow. Selects template and output layout only; the
/// evaluation comparison is workflow-independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Workflow {
    /// One model call extracts every metric at once
    SingleStep,
    /// Four chained model calls refine the extraction step by step
    MultiStep,
}

impl Workflow {
    /// Directory/file-layout name for this workflow
    pub fn as_str(&self) -> &'static str {
        match self {
            Workflow::SingleStep => "single_step",
            Workflow::MultiStep => "multi_step",
        }
    }
}

impl std::fmt::Display for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Workflow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single_step" | "single-step" => Ok(Workflow::SingleStep),
            "multi_step" | "multi-step" => Ok(Workflow::MultiStep),
            other => Err(format!("Unknown workflow: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.pipeline.concurrency, 5);
        assert_eq!(config.model.generation.temperature, 0.0);
        assert_eq!(config.model.generation.max_output_tokens, 8192);
    }

    #[test]
    fn test_parse_toml_config() {
        let toml = r#"
data_dir = "/srv/reports"

[model]
name = "gemini-1.5-flash-002"

[model.generation]
max_output_tokens = 4096

[pipeline]
concurrency = 2
"#;
        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/reports"));
        assert_eq!(config.model.name, "gemini-1.5-flash-002");
        assert_eq!(config.model.generation.max_output_tokens, 4096);
        assert_eq!(config.model.generation.top_k, 1);
        assert_eq!(config.pipeline.concurrency, 2);
        assert_eq!(config.pipeline.retry_count, 3);
    }

    #[test]
    fn test_workflow_round_trip() {
        assert_eq!(Workflow::SingleStep.as_str(), "single_step");
        assert_eq!("multi-step".parse::<Workflow>().unwrap(), Workflow::MultiStep);
        assert!("three_step".parse::<Workflow>().is_err());
    }
}
