//! Configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that forces the approval gate open
pub const AUTO_APPROVE_ENV: &str = "CONCIERGE_AUTO_APPROVE";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Dialog engine limits
    pub engine: EngineConfig,

    /// Checkpoint storage configuration
    pub storage: StorageConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if std::env::var(&self.llm.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.llm.api_key_env
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .concierge.yml
        let local_config = PathBuf::from(".concierge.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/concierge/concierge.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("concierge").join("concierge.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name ("openai" or "azure-openai")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl LlmConfig {
    /// Resolve the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env)
            .context(format!("API key environment variable {} not set", self.api_key_env))
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            max_tokens: 4096,
            timeout_ms: 120_000,
        }
    }
}

/// Dialog engine limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum handler/tool steps in a single turn
    #[serde(rename = "max-steps-per-turn")]
    pub max_steps_per_turn: usize,

    /// Maximum dialog stack depth (primary alone is depth 1)
    #[serde(rename = "max-dialog-depth")]
    pub max_dialog_depth: usize,

    /// Skip the approval gate for sensitive tools
    #[serde(rename = "auto-approve-sensitive")]
    pub auto_approve_sensitive: bool,
}

impl EngineConfig {
    /// Effective auto-approve setting; the env var overrides the file
    pub fn auto_approve(&self) -> bool {
        match std::env::var(AUTO_APPROVE_ENV) {
            Ok(v) => matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"),
            Err(_) => self.auto_approve_sensitive,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps_per_turn: 24,
            max_dialog_depth: 8,
            auto_approve_sensitive: false,
        }
    }
}

/// Checkpoint storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for thread checkpoints; defaults to the user data dir
    #[serde(rename = "threads-dir")]
    pub threads_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the checkpoint directory
    pub fn resolve_threads_dir(&self) -> PathBuf {
        if let Some(dir) = &self.threads_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("concierge")
            .join("threads")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { threads_dir: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.engine.max_steps_per_turn, 24);
        assert_eq!(config.engine.max_dialog_depth, 8);
        assert!(!config.engine.auto_approve_sensitive);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
llm:
  model: gpt-4o-mini
engine:
  max-dialog-depth: 4
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.engine.max_dialog_depth, 4);
        assert_eq!(config.engine.max_steps_per_turn, 24);
    }

    #[test]
    fn test_load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("concierge.yml");
        std::fs::write(&path, "engine:\n  auto-approve-sensitive: true\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert!(config.engine.auto_approve_sensitive);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let path = PathBuf::from("/nonexistent/concierge.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_storage_dir_override() {
        let storage = StorageConfig {
            threads_dir: Some(PathBuf::from("/tmp/threads")),
        };
        assert_eq!(storage.resolve_threads_dir(), PathBuf::from("/tmp/threads"));
    }
}
