//! Configuration for NuBot.
//!
//! Provides the [`NubotConfig`] struct that loads from TOML files,
//! environment variables, and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `NUBOT_CONFIG` environment variable
//! 3. XDG default: `~/.config/nubot/config.toml`
//! 4. Built-in defaults
//!
//! Every option can also be supplied through `NUBOT_`-prefixed
//! environment variables (e.g. `NUBOT_LLM_API_KEY`,
//! `NUBOT_TRACKING_URI`, `NUBOT_INDEX_PATH`).

use confyg::{Confygery, env};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration for the NuBot service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NubotConfig {
    /// Run tracking configuration.
    pub tracking: TrackingConfig,

    /// Generation backend configuration.
    pub llm: LlmConfig,

    /// Similarity index configuration.
    pub index: IndexConfig,

    /// HTTP server configuration.
    pub server: ServerConfig,
}

/// Run-tracking server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Tracking server URI where runs are recorded. Empty disables tracking.
    pub uri: Option<String>,

    /// Experiment name runs are grouped under.
    pub experiment: String,
}

/// Generation backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API credential for the generation backend.
    pub api_key: Option<String>,

    /// Model identifier.
    pub model: String,

    /// Maximum tokens to generate per completion.
    pub max_tokens: u32,

    /// Sampling temperature. None uses the backend default.
    pub temperature: Option<f32>,
}

/// Similarity index configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Local path of the serialized index file.
    pub path: Option<String>,

    /// Remote bucket the serialized index is synced from. The sync itself
    /// happens outside this process; the name is recorded for operators.
    pub bucket: Option<String>,

    /// Embedding provider: "fastembed" or "mock".
    pub provider: String,

    /// Embedding model name.
    pub model: String,

    /// Number of documents returned per search.
    pub top_k: usize,

    /// Cache directory for embedding model files.
    pub cache_path: Option<String>,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,

    /// Port to listen on.
    pub port: u16,
}

// ============================================================================
// Default implementations
// ============================================================================

impl Default for NubotConfig {
    fn default() -> Self {
        Self {
            tracking: TrackingConfig::default(),
            llm: LlmConfig::default(),
            index: IndexConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            uri: None,
            experiment: "rag_experiment".to_string(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "mistral-large-latest".to_string(),
            max_tokens: 1024,
            temperature: None,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: None,
            bucket: None,
            provider: "fastembed".to_string(),
            model: "all-minilm-l6-v2".to_string(),
            top_k: 4,
            cache_path: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl NubotConfig {
    /// Load configuration from file, environment, and defaults.
    ///
    /// Loading priority:
    /// 1. Explicit `config_path` (from `--config` flag)
    /// 2. `NUBOT_CONFIG` env var
    /// 3. XDG default: `~/.config/nubot/config.toml`
    /// 4. Built-in defaults
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path) {
            if path.exists() {
                builder
                    .add_file(&path.to_string_lossy())
                    .map_err(|e| Error::config(format!("config file: {e}")))?;
            }
        }

        let mut env_opts = env::Options::with_top_level("NUBOT");
        env_opts.add_section("tracking");
        env_opts.add_section("llm");
        env_opts.add_section("index");
        env_opts.add_section("server");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        let config: Self = builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))?;

        Ok(config)
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var("NUBOT_CONFIG") {
            return Some(PathBuf::from(path));
        }

        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("nubot").join("config.toml"))
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// The index file path, required for serving queries.
    pub fn index_path(&self) -> Result<PathBuf> {
        self.index
            .path
            .as_deref()
            .map(PathBuf::from)
            .ok_or_else(|| Error::config("index.path is not configured"))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NubotConfig::default();
        assert!(config.tracking.uri.is_none());
        assert_eq!(config.tracking.experiment, "rag_experiment");
        assert_eq!(config.llm.model, "mistral-large-latest");
        assert_eq!(config.llm.max_tokens, 1024);
        assert!(config.llm.temperature.is_none());
        assert_eq!(config.index.provider, "fastembed");
        assert_eq!(config.index.top_k, 4);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
                [tracking]
                uri = "http://mlflow:5000"

                [llm]
                api_key = "sk-test"

                [index]
                path = "/var/lib/nubot/index.json"
                top_k = 8

                [server]
                port = 9090
            "#,
        )
        .unwrap();

        let config = NubotConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.tracking.uri.as_deref(), Some("http://mlflow:5000"));
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.index.path.as_deref(), Some("/var/lib/nubot/index.json"));
        assert_eq!(config.index.top_k, 8);
        assert_eq!(config.server.port, 9090);

        // Unset options keep their defaults
        assert_eq!(config.llm.model, "mistral-large-latest");
        assert_eq!(config.tracking.experiment, "rag_experiment");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = NubotConfig::load(Some("/nonexistent/nubot.toml")).unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_resolve_config_path_explicit_wins() {
        let path = NubotConfig::resolve_config_path(Some("/tmp/explicit.toml"));
        assert_eq!(path, Some(PathBuf::from("/tmp/explicit.toml")));
    }

    #[test]
    fn test_index_path_required() {
        let config = NubotConfig::default();
        assert!(config.index_path().is_err());

        let mut config = NubotConfig::default();
        config.index.path = Some("/data/index.json".to_string());
        assert_eq!(config.index_path().unwrap(), PathBuf::from("/data/index.json"));
    }

    #[test]
    fn test_to_toml_round_trip() {
        let config = NubotConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("[tracking]"));
        assert!(toml_str.contains("[llm]"));

        let parsed: NubotConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.llm.model, config.llm.model);
    }
}
