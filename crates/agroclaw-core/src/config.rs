//! AgroClaw configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgroClawConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub rag: RagConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for AgroClawConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            rag: RagConfig::default(),
            gateway: GatewayConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl AgroClawConfig {
    /// Load config from the default path (~/.agroclaw/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::AgroClawError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| crate::error::AgroClawError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::AgroClawError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the AgroClaw home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".agroclaw")
    }
}

/// Provider (generation + embedding) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the generative-language API.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Generation models in preference order. The first that answers wins.
    #[serde(default = "default_model_priority")]
    pub model_priority: Vec<String>,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Pause between credential rotations when a key is exhausted.
    #[serde(default = "default_rotation_backoff")]
    pub rotation_backoff_ms: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}
fn default_model_priority() -> Vec<String> {
    vec!["gemini-2.5-flash", "gemini-2.5-flash-lite", "gemini-1.5-flash"]
        .into_iter().map(String::from).collect()
}
fn default_embedding_model() -> String { "models/text-embedding-004".into() }
fn default_rotation_backoff() -> u64 { 500 }
fn default_request_timeout() -> u64 { 30 }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model_priority: default_model_priority(),
            embedding_model: default_embedding_model(),
            rotation_backoff_ms: default_rotation_backoff(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Retrieval configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
    /// Minimum cosine score for a document to count as relevant.
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Texts per embedding request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_embedding_dims")]
    pub embedding_dims: usize,
}

fn default_snapshot_path() -> String { "~/.agroclaw/rag_index.bin".into() }
fn default_score_threshold() -> f32 { 0.35 }
fn default_top_k() -> usize { 3 }
fn default_batch_size() -> usize { 20 }
fn default_embedding_dims() -> usize { 768 }

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            score_threshold: default_score_threshold(),
            top_k: default_top_k(),
            batch_size: default_batch_size(),
            embedding_dims: default_embedding_dims(),
        }
    }
}

impl RagConfig {
    /// Snapshot path with `~` expanded.
    pub fn resolved_snapshot_path(&self) -> PathBuf {
        expand_home(&self.snapshot_path)
    }
}

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 { 8000 }
fn default_host() -> String { "127.0.0.1".into() }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Record store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_db_path() -> String { "~/.agroclaw/agroclaw.db".into() }

impl Default for StoreConfig {
    fn default() -> Self {
        Self { db_path: default_db_path() }
    }
}

impl StoreConfig {
    /// Database path with `~` expanded.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_home(&self.db_path)
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AgroClawConfig::default();
        assert_eq!(config.llm.model_priority[0], "gemini-2.5-flash");
        assert_eq!(config.llm.embedding_model, "models/text-embedding-004");
        assert!((config.rag.score_threshold - 0.35).abs() < 1e-6);
        assert_eq!(config.rag.top_k, 3);
        assert_eq!(config.gateway.port, 8000);
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            [llm]
            model_priority = ["gemini-2.5-pro"]
            rotation_backoff_ms = 250

            [rag]
            top_k = 5
        "#;

        let config: AgroClawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.llm.model_priority, vec!["gemini-2.5-pro"]);
        assert_eq!(config.llm.rotation_backoff_ms, 250);
        assert_eq!(config.rag.top_k, 5);
        // Untouched sections keep their defaults.
        assert!((config.rag.score_threshold - 0.35).abs() < 1e-6);
        assert_eq!(config.gateway.host, "127.0.0.1");
    }

    #[test]
    fn test_config_missing_fields_use_defaults() {
        let toml_str = "";
        let config: AgroClawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.llm.model_priority.len(), 3);
        assert_eq!(config.rag.batch_size, 20);
    }

    #[test]
    fn test_expand_home() {
        let p = expand_home("~/x/y.bin");
        assert!(!p.to_string_lossy().starts_with('~'));
        assert!(p.to_string_lossy().ends_with("x/y.bin"));
    }

    #[test]
    fn test_home_dir() {
        let home = AgroClawConfig::home_dir();
        assert!(home.to_string_lossy().contains("agroclaw"));
    }
}
