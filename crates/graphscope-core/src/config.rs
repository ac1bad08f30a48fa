//! Configuration schema (graphscope.toml)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::store::DEFAULT_SEARCH_LIMIT;

/// Store backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-memory store, loaded from `data` or generated from `[seed]`
    Memory,

    /// Persistent SQLite store at `path`
    Sqlite,
}

impl Default for BackendKind {
    fn default() -> Self {
        Self::Sqlite
    }
}

/// Store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: BackendKind,

    /// SQLite database file
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// JSON graph loaded into the memory backend
    #[serde(default)]
    pub data: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            path: default_store_path(),
            data: None,
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("graph.db")
}

/// Safety limits applied to every extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum nodes in one result before the traversal stops
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,

    /// Maximum links in one result before the traversal stops
    #[serde(default = "default_max_links")]
    pub max_links: usize,

    /// Per-extraction deadline in milliseconds (0 = unbounded)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_nodes: default_max_nodes(),
            max_links: default_max_links(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_max_nodes() -> usize {
    10_000
}

fn default_max_links() -> usize {
    50_000
}

fn default_timeout_ms() -> u64 {
    5_000
}

/// Node search settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum matches returned per search
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: default_search_limit(),
        }
    }
}

fn default_search_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

/// Synthetic graph settings used by `graphscope seed`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedConfig {
    #[serde(default = "default_seed_nodes")]
    pub nodes: usize,

    /// Upper bound of candidate links drawn per node
    #[serde(default = "default_max_links_per_node")]
    pub max_links_per_node: usize,

    /// RNG seed for reproducible graphs (none = entropy)
    #[serde(default)]
    pub seed: Option<u64>,

    /// Prefix prepended to generated node numbers
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            nodes: default_seed_nodes(),
            max_links_per_node: default_max_links_per_node(),
            seed: None,
            id_prefix: default_id_prefix(),
        }
    }
}

fn default_seed_nodes() -> usize {
    1000
}

fn default_max_links_per_node() -> usize {
    10
}

fn default_id_prefix() -> String {
    "node_".to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub seed: SeedConfig,
}

impl Config {
    /// Load config from TOML file
    ///
    /// Relative store paths are resolved against the config file's directory.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config = Self::from_toml(&contents)?;

        if let Some(parent) = path.parent() {
            config.resolve_paths(parent);
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    fn resolve_paths(&mut self, root: &std::path::Path) {
        if self.store.path.is_relative() {
            self.store.path = root.join(&self.store.path);
        }

        if let Some(data) = self.store.data.as_mut() {
            if data.is_relative() {
                *data = root.join(&*data);
            }
        }
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
