//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.chatwire/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::state::DEFAULT_HISTORY_RETRIES;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ChatwireConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct HistoryConfig {
    pub retries: Option<u32>,
    pub retry_base_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    /// "file" or "memory"
    pub backend: Option<String>,
    pub path: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";
pub const DEFAULT_RETRY_BASE_MS: u64 = 500;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    File,
    Memory,
}

impl StorageBackend {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "file" => Some(StorageBackend::File),
            "memory" => Some(StorageBackend::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub server_url: String,
    pub history_retries: u32,
    pub retry_base_ms: u64,
    pub storage_backend: StorageBackend,
    pub storage_path: Option<PathBuf>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.chatwire/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".chatwire").join("config.toml"))
}

/// Load config from `~/.chatwire/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `ChatwireConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<ChatwireConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(ChatwireConfig::default());
        }
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<ChatwireConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(ChatwireConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ChatwireConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

fn generate_default_config(path: &Path) {
    let default_content = r#"# Chatwire Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [server]
# url = "http://localhost:3000"       # Or set CHATWIRE_SERVER_URL

# [history]
# retries = 3                         # Extra attempts after a failed load
# retry_base_ms = 500                 # Backoff doubles on each attempt

# [storage]
# backend = "file"                    # "file" or "memory"
# path = "/home/me/.chatwire/storage.json"  # Or set CHATWIRE_STORAGE_PATH
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// CLI flag values (None = not specified).
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub server_url: Option<String>,
    pub storage_backend: Option<StorageBackend>,
}

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &ChatwireConfig, cli: &CliOverrides) -> ResolvedConfig {
    // Server URL: CLI → env → config → default
    let server_url = cli
        .server_url
        .clone()
        .or_else(|| std::env::var("CHATWIRE_SERVER_URL").ok())
        .or_else(|| config.server.url.clone())
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
    let server_url = server_url.trim_end_matches('/').to_string();

    // Storage backend: CLI → config → file
    let storage_backend = cli.storage_backend.unwrap_or_else(|| {
        match config.storage.backend.as_deref() {
            Some(name) => StorageBackend::parse(name).unwrap_or_else(|| {
                warn!("Unknown storage backend '{}', using file", name);
                StorageBackend::File
            }),
            None => StorageBackend::File,
        }
    });

    // Storage path: env → config → ~/.chatwire/storage.json
    let storage_path = std::env::var("CHATWIRE_STORAGE_PATH")
        .ok()
        .or_else(|| config.storage.path.clone())
        .map(PathBuf::from)
        .or_else(crate::core::storage::default_storage_path);

    ResolvedConfig {
        server_url,
        history_retries: config.history.retries.unwrap_or(DEFAULT_HISTORY_RETRIES),
        retry_base_ms: config.history.retry_base_ms.unwrap_or(DEFAULT_RETRY_BASE_MS),
        storage_backend,
        storage_path,
    }
}
