//! Configuration service implementation.
//!
//! This module provides a ConfigService that loads the client configuration
//! from the configuration file (~/.config/lumen/config.toml), creating it
//! with defaults when missing, and applies the environment override for the
//! backend address.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use lumen_core::config::ClientConfig;
use lumen_core::error::{LumenError, Result};

use crate::paths::LumenPaths;

/// Environment variable overriding the configured backend address.
pub const ENV_API_BASE_URL: &str = "LUMEN_API_BASE_URL";

/// Configuration service that loads and caches the client configuration.
///
/// The configuration is read once on first access and cached; the base
/// endpoint address is fixed for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct ConfigService {
    /// Explicit config file path, standard location when `None`.
    config_path: Option<PathBuf>,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<ClientConfig>>>,
}

impl ConfigService {
    /// Creates a new ConfigService using the standard config location.
    ///
    /// The configuration is loaded lazily on first access.
    pub fn new() -> Self {
        Self {
            config_path: None,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Creates a ConfigService reading from an explicit file path.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            config_path: Some(path),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the client configuration, loading from file if not cached.
    ///
    /// Load failures are logged and fall back to defaults; a broken config
    /// file never prevents startup.
    pub fn get_config(&self) -> ClientConfig {
        {
            let read_lock = self.config.read().unwrap_or_else(|e| e.into_inner());
            if let Some(ref cached) = *read_lock {
                return cached.clone();
            }
        }

        let loaded = self.load_config().unwrap_or_else(|e| {
            tracing::warn!("failed to load config, using defaults: {}", e);
            ClientConfig::default()
        });

        {
            let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
            *write_lock = Some(loaded.clone());
        }

        loaded
    }

    /// Returns the backend base address, honoring the environment override.
    pub fn api_base_url(&self) -> String {
        if let Ok(url) = std::env::var(ENV_API_BASE_URL)
            && !url.is_empty()
        {
            return url;
        }
        self.get_config().api_base_url
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = None;
    }

    /// Loads the configuration file, creating it with defaults when missing.
    fn load_config(&self) -> Result<ClientConfig> {
        let config_path = self.config_path()?;

        if !config_path.exists() {
            let default_config = ClientConfig::default();
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&config_path, toml::to_string_pretty(&default_config)?)?;
            return Ok(default_config);
        }

        let contents = std::fs::read_to_string(&config_path)?;
        Ok(toml::from_str(&contents)?)
    }

    fn config_path(&self) -> Result<PathBuf> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => LumenPaths::config_file().map_err(|e| LumenError::config(e.to_string())),
        }
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let service = ConfigService::with_path(path.clone());

        let config = service.get_config();
        assert_eq!(config, ClientConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_existing_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_base_url = \"https://insight.example.com\"\n").unwrap();

        let service = ConfigService::with_path(path);
        assert_eq!(
            service.get_config().api_base_url,
            "https://insight.example.com"
        );
    }

    #[test]
    fn test_cache_and_invalidation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_base_url = \"https://one.example.com\"\n").unwrap();

        let service = ConfigService::with_path(path.clone());
        assert_eq!(service.get_config().api_base_url, "https://one.example.com");

        std::fs::write(&path, "api_base_url = \"https://two.example.com\"\n").unwrap();
        // Still cached
        assert_eq!(service.get_config().api_base_url, "https://one.example.com");

        service.invalidate_cache();
        assert_eq!(service.get_config().api_base_url, "https://two.example.com");
    }
}
