//! Unified path management for lumen files.
//!
//! All lumen configuration and identity data live under the platform's
//! standard config/data directories.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/lumen/             # Config directory
//! └── config.toml              # Client configuration
//!
//! ~/.local/share/lumen/        # Data directory
//! └── identity.toml            # Durable user identity slot
//! ```

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for lumen.
///
/// All paths are resolved via the platform conventions of the `dirs` crate
/// (XDG on Linux, the matching locations on macOS and Windows).
pub struct LumenPaths;

impl LumenPaths {
    /// Returns the lumen configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g., `~/.config/lumen/`)
    /// - `Err(PathError::HomeDirNotFound)`: Could not determine directory
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("lumen"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the lumen data directory.
    ///
    /// This holds durable state that outlives a single run (the identity
    /// slot).
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to data directory (e.g., `~/.local/share/lumen/`)
    /// - `Err(PathError::HomeDirNotFound)`: Could not determine directory
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join("lumen"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the durable identity file.
    pub fn identity_file() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("identity.toml"))
    }
}
