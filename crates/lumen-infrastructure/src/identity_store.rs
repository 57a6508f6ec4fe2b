//! File-backed identity store implementation.
//!
//! The durable user slot is a TOML file under the data directory; the
//! session slot lives in memory for the lifetime of the store instance
//! (process lifetime = session lifetime for a native client), so a fresh
//! instance starts a fresh session.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use lumen_core::error::{LumenError, Result};
use lumen_core::identity::IdentityStore;

/// On-disk shape of the durable identity slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IdentityFile {
    user_id: String,
}

/// Identity store backed by a file for the durable slot.
///
/// Both slots are cached in memory after first resolution, so repeated reads
/// never touch the file system. The user id is written exactly once: when the
/// file is absent or empty. An existing value is returned unchanged, never
/// overwritten.
pub struct FileIdentityStore {
    /// Path of the durable identity file.
    identity_file: PathBuf,
    /// Cached durable user id.
    user_id: Mutex<Option<String>>,
    /// Session id, generated once per store instance.
    session_id: Mutex<Option<String>>,
}

impl FileIdentityStore {
    /// Creates a store persisting the durable slot at the given file path.
    pub fn new(identity_file: PathBuf) -> Self {
        Self {
            identity_file,
            user_id: Mutex::new(None),
            session_id: Mutex::new(None),
        }
    }

    /// Creates a store using the standard platform data directory.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if the platform data directory cannot be
    /// determined. This is a fatal startup condition for the client.
    pub fn new_default() -> Result<Self> {
        let identity_file = crate::paths::LumenPaths::identity_file()
            .map_err(|e| LumenError::config(e.to_string()))?;
        Ok(Self::new(identity_file))
    }

    /// Reads the durable slot from disk, if present.
    async fn read_slot(&self) -> Result<Option<String>> {
        match tokio::fs::read_to_string(&self.identity_file).await {
            Ok(contents) => {
                let file: IdentityFile = toml::from_str(&contents)?;
                if file.user_id.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(file.user_id))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Persists a freshly generated user id to the durable slot.
    async fn write_slot(&self, user_id: &str) -> Result<()> {
        if let Some(parent) = self.identity_file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = toml::to_string_pretty(&IdentityFile {
            user_id: user_id.to_string(),
        })?;
        tokio::fs::write(&self.identity_file, contents).await?;
        Ok(())
    }
}

#[async_trait]
impl IdentityStore for FileIdentityStore {
    async fn get_or_create_user_id(&self) -> Result<String> {
        let mut cached = self.user_id.lock().await;
        if let Some(id) = cached.as_ref() {
            return Ok(id.clone());
        }

        let user_id = match self.read_slot().await? {
            Some(existing) => existing,
            None => {
                let fresh = uuid::Uuid::new_v4().to_string();
                self.write_slot(&fresh).await?;
                tracing::info!("created durable user id");
                fresh
            }
        };

        *cached = Some(user_id.clone());
        Ok(user_id)
    }

    async fn get_or_create_session_id(&self) -> Result<String> {
        let mut cached = self.session_id.lock().await;
        if let Some(id) = cached.as_ref() {
            return Ok(id.clone());
        }

        let session_id = uuid::Uuid::new_v4().to_string();
        *cached = Some(session_id.clone());
        Ok(session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::identity::IdentityStore;

    fn store_in(dir: &tempfile::TempDir) -> FileIdentityStore {
        FileIdentityStore::new(dir.path().join("identity.toml"))
    }

    #[tokio::test]
    async fn test_user_id_is_stable_within_a_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let first = store.get_or_create_user_id().await.unwrap();
        let second = store.get_or_create_user_id().await.unwrap();
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_user_id_survives_across_instances() {
        let dir = tempfile::tempdir().unwrap();

        let first = store_in(&dir).get_or_create_user_id().await.unwrap();
        let second = store_in(&dir).get_or_create_user_id().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_cleared_scope_yields_new_user_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.toml");

        let first = store_in(&dir).get_or_create_user_id().await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();
        let second = store_in(&dir).get_or_create_user_id().await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_session_id_is_per_instance() {
        let dir = tempfile::tempdir().unwrap();

        let store = store_in(&dir);
        let a = store.get_or_create_session_id().await.unwrap();
        let b = store.get_or_create_session_id().await.unwrap();
        assert_eq!(a, b);

        let other = store_in(&dir);
        let c = other.get_or_create_session_id().await.unwrap();
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_identity_pair_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let identity = store.identity().await.unwrap();
        assert!(!identity.user_id.is_empty());
        assert!(!identity.session_id.is_empty());
        assert_ne!(identity.user_id, identity.session_id);
    }
}
