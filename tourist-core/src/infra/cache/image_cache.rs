use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::error::{AlbumError, Result};

/// Longest basename kept verbatim as a cache key.
pub const MAX_KEY_LEN: usize = 128;

/// Directory of downloaded album photos, one file per cache key.
///
/// Keys never start with `.`, so in-progress writes use hidden temp names
/// that cannot collide with a real entry.
#[derive(Clone, Debug)]
pub struct ImageCache {
    root: PathBuf,
}

impl ImageCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Derive the key a photo is stored under from its remote URL.
    ///
    /// The last path segment is kept with every byte outside
    /// `[A-Za-z0-9._-]` replaced by `_`. Basenames that cannot be used as
    /// file names fall back to the SHA-256 hex digest of the whole URL.
    pub fn cache_key_for(url: &Url) -> String {
        let basename = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default();

        let sanitized: String = basename
            .bytes()
            .map(|b| {
                if b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-')
                {
                    b as char
                } else {
                    '_'
                }
            })
            .collect();

        if Self::is_valid_key(&sanitized) {
            sanitized
        } else {
            hex::encode(Sha256::digest(url.as_str().as_bytes()))
        }
    }

    pub fn is_valid_key(key: &str) -> bool {
        !key.is_empty()
            && key.len() <= MAX_KEY_LEN
            && !key.starts_with('.')
            && key.bytes().all(|b| {
                b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-')
            })
    }

    pub fn path_for_key(&self, key: &str) -> Result<PathBuf> {
        if !Self::is_valid_key(key) {
            return Err(AlbumError::InvalidInput(format!(
                "invalid image cache key: {key:?}"
            )));
        }
        Ok(self.root.join(key))
    }

    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|err| {
            AlbumError::Storage(format!(
                "failed to create image cache dir {:?}: {err}",
                self.root
            ))
        })
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.path_for_key(key)?;
        tokio::fs::try_exists(&path).await.map_err(|err| {
            AlbumError::Storage(format!("failed to stat image {:?}: {err}", path))
        })
    }

    /// Atomically replace the entry for `key` (temp file + rename).
    pub async fn save(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for_key(key)?;
        self.ensure_root().await?;

        let tmp = self
            .root
            .join(format!(".{key}.tmp-{}", Uuid::new_v4().simple()));

        if let Err(err) = write_file(&tmp, bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(err);
        }

        if let Err(err) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(AlbumError::Storage(format!(
                "failed to move image {:?} -> {:?}: {err}",
                tmp, path
            )));
        }

        debug!(key = %key, bytes = bytes.len(), "image cached");
        Ok(())
    }

    pub async fn load(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for_key(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(AlbumError::NotFound(format!("cached image {key}")))
            }
            Err(err) => Err(AlbumError::Storage(format!(
                "failed to read image {:?}: {err}",
                path
            ))),
        }
    }

    /// Remove the entry for `key`; absent entries are not an error.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for_key(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key = %key, "cached image removed");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AlbumError::Storage(format!(
                "failed to remove image {:?}: {err}",
                path
            ))),
        }
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = tokio::fs::File::create(path).await.map_err(|err| {
        AlbumError::Storage(format!(
            "failed to create temp image {:?}: {err}",
            path
        ))
    })?;
    file.write_all(bytes).await.map_err(|err| {
        AlbumError::Storage(format!(
            "failed to write temp image {:?}: {err}",
            path
        ))
    })?;
    file.sync_all().await.map_err(|err| {
        AlbumError::Storage(format!(
            "failed to flush temp image {:?}: {err}",
            path
        ))
    })
}
