//! Directory-backed cache store
//!
//! Each key is written to its own file, named after the SHA-256 of the key,
//! holding a JSON-encoded [`CacheEntry`] with the expiry time inside. Expired
//! or unreadable files are removed when they are next looked up.

use crate::cache::{entry::CacheEntry, provider::CacheStore, types::CacheValue};
use crate::error::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

const ENTRY_EXTENSION: &str = "cache";
const STAGING_EXTENSION: &str = "tmp";

/// [`CacheStore`] persisting entries as files in a directory
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    directory: PathBuf,
}

impl FileCacheStore {
    /// Open a store in `directory`, creating it if needed
    pub async fn new(directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory).await?;

        info!("Opened file cache store at {}", directory.display());
        Ok(Self { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let name = hex::encode(Sha256::digest(key.as_bytes()));
        self.directory.join(format!("{}.{}", name, ENTRY_EXTENSION))
    }

    async fn read_entry(&self, key: &str) -> Result<Option<CacheEntry>> {
        let path = self.entry_path(key);

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Removing unreadable cache file {}: {}", path.display(), e);
                remove_if_present(&path).await?;
                return Ok(None);
            }
        };

        if entry.key != key || entry.is_expired() {
            debug!("Dropping stale cache file for {}", key);
            remove_if_present(&path).await?;
            return Ok(None);
        }

        Ok(Some(entry))
    }
}

async fn remove_if_present(path: &Path) -> Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl CacheStore for FileCacheStore {
    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.read_entry(key).await?.is_some())
    }

    async fn fetch(&self, key: &str) -> Result<Option<CacheValue>> {
        Ok(self.read_entry(key).await?.map(|entry| entry.value))
    }

    async fn save(&self, key: &str, value: CacheValue, ttl_secs: u64) -> Result<bool> {
        let ttl = (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs));
        let entry = CacheEntry::new(key, value, ttl);
        let encoded = serde_json::to_vec(&entry)?;

        // Write then rename so readers never see a partial file; each writer
        // stages under its own name
        let path = self.entry_path(key);
        let staging = path.with_extension(format!(
            "{}.{}",
            Uuid::new_v4().simple(),
            STAGING_EXTENSION
        ));
        fs::write(&staging, encoded).await?;
        if let Err(e) = fs::rename(&staging, &path).await {
            remove_if_present(&staging).await?;
            return Err(e.into());
        }

        debug!("Stored cache entry {} at {}", key, path.display());
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        remove_if_present(&self.entry_path(key)).await
    }

    async fn delete_all(&self) -> Result<bool> {
        let mut removed = 0usize;
        let mut dir = fs::read_dir(&self.directory).await?;

        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            let extension = path.extension().and_then(|ext| ext.to_str());
            if matches!(extension, Some(ENTRY_EXTENSION | STAGING_EXTENSION))
                && remove_if_present(&path).await?
            {
                removed += 1;
            }
        }

        info!(
            "Cleared {} entries from file cache store at {}",
            removed,
            self.directory.display()
        );
        Ok(true)
    }

    fn provider_name(&self) -> &str {
        "file"
    }
}
