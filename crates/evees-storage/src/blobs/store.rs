//! Blob store implementation
//!
//! Objects are postcard-encoded payloads. The address is never stored; it is
//! recomputed on load and compared with the requested one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use evees_core::{ContentAddress, ContentStore, Data, DataPayload, StoreError};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, instrument, warn};

/// Configuration for the blob store
#[derive(Debug, Clone)]
pub struct BlobStoreConfig {
    /// Base directory for blob storage
    pub base_dir: PathBuf,
    /// Number of subdirectory levels (for sharding)
    pub shard_depth: u8,
    /// fsync each object before it becomes visible
    pub sync_writes: bool,
}

impl Default for BlobStoreConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("./data/objects"),
            shard_depth: 2, // e.g., ab/cd/abcdef...
            sync_writes: true,
        }
    }
}

impl BlobStoreConfig {
    /// Create a configuration rooted at `base_dir`
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Default::default()
        }
    }
}

/// File-backed content-addressed store
#[derive(Debug)]
pub struct BlobContentStore {
    config: BlobStoreConfig,
    /// Suffix source for per-write temp files
    next_temp: AtomicU64,
}

impl BlobContentStore {
    /// Open (or create) a blob store
    pub async fn new(config: BlobStoreConfig) -> Result<Self, StoreError> {
        fs::create_dir_all(&config.base_dir).await?;

        info!(path = %config.base_dir.display(), "Blob store initialized");

        Ok(Self {
            config,
            next_temp: AtomicU64::new(0),
        })
    }

    /// Store a payload and return its address
    #[instrument(skip(self, payload))]
    pub async fn put(&self, payload: DataPayload) -> Result<ContentAddress, StoreError> {
        let address = payload.address();

        let Some(path) = self.object_path(&address) else {
            return Err(StoreError::Io(format!("unaddressable object {address}")));
        };

        if fs::try_exists(&path).await? {
            debug!(address = %address.short(), "Object already exists");
            return Ok(address);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let bytes = postcard::to_allocvec(&payload)?;

        // Write atomically (write to a temp file private to this call, then rename)
        let temp_path = self.temp_path(&path);
        let written = self.write_temp(&temp_path, &bytes).await;
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }
        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            if fs::try_exists(&path).await? {
                debug!(address = %address.short(), "Object stored by a concurrent writer");
                return Ok(address);
            }
            return Err(e.into());
        }

        debug!(address = %address.short(), size = bytes.len(), "Stored object");
        Ok(address)
    }

    async fn write_temp(&self, temp_path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        let mut file = File::create(temp_path).await?;
        file.write_all(bytes).await?;
        if self.config.sync_writes {
            file.sync_all().await?;
        }
        Ok(())
    }

    fn temp_path(&self, path: &Path) -> PathBuf {
        let n = self.next_temp.fetch_add(1, Ordering::Relaxed);
        path.with_extension(format!("{}.{n}.tmp", std::process::id()))
    }

    /// Delete an object, returning whether it existed
    #[instrument(skip_all, fields(address = %address.short()))]
    pub async fn delete(&self, address: &ContentAddress) -> Result<bool, StoreError> {
        let Some(path) = self.object_path(address) else {
            return Ok(false);
        };

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted object");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// List all stored addresses (for debugging/maintenance)
    pub async fn list_all(&self) -> Result<Vec<ContentAddress>, StoreError> {
        let mut addresses = Vec::new();
        self.collect_objects(&self.config.base_dir, &mut addresses)
            .await?;
        addresses.sort();
        Ok(addresses)
    }

    /// Get the file path for an address
    ///
    /// Returns `None` for tokens that cannot name a stored object, so
    /// arbitrary input never escapes the base directory.
    fn object_path(&self, address: &ContentAddress) -> Option<PathBuf> {
        let token = address.as_str();
        if token.len() != 64 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        let mut path = self.config.base_dir.clone();
        for i in 0..(self.config.shard_depth as usize).min(token.len() / 2) {
            let start = i * 2;
            path.push(&token[start..start + 2]);
        }
        path.push(token);
        Some(path)
    }

    /// Recursively collect object addresses
    fn collect_objects<'a>(
        &'a self,
        dir: &'a Path,
        addresses: &'a mut Vec<ContentAddress>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), StoreError>> + Send + 'a>>
    {
        Box::pin(async move {
            let mut entries = fs::read_dir(dir).await?;

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();

                if path.is_dir() {
                    self.collect_objects(&path, addresses).await?;
                } else if let Some(name) = path.file_name().and_then(|n| n.to_str())
                    && name.len() == 64
                    && name.bytes().all(|b| b.is_ascii_hexdigit())
                {
                    addresses.push(ContentAddress::new(name));
                }
            }

            Ok(())
        })
    }
}

#[async_trait]
impl ContentStore for BlobContentStore {
    #[instrument(skip_all, fields(address = %address.short()))]
    async fn get(&self, address: &ContentAddress) -> Result<Data, StoreError> {
        let path = self
            .object_path(address)
            .ok_or_else(|| StoreError::not_found(address.as_str()))?;

        let mut file = File::open(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StoreError::not_found(address.as_str())
            } else {
                StoreError::from(e)
            }
        })?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).await?;

        let payload: DataPayload = postcard::from_bytes(&bytes)?;
        let data = Data::new(payload);
        if &data.id != address {
            warn!(
                expected = %address,
                actual = %data.id,
                "Object hash mismatch"
            );
            return Err(StoreError::Integrity {
                expected: address.to_string(),
                actual: data.id.to_string(),
            });
        }

        Ok(data)
    }

    async fn contains(&self, address: &ContentAddress) -> Result<bool, StoreError> {
        match self.object_path(address) {
            Some(path) => Ok(fs::try_exists(&path).await?),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_store() -> (BlobContentStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = BlobStoreConfig {
            base_dir: temp_dir.path().join("objects"),
            sync_writes: false,
            ..Default::default()
        };
        let store = BlobContentStore::new(config).await.unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let (store, _temp) = create_test_store().await;

        let leaf = store.put(DataPayload::text("a paragraph 1")).await.unwrap();
        let node = store
            .put(DataPayload::text_node("a title", vec![leaf.clone()]))
            .await
            .unwrap();

        let data = store.get(&node).await.unwrap();
        assert_eq!(data.id, node);
        assert_eq!(data.text(), "a title");
        assert_eq!(
            data.payload,
            DataPayload::text_node("a title", vec![leaf])
        );
    }

    #[tokio::test]
    async fn test_content_addressing() {
        let (store, _temp) = create_test_store().await;

        let a = store.put(DataPayload::text("duplicate")).await.unwrap();
        let b = store.put(DataPayload::text("duplicate")).await.unwrap();
        assert_eq!(a, b);

        // Only one file should exist
        let all = store.list_all().await.unwrap();
        assert_eq!(all, vec![a]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_puts_of_same_payload() {
        let (store, _temp) = create_test_store().await;
        let store = std::sync::Arc::new(store);

        for round in 0..20 {
            let payload = DataPayload::text(format!("shared {round}"));
            let expected = payload.address();

            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let store = store.clone();
                    let payload = payload.clone();
                    tokio::spawn(async move { store.put(payload).await })
                })
                .collect();

            for handle in handles {
                assert_eq!(handle.await.unwrap().unwrap(), expected);
            }
            assert_eq!(store.get(&expected).await.unwrap().text(), format!("shared {round}"));
        }

        // No temp files left behind, one object per round
        assert_eq!(store.list_all().await.unwrap().len(), 20);
        let mut stack = vec![store.config.base_dir.clone()];
        while let Some(dir) = stack.pop() {
            let mut entries = fs::read_dir(&dir).await.unwrap();
            while let Some(entry) = entries.next_entry().await.unwrap() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else {
                    assert_ne!(path.extension().and_then(|e| e.to_str()), Some("tmp"));
                }
            }
        }
    }

    #[tokio::test]
    async fn test_missing_and_malformed_addresses() {
        let (store, _temp) = create_test_store().await;

        let absent = DataPayload::text("never stored").address();
        assert!(store.get(&absent).await.unwrap_err().is_not_found());
        assert!(!store.contains(&absent).await.unwrap());

        let hostile = ContentAddress::new("../../etc/passwd");
        assert!(store.get(&hostile).await.unwrap_err().is_not_found());
        assert!(!store.contains(&hostile).await.unwrap());
        assert!(!store.delete(&hostile).await.unwrap());
    }

    #[tokio::test]
    async fn test_exists_and_delete() {
        let (store, _temp) = create_test_store().await;

        let address = store.put(DataPayload::text("delete me")).await.unwrap();
        assert!(store.contains(&address).await.unwrap());

        assert!(store.delete(&address).await.unwrap());
        assert!(!store.contains(&address).await.unwrap());

        // Delete again should return false
        assert!(!store.delete(&address).await.unwrap());
    }

    #[tokio::test]
    async fn test_hash_verification() {
        let (store, temp) = create_test_store().await;

        let address = store.put(DataPayload::text("original")).await.unwrap();

        // Overwrite the file with a different, well-formed payload
        let token = address.as_str();
        let path = temp
            .path()
            .join("objects")
            .join(&token[0..2])
            .join(&token[2..4])
            .join(token);
        let forged = postcard::to_allocvec(&DataPayload::text("forged")).unwrap();
        fs::write(&path, forged).await.unwrap();

        let err = store.get(&address).await.unwrap_err();
        assert!(matches!(err, StoreError::Integrity { .. }));
    }
}
