use crate::keys::object_key;
use crate::traits::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;
use visioncloud_core::{Category, StorageBackend};

const PARTIAL_SUFFIX: &str = ".partial";

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for object storage (e.g., "/var/lib/visioncloud")
    /// * `base_url` - Locator prefix for stored objects (e.g., "http://localhost:8080/images")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    /// Create a LocalStorage whose locators are `file://` URLs of the stored objects.
    pub async fn with_file_urls(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).await?;
        let canonical = base_path.canonicalize()?;
        let base_url = format!("file://{}", canonical.display());
        Self::new(canonical, base_url).await
    }

    /// Convert an object address to a filesystem path with security validation
    ///
    /// The key is validated first; the resolved path must then stay inside
    /// the base storage directory.
    fn key_to_path(&self, category: Category, key: &str) -> StorageResult<PathBuf> {
        let storage_key = object_key(category, key)?;
        let path = self.base_path.join(&storage_key);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    fn category_dir(&self, category: Category) -> PathBuf {
        self.base_path.join(category.as_str())
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write to a sibling temp file, fsync, then rename into place so readers
    /// never observe a half-written object.
    async fn write_atomically(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StorageError::InvalidKey(path.display().to_string()))?;
        let partial =
            path.with_file_name(format!(".{}.{}{}", file_name, Uuid::new_v4(), PARTIAL_SUFFIX));

        let result = async {
            let mut file = fs::File::create(&partial).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to create file {}: {}",
                    partial.display(),
                    e
                ))
            })?;

            file.write_all(data).await.map_err(|e| {
                StorageError::UploadFailed(format!("Failed to write file {}: {}", partial.display(), e))
            })?;

            file.sync_all().await.map_err(|e| {
                StorageError::UploadFailed(format!("Failed to sync file {}: {}", partial.display(), e))
            })?;

            fs::rename(&partial, path).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to move {} into place: {}",
                    path.display(),
                    e
                ))
            })
        }
        .await;

        if result.is_err() {
            let _ = fs::remove_file(&partial).await;
        }
        result
    }

    fn is_partial(name: &str) -> bool {
        name.starts_with('.') && name.ends_with(PARTIAL_SUFFIX)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put(&self, category: Category, key: &str, data: Bytes) -> StorageResult<String> {
        let path = self.key_to_path(category, key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        self.write_atomically(&path, &data).await.map_err(|e| {
            tracing::error!(
                error = %e,
                path = %path.display(),
                category = %category,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Local storage put failed"
            );
            e
        })?;

        let url = self.locator(category, key);

        tracing::info!(
            path = %path.display(),
            category = %category,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage put successful"
        );

        Ok(url)
    }

    async fn get(&self, category: Category, key: &str) -> StorageResult<Bytes> {
        let path = self.key_to_path(category, key)?;
        let start = std::time::Instant::now();

        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(format!("{}/{}", category, key)));
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    path = %path.display(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local storage get failed"
                );
                return Err(StorageError::IoError(e));
            }
        };

        tracing::info!(
            path = %path.display(),
            category = %category,
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage get successful"
        );

        Ok(Bytes::from(data))
    }

    async fn list(&self, category: Category) -> StorageResult<Vec<String>> {
        let root = self.category_dir(category);
        let start = std::time::Instant::now();

        if !fs::try_exists(&root).await? {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        let mut pending = vec![root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await.map_err(|e| {
                StorageError::ListFailed(format!("Failed to read {}: {}", dir.display(), e))
            })?;

            while let Some(entry) = entries.next_entry().await.map_err(|e| {
                StorageError::ListFailed(format!("Failed to read {}: {}", dir.display(), e))
            })? {
                let path = entry.path();
                let file_type = entry.file_type().await?;

                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }

                let name = entry.file_name();
                if Self::is_partial(&name.to_string_lossy()) {
                    continue;
                }

                if let Ok(relative) = path.strip_prefix(&root) {
                    let key = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/");
                    keys.push(key);
                }
            }
        }

        keys.sort();

        tracing::info!(
            category = %category,
            count = keys.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage list successful"
        );

        Ok(keys)
    }

    async fn delete(&self, category: Category, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(category, key)?;
        let start = std::time::Instant::now();

        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    path = %path.display(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local storage delete failed"
                );
                return Err(StorageError::IoError(e));
            }
        }

        tracing::info!(
            path = %path.display(),
            category = %category,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    fn locator(&self, category: Category, key: &str) -> String {
        format!("{}/{}/{}", self.base_url.trim_end_matches('/'), category, key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
