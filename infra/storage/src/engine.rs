//! The [`Storage`] handle: sandboxed, atomic, optionally compressed file I/O.

use crate::builder::StorageBuilder;
use crate::error::{StorageError, StorageErrorExt};
use crate::maintenance::{self, TMP_MARKER};
use crate::namespace::{NamespaceName, NamespacedStorage};
use crate::security;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum Compression {
    #[default]
    None,
    Lz4,
}

impl Compression {
    #[must_use]
    pub const fn from_enabled(enabled: bool) -> Self {
        if enabled { Self::Lz4 } else { Self::None }
    }

    fn compress(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::None => data.to_vec(),
            Self::Lz4 => lz4_flex::compress_prepend_size(data),
        }
    }

    fn decompress(self, data: Vec<u8>) -> Result<Vec<u8>, StorageError> {
        match self {
            Self::None => Ok(data),
            Self::Lz4 => lz4_flex::decompress_size_prepended(&data).context("LZ4 stream invalid"),
        }
    }
}

#[derive(Debug)]
pub struct StorageInner {
    /// Canonical physical root; every resolved path must stay under it.
    pub(crate) root: PathBuf,
    pub(crate) compression: Compression,
    pub(crate) stale_tmp_after: Duration,
    pub(crate) tmp_counter: AtomicU64,
}

/// Handle to the storage sandbox. Cheap to clone.
///
/// Writes go to a unique temp file that is fsynced and renamed over the target, so readers
/// observe either the previous or the new content, never a torn file. On Unix, files are
/// created with mode `0600`.
///
/// ```rust
/// use ksafe_storage::{Compression, Storage, StorageError};
///
/// #[tokio::main]
/// async fn main() -> Result<(), StorageError> {
///     # let tmp = tempfile::tempdir().unwrap();
///     let storage = Storage::builder().root(tmp.path()).compression(Compression::Lz4).connect().await?;
///
///     let account = storage.namespace("user_42")?;
///     account.write("vault.bin", b"sealed bytes").await?;
///     assert_eq!(account.read("vault.bin").await?, b"sealed bytes");
///     assert_eq!(account.read_optional("missing.bin").await?, None);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Storage {
    pub(crate) inner: Arc<StorageInner>,
}

impl Deref for Storage {
    type Target = StorageInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Storage {
    #[must_use = "The storage engine is not initialized until you call .connect()"]
    pub fn builder() -> StorageBuilder {
        StorageBuilder::new()
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    /// Returns a view scoped to `name`.
    ///
    /// # Errors
    /// [`StorageError::InvalidNamespace`] if `name` is not a safe directory name.
    pub fn namespace<N>(&self, name: N) -> Result<NamespacedStorage, StorageError>
    where
        N: TryInto<NamespaceName, Error = StorageError>,
    {
        Ok(NamespacedStorage::new(self.clone(), name.try_into()?))
    }

    /// Maps a relative path to its physical location inside the sandbox.
    ///
    /// # Errors
    /// [`StorageError::PathTraversalAttempt`] for absolute paths, `..` escapes or symlinks
    /// leading out of the root.
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf, StorageError> {
        self.resolve_in(None, path)
    }

    pub(crate) fn resolve_in(
        &self,
        namespace: Option<&str>,
        path: impl AsRef<Path>,
    ) -> Result<PathBuf, StorageError> {
        security::resolve(&self.root, namespace, path)
    }

    /// Reads a whole file, decompressing if the storage is compressed.
    ///
    /// # Errors
    /// [`StorageError::FileNotFound`] if absent, [`StorageError::Decompress`] on corrupt data.
    pub async fn read(&self, path: impl AsRef<Path>) -> Result<Vec<u8>, StorageError> {
        self.read_in(None, path).await
    }

    /// Like [`Storage::read`] but maps a missing file to `None`.
    ///
    /// # Errors
    /// Any [`Storage::read`] error other than [`StorageError::FileNotFound`].
    pub async fn read_optional(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<Option<Vec<u8>>, StorageError> {
        match self.read_in(None, path).await {
            Ok(data) => Ok(Some(data)),
            Err(StorageError::FileNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub(crate) async fn read_in(
        &self,
        namespace: Option<&str>,
        path: impl AsRef<Path>,
    ) -> Result<Vec<u8>, StorageError> {
        let resolved = self.resolve_in(namespace, path)?;

        let data = match fs::read(&resolved).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::FileNotFound {
                    message: resolved.display().to_string().into(),
                    context: None,
                });
            },
            Err(err) => {
                return Err(StorageError::Io {
                    source: err,
                    context: Some(format!("read failed: {}", resolved.display()).into()),
                });
            },
        };

        self.compression.decompress(data)
    }

    /// Atomically replaces the file at `path` with `data`.
    ///
    /// # Errors
    /// [`StorageError::PathTraversalAttempt`] or [`StorageError::Io`]. On error the previous
    /// content, if any, is left intact.
    pub async fn write(&self, path: impl AsRef<Path>, data: &[u8]) -> Result<(), StorageError> {
        self.write_in(None, path, data).await
    }

    pub(crate) async fn write_in(
        &self,
        namespace: Option<&str>,
        path: impl AsRef<Path>,
        data: &[u8],
    ) -> Result<(), StorageError> {
        let resolved = self.resolve_in(namespace, path)?;
        let parent = resolved.parent().map(Path::to_path_buf);

        if let Some(parent) = &parent {
            fs::create_dir_all(parent)
                .await
                .context(format!("cannot create {}", parent.display()))?;
        }

        let temp = self.tmp_path(&resolved);
        let encoded = self.compression.compress(data);

        if let Err(err) = write_synced(&temp, &encoded).await {
            let _ = fs::remove_file(&temp).await;
            return Err(err);
        }

        if let Err(err) = fs::rename(&temp, &resolved).await {
            let _ = fs::remove_file(&temp).await;
            return Err(StorageError::Io {
                source: err,
                context: Some(format!("atomic swap failed for {}", resolved.display()).into()),
            });
        }

        if let Some(parent) = &parent {
            sync_dir(parent).await;
        }

        debug!(path = %resolved.display(), bytes = data.len(), "File saved atomically");
        Ok(())
    }

    /// Removes a file. Returns `false` if it did not exist.
    ///
    /// # Errors
    /// [`StorageError::PathTraversalAttempt`] or [`StorageError::Io`].
    pub async fn delete(&self, path: impl AsRef<Path>) -> Result<bool, StorageError> {
        self.delete_in(None, path).await
    }

    pub(crate) async fn delete_in(
        &self,
        namespace: Option<&str>,
        path: impl AsRef<Path>,
    ) -> Result<bool, StorageError> {
        let resolved = self.resolve_in(namespace, path)?;
        match fs::remove_file(&resolved).await {
            Ok(()) => {
                debug!(path = %resolved.display(), "File deleted");
                Ok(true)
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StorageError::Io {
                source: err,
                context: Some(format!("delete failed: {}", resolved.display()).into()),
            }),
        }
    }

    /// # Errors
    /// Only path resolution errors; a missing file is `Ok(false)`.
    pub fn exists(&self, path: impl AsRef<Path>) -> Result<bool, StorageError> {
        Ok(self.resolve_in(None, path)?.exists())
    }

    /// Deletes temp files older than the configured threshold. Returns how many were removed.
    pub async fn purge_tmp(&self) -> usize {
        maintenance::purge_tmp(&self.root, self.stale_tmp_after).await
    }

    fn tmp_path(&self, target: &Path) -> PathBuf {
        let n = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let file_name = target.file_name().and_then(|s| s.to_str()).unwrap_or("data");
        target.with_file_name(format!("{file_name}{TMP_MARKER}{}.{n}", std::process::id()))
    }
}

async fn write_synced(path: &Path, data: &[u8]) -> Result<(), StorageError> {
    let mut options = fs::OpenOptions::new();
    options.create_new(true).write(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file =
        options.open(path).await.context(format!("temp creation failed: {}", path.display()))?;
    file.write_all(data).await.context("write failed")?;
    file.sync_all().await.context("fsync failed")?;
    Ok(())
}

async fn sync_dir(path: &Path) {
    match fs::File::open(path).await {
        Ok(dir) => {
            if let Err(err) = dir.sync_all().await {
                warn!(path = %path.display(), error = %err, "Directory sync failed");
            }
        },
        Err(err) => warn!(path = %path.display(), error = %err, "Directory open failed"),
    }
}
