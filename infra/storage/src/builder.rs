use crate::engine::{Compression, Storage, StorageInner};
use crate::error::{StorageError, StorageErrorExt};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Duration;
use tokio::fs;
use tracing::info;

/// Temp files younger than this may belong to a write still in flight.
const DEFAULT_STALE_TMP: Duration = Duration::from_secs(300);

/// Builder state before a root directory is chosen.
#[derive(Debug, Default)]
pub struct Unrooted;

/// Builder state holding the root directory.
#[derive(Debug)]
pub struct Rooted(PathBuf);

mod sealed {
    pub trait Root {}
    impl Root for super::Unrooted {}
    impl Root for super::Rooted {}
}

/// Configures a [`Storage`] sandbox. Only a rooted builder can [`connect`](StorageBuilder::connect).
#[derive(Debug)]
pub struct StorageBuilder<R: sealed::Root = Unrooted> {
    root: R,
    compression: Compression,
    create_missing: bool,
    stale_tmp_after: Duration,
}

impl Default for StorageBuilder<Unrooted> {
    fn default() -> Self {
        Self {
            root: Unrooted,
            compression: Compression::None,
            create_missing: true,
            stale_tmp_after: DEFAULT_STALE_TMP,
        }
    }
}

impl StorageBuilder<Unrooted> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory holding every namespace. Resolved to its canonical form on connect.
    #[must_use]
    pub fn root(self, path: impl Into<PathBuf>) -> StorageBuilder<Rooted> {
        StorageBuilder {
            root: Rooted(path.into()),
            compression: self.compression,
            create_missing: self.create_missing,
            stale_tmp_after: self.stale_tmp_after,
        }
    }
}

impl<R: sealed::Root> StorageBuilder<R> {
    /// Compresses payloads at rest. Files written under one setting are unreadable under the other.
    #[must_use]
    pub const fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// When `false`, connecting to a missing root fails instead of creating it.
    #[must_use]
    pub const fn create(mut self, create_missing: bool) -> Self {
        self.create_missing = create_missing;
        self
    }

    /// Age after which an orphaned temp file is removed at connect time.
    #[must_use]
    pub const fn stale_tmp_after(mut self, age: Duration) -> Self {
        self.stale_tmp_after = age;
        self
    }
}

impl StorageBuilder<Rooted> {
    /// Prepares the root and returns a shared handle to it.
    ///
    /// Leftover temp files from interrupted writes are purged before the handle is returned.
    /// A failed purge is logged and does not fail the connect.
    ///
    /// # Errors
    /// [`StorageError::Io`] if the root is missing with `create(false)` or cannot be resolved.
    pub async fn connect(self) -> Result<Storage, StorageError> {
        let Rooted(requested) = self.root;

        if self.create_missing {
            fs::create_dir_all(&requested)
                .await
                .context(format!("cannot create storage root {}", requested.display()))?;
        }

        let root = fs::canonicalize(&requested)
            .await
            .context(format!("cannot resolve storage root {}", requested.display()))?;
        info!(path = %root.display(), compression = ?self.compression, "Storage ready");

        let storage = Storage {
            inner: Arc::new(StorageInner {
                root,
                compression: self.compression,
                stale_tmp_after: self.stale_tmp_after,
                tmp_counter: AtomicU64::new(1),
            }),
        };
        storage.purge_tmp().await;

        Ok(storage)
    }
}
