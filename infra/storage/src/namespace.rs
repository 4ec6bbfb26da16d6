use crate::engine::Storage;
use crate::error::StorageError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const MAX_NAMESPACE_LEN: usize = 128;

/// A validated namespace directory name: ASCII letters, digits, `_` and `-`, case preserved.
///
/// Account ids from identity providers are case-sensitive, so names are never folded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespaceName(String);

impl TryFrom<&str> for NamespaceName {
    type Error = StorageError;

    fn try_from(value: &str) -> Result<Self, StorageError> {
        let invalid = |reason: &'static str| StorageError::InvalidNamespace {
            message: value.to_owned().into(),
            context: Some(reason.into()),
        };

        if value.is_empty() {
            return Err(invalid("namespace cannot be empty"));
        }
        if value.len() > MAX_NAMESPACE_LEN {
            return Err(invalid("namespace is too long"));
        }
        if value.starts_with('-') {
            return Err(invalid("namespace cannot start with '-'"));
        }
        if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(invalid("namespace contains illegal characters"));
        }

        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for NamespaceName {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, StorageError> {
        Self::try_from(value.as_str())
    }
}

impl AsRef<str> for NamespaceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NamespaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A view of [`Storage`] scoped to one directory under the root, typically one account.
///
/// Shares compression, sandbox and temp-file bookkeeping with its parent; clones are cheap.
#[derive(Debug, Clone)]
pub struct NamespacedStorage {
    storage: Storage,
    namespace: Arc<NamespaceName>,
}

impl NamespacedStorage {
    pub(crate) fn new(storage: Storage, namespace: NamespaceName) -> Self {
        Self { storage, namespace: Arc::new(namespace) }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.namespace.0
    }

    /// # Errors
    /// See [`Storage::resolve`].
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf, StorageError> {
        self.storage.resolve_in(Some(self.name()), path)
    }

    /// # Errors
    /// See [`Storage::read`].
    pub async fn read(&self, path: impl AsRef<Path>) -> Result<Vec<u8>, StorageError> {
        self.storage.read_in(Some(self.name()), path).await
    }

    /// # Errors
    /// See [`Storage::read_optional`].
    pub async fn read_optional(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<Option<Vec<u8>>, StorageError> {
        match self.read(path).await {
            Ok(data) => Ok(Some(data)),
            Err(StorageError::FileNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// # Errors
    /// See [`Storage::write`].
    pub async fn write(&self, path: impl AsRef<Path>, data: &[u8]) -> Result<(), StorageError> {
        self.storage.write_in(Some(self.name()), path, data).await
    }

    /// # Errors
    /// See [`Storage::delete`].
    pub async fn delete(&self, path: impl AsRef<Path>) -> Result<bool, StorageError> {
        self.storage.delete_in(Some(self.name()), path).await
    }

    /// # Errors
    /// See [`Storage::exists`].
    pub fn exists(&self, path: impl AsRef<Path>) -> Result<bool, StorageError> {
        Ok(self.resolve(path)?.exists())
    }
}
