use crate::flags::SecurityFlags;
use crate::ids::{LocalId, RemoteId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The user-visible fields of a credential. Held decrypted in memory only.
///
/// Equality over all four fields is the duplicate criterion of the vault.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordContent {
    pub description: String,
    pub username: String,
    pub url: String,
    pub password: String,
}

impl RecordContent {
    pub fn new(
        description: impl Into<String>,
        username: impl Into<String>,
        url: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            username: username.into(),
            url: url.into(),
            password: password.into(),
        }
    }

    /// Name of the first mandatory field that is empty. Whitespace counts as content:
    /// `"    "` is a legitimate password.
    #[must_use]
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.description.is_empty() {
            Some("description")
        } else if self.password.is_empty() {
            Some("password")
        } else {
            None
        }
    }
}

impl fmt::Debug for RecordContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordContent")
            .field("description", &self.description)
            .field("username", &self.username)
            .field("url", &self.url)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A decrypted vault record as handed to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultRecord {
    pub local_id: LocalId,
    pub remote_id: Option<RemoteId>,
    pub content: RecordContent,
    pub flags: SecurityFlags,
    pub last_modified: DateTime<Utc>,
    /// True only when the local state is known to match the remote store.
    pub synced: bool,
}

impl VaultRecord {
    /// A record that has never been uploaded.
    #[must_use]
    pub fn local(local_id: LocalId, content: RecordContent, last_modified: DateTime<Utc>) -> Self {
        Self {
            local_id,
            remote_id: None,
            content,
            flags: SecurityFlags::empty(),
            last_modified,
            synced: false,
        }
    }
}

/// Marks a remote id whose record was deleted on this device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tombstone {
    pub remote_id: RemoteId,
    pub deleted_at: DateTime<Utc>,
}

/// A record as returned by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub remote_id: RemoteId,
    pub content: RecordContent,
    pub last_modified: DateTime<Utc>,
}
