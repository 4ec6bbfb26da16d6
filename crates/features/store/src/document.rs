use chrono::{DateTime, Utc};
use ksafe_cipher::Cipher;
use ksafe_domain::{LocalId, RecordContent, RemoteId, SecurityFlags, Tombstone, VaultRecord};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreErrorExt};

pub(crate) const DOCUMENT_VERSION: u8 = 1;

/// Encrypted-at-rest form of [`RecordContent`]: each field is a base64 cipher payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedContent {
    pub description: String,
    pub username: String,
    pub url: String,
    pub password: String,
}

impl SealedContent {
    pub(crate) fn seal(cipher: &Cipher, content: &RecordContent) -> Result<Self, StoreError> {
        Ok(Self {
            description: cipher.encrypt(&content.description)?,
            username: cipher.encrypt(&content.username)?,
            url: cipher.encrypt(&content.url)?,
            password: cipher.encrypt(&content.password)?,
        })
    }

    pub(crate) fn open(&self, cipher: &Cipher) -> Result<RecordContent, StoreError> {
        Ok(RecordContent {
            description: cipher.decrypt(&self.description)?,
            username: cipher.decrypt(&self.username)?,
            url: cipher.decrypt(&self.url)?,
            password: cipher.decrypt(&self.password)?,
        })
    }
}

/// A vault record as persisted: metadata in clear, content sealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedRecord {
    pub local_id: LocalId,
    pub remote_id: Option<RemoteId>,
    pub content: SealedContent,
    pub flags: SecurityFlags,
    pub last_modified: DateTime<Utc>,
    pub synced: bool,
}

impl SealedRecord {
    pub(crate) fn open(&self, cipher: &Cipher) -> Result<VaultRecord, StoreError> {
        Ok(VaultRecord {
            local_id: self.local_id,
            remote_id: self.remote_id.clone(),
            content: self.content.open(cipher)?,
            flags: self.flags,
            last_modified: self.last_modified,
            synced: self.synced,
        })
    }
}

/// Everything one account keeps locally, written as a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct VaultDocument {
    pub(crate) version: u8,
    pub(crate) next_id: LocalId,
    pub(crate) records: Vec<SealedRecord>,
    pub(crate) tombstones: Vec<Tombstone>,
}

impl Default for VaultDocument {
    fn default() -> Self {
        Self {
            version: DOCUMENT_VERSION,
            next_id: LocalId::new(1),
            records: Vec::new(),
            tombstones: Vec::new(),
        }
    }
}

impl VaultDocument {
    pub(crate) fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        let doc: Self = postcard::from_bytes(bytes).context("vault document is unreadable")?;
        if doc.version != DOCUMENT_VERSION {
            return Err(StoreError::Internal {
                message: format!("unsupported vault document version {}", doc.version).into(),
                context: None,
            });
        }
        Ok(doc)
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, StoreError> {
        Ok(postcard::to_stdvec(self)?)
    }

    pub(crate) fn allocate_id(&mut self) -> LocalId {
        let id = self.next_id;
        self.next_id = id.next();
        id
    }

    pub(crate) fn position(&self, id: LocalId) -> Option<usize> {
        self.records.iter().position(|r| r.local_id == id)
    }

    pub(crate) fn position_by_remote(&self, remote_id: &RemoteId) -> Option<usize> {
        self.records.iter().position(|r| r.remote_id.as_ref() == Some(remote_id))
    }

    /// Adds a tombstone unless one exists. Returns whether it was added.
    pub(crate) fn bury(&mut self, remote_id: RemoteId, at: DateTime<Utc>) -> bool {
        if self.tombstones.iter().any(|t| t.remote_id == remote_id) {
            return false;
        }
        self.tombstones.push(Tombstone { remote_id, deleted_at: at });
        true
    }

    /// Decrypts every record in storage order.
    pub(crate) fn open_all(&self, cipher: &Cipher) -> Result<Vec<VaultRecord>, StoreError> {
        self.records.iter().map(|r| r.open(cipher)).collect()
    }
}
