use crate::document::{SealedContent, SealedRecord, VaultDocument};
use crate::error::StoreError;
use crate::tombstones::TombstoneStore;
use chrono::Utc;
use ksafe_cipher::Cipher;
use ksafe_domain::{LocalId, RecordContent, RemoteId, RemoteRecord, SecurityFlags, VaultRecord};
use ksafe_kernel::session::{Session, account_namespace};
use ksafe_storage::{NamespacedStorage, Storage};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tracing::{debug, info, instrument};

/// Vault document file inside the account namespace.
pub const VAULT_FILE: &str = "vault.bin";

pub(crate) struct LoadedVault {
    user_id: String,
    files: NamespacedStorage,
    pub(crate) doc: VaultDocument,
}

impl LoadedVault {
    /// Persists `next` and only then makes it the in-memory state.
    pub(crate) async fn commit(&mut self, next: VaultDocument) -> Result<(), StoreError> {
        let bytes = next.encode()?;
        self.files.write(VAULT_FILE, &bytes).await?;
        self.doc = next;
        Ok(())
    }
}

struct StoreInner {
    storage: Storage,
    session: Session,
    state: Mutex<Option<LoadedVault>>,
}

/// Encrypted record store of the signed-in account.
///
/// All records, the id counter and the tombstones of one account live in a single
/// document (`<user_id>/vault.bin`), so every operation is one atomic file write.
/// Mutations are serialized by an internal async mutex; the in-memory copy only
/// changes after the write succeeded.
///
/// The key and the account come from the injected [`Session`]; a locked session
/// fails every operation with [`StoreError::Locked`].
#[derive(Clone)]
pub struct VaultStore {
    inner: Arc<StoreInner>,
}

impl fmt::Debug for VaultStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultStore").field("root", &self.inner.storage.root()).finish_non_exhaustive()
    }
}

impl VaultStore {
    #[must_use]
    pub fn new(storage: Storage, session: Session) -> Self {
        Self { inner: Arc::new(StoreInner { storage, session, state: Mutex::new(None) }) }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Tombstone view over the same document.
    #[must_use]
    pub fn tombstones(&self) -> TombstoneStore {
        TombstoneStore::new(self.clone())
    }

    /// Drops the cached document, e.g. when the vault is locked.
    pub async fn evict(&self) {
        self.inner.state.lock().await.take();
    }

    pub(crate) async fn vault(
        &self,
    ) -> Result<(MappedMutexGuard<'_, LoadedVault>, Cipher), StoreError> {
        let cipher = self.inner.session.cipher()?;
        let user_id = self.inner.session.user_id().ok_or_else(|| StoreError::Locked {
            message: "no account is signed in".into(),
            context: None,
        })?;

        let mut slot = self.inner.state.lock().await;
        let loaded = match slot.take() {
            Some(vault) if vault.user_id == user_id => vault,
            _ => self.load(user_id).await?,
        };

        Ok((MutexGuard::map(slot, |slot| slot.insert(loaded)), cipher))
    }

    async fn load(&self, user_id: String) -> Result<LoadedVault, StoreError> {
        let files = self.inner.storage.namespace(account_namespace(&user_id))?;
        let doc = match files.read_optional(VAULT_FILE).await? {
            Some(bytes) => VaultDocument::decode(&bytes)?,
            None => VaultDocument::default(),
        };
        info!(records = doc.records.len(), tombstones = doc.tombstones.len(), "Vault loaded");
        Ok(LoadedVault { user_id, files, doc })
    }

    /// Stores a new user-entered record.
    ///
    /// # Errors
    /// [`StoreError::Validation`] for a blank description or password,
    /// [`StoreError::DuplicateRejected`] if the same four fields already exist.
    #[instrument(skip_all)]
    pub async fn create(&self, content: RecordContent) -> Result<LocalId, StoreError> {
        validate(&content)?;
        let (mut vault, cipher) = self.vault().await?;
        ensure_unique(&vault.doc, &cipher, &content, None)?;

        let mut next = vault.doc.clone();
        let local_id = next.allocate_id();
        next.records.push(SealedRecord {
            local_id,
            remote_id: None,
            content: SealedContent::seal(&cipher, &content)?,
            flags: SecurityFlags::empty(),
            last_modified: Utc::now(),
            synced: false,
        });
        vault.commit(next).await?;

        debug!(%local_id, "Record created");
        Ok(local_id)
    }

    /// Seals a remote record for [`VaultStore::create_from_remote`].
    ///
    /// # Errors
    /// [`StoreError::Locked`] or [`StoreError::Crypto`].
    pub fn seal(&self, remote: &RemoteRecord) -> Result<SealedRecord, StoreError> {
        let cipher = self.inner.session.cipher()?;
        Ok(SealedRecord {
            local_id: LocalId::new(0),
            remote_id: Some(remote.remote_id.clone()),
            content: SealedContent::seal(&cipher, &remote.content)?,
            flags: SecurityFlags::empty(),
            last_modified: remote.last_modified,
            synced: true,
        })
    }

    /// Inserts an already sealed record under a fresh local id, marked synced.
    ///
    /// No duplicate check: remote data is taken as is.
    ///
    /// # Errors
    /// [`StoreError::Locked`], [`StoreError::Storage`] or [`StoreError::Codec`].
    #[instrument(skip_all, fields(remote_id = ?sealed.remote_id))]
    pub async fn create_from_remote(&self, sealed: SealedRecord) -> Result<LocalId, StoreError> {
        let (mut vault, _) = self.vault().await?;

        let mut next = vault.doc.clone();
        let local_id = next.allocate_id();
        next.records.push(SealedRecord { local_id, synced: true, ..sealed });
        vault.commit(next).await?;

        debug!(%local_id, "Remote record imported");
        Ok(local_id)
    }

    /// Replaces the content of `record.local_id`.
    ///
    /// Returns `false` if the id is unknown or the content is unchanged. On change the
    /// record becomes unsynced; `remote_id` and flags are kept.
    ///
    /// # Errors
    /// [`StoreError::Validation`] or [`StoreError::DuplicateRejected`] (the record
    /// itself is not a duplicate of itself).
    #[instrument(skip_all, fields(local_id = %record.local_id))]
    pub async fn update(&self, record: &VaultRecord) -> Result<bool, StoreError> {
        validate(&record.content)?;
        let (mut vault, cipher) = self.vault().await?;

        let Some(index) = vault.doc.position(record.local_id) else {
            return Ok(false);
        };
        if vault.doc.records[index].content.open(&cipher)? == record.content {
            return Ok(false);
        }
        ensure_unique(&vault.doc, &cipher, &record.content, Some(record.local_id))?;

        let mut next = vault.doc.clone();
        let stored = &mut next.records[index];
        stored.content = SealedContent::seal(&cipher, &record.content)?;
        stored.last_modified = Utc::now();
        stored.synced = false;
        vault.commit(next).await?;

        debug!("Record updated");
        Ok(true)
    }

    /// Sync-side write: addresses the record by `remote_id`, falling back to `local_id`.
    ///
    /// Writes the content, adopts `remote_id` only if none is stored yet, and copies
    /// `synced`. `last_modified` is left alone and no duplicate check runs. Returns
    /// `false` when nothing matched or nothing changed.
    ///
    /// # Errors
    /// [`StoreError::Locked`], [`StoreError::Crypto`] or a persistence error.
    #[instrument(skip_all, fields(local_id = %record.local_id, remote_id = ?record.remote_id))]
    pub async fn update_by_remote_id(&self, record: &VaultRecord) -> Result<bool, StoreError> {
        let (mut vault, cipher) = self.vault().await?;

        let index = record
            .remote_id
            .as_ref()
            .and_then(|remote_id| vault.doc.position_by_remote(remote_id))
            .or_else(|| vault.doc.position(record.local_id));
        let Some(index) = index else {
            return Ok(false);
        };

        let stored = &vault.doc.records[index];
        let content_changed = stored.content.open(&cipher)? != record.content;
        let adopts_remote_id = stored.remote_id.is_none() && record.remote_id.is_some();
        if !content_changed && !adopts_remote_id && stored.synced == record.synced {
            return Ok(false);
        }

        let mut next = vault.doc.clone();
        let target = &mut next.records[index];
        if content_changed {
            target.content = SealedContent::seal(&cipher, &record.content)?;
        }
        if adopts_remote_id {
            target.remote_id.clone_from(&record.remote_id);
        }
        target.synced = record.synced;
        vault.commit(next).await?;

        debug!(content_changed, adopts_remote_id, synced = record.synced, "Record reconciled");
        Ok(true)
    }

    /// Removes a record; one that was uploaded leaves a tombstone in the same write.
    ///
    /// # Errors
    /// [`StoreError::Locked`] or a persistence error.
    #[instrument(skip(self))]
    pub async fn delete(&self, local_id: LocalId) -> Result<bool, StoreError> {
        let (mut vault, _) = self.vault().await?;
        let Some(index) = vault.doc.position(local_id) else {
            return Ok(false);
        };

        let mut next = vault.doc.clone();
        let removed = next.records.remove(index);
        let tombstoned = removed.remote_id.is_some_and(|remote_id| next.bury(remote_id, Utc::now()));
        vault.commit(next).await?;

        debug!(tombstoned, "Record deleted");
        Ok(true)
    }

    /// Removes every record and tombstone. The id counter is kept so ids are never reused.
    ///
    /// # Errors
    /// [`StoreError::Locked`] or a persistence error.
    #[instrument(skip_all)]
    pub async fn clear(&self) -> Result<usize, StoreError> {
        let (mut vault, _) = self.vault().await?;
        let removed = vault.doc.records.len();

        let next = VaultDocument { next_id: vault.doc.next_id, ..VaultDocument::default() };
        vault.commit(next).await?;

        info!(removed, "Vault cleared");
        Ok(removed)
    }

    /// All records with sealed fields, in storage order.
    ///
    /// # Errors
    /// [`StoreError::Locked`] or a load error.
    pub async fn read_all(&self) -> Result<Vec<SealedRecord>, StoreError> {
        let (vault, _) = self.vault().await?;
        Ok(vault.doc.records.clone())
    }

    /// All records decrypted, in storage order.
    ///
    /// # Errors
    /// [`StoreError::Locked`], [`StoreError::Crypto`] or a load error.
    pub async fn read_all_decrypted(&self) -> Result<Vec<VaultRecord>, StoreError> {
        let (vault, cipher) = self.vault().await?;
        vault.doc.open_all(&cipher)
    }

    /// Records waiting for upload, in storage order.
    ///
    /// # Errors
    /// Same as [`VaultStore::read_all_decrypted`].
    pub async fn unsynced(&self) -> Result<Vec<VaultRecord>, StoreError> {
        let (vault, cipher) = self.vault().await?;
        vault.doc.records.iter().filter(|r| !r.synced).map(|r| r.open(&cipher)).collect()
    }

    /// # Errors
    /// Same as [`VaultStore::read_all_decrypted`].
    pub async fn get(&self, local_id: LocalId) -> Result<Option<VaultRecord>, StoreError> {
        let (vault, cipher) = self.vault().await?;
        vault.doc.position(local_id).map(|index| vault.doc.records[index].open(&cipher)).transpose()
    }

    /// # Errors
    /// [`StoreError::Locked`] or a load error.
    pub async fn exists_by_remote_id(&self, remote_id: &RemoteId) -> Result<bool, StoreError> {
        let (vault, _) = self.vault().await?;
        Ok(vault.doc.position_by_remote(remote_id).is_some())
    }

    /// Every record that shares its exact content with at least one other, in storage order.
    ///
    /// # Errors
    /// Same as [`VaultStore::read_all_decrypted`].
    pub async fn find_content_duplicates(&self) -> Result<Vec<VaultRecord>, StoreError> {
        let records = self.read_all_decrypted().await?;

        let mut counts: HashMap<&RecordContent, usize> = HashMap::new();
        for record in &records {
            *counts.entry(&record.content).or_default() += 1;
        }

        Ok(records
            .iter()
            .filter(|r| counts.get(&r.content).is_some_and(|&n| n > 1))
            .cloned()
            .collect())
    }

    /// Keeps the newest record of each duplicate group (ties: highest local id) and removes
    /// the rest in one write. Removed uploaded records leave tombstones.
    ///
    /// # Errors
    /// [`StoreError::Locked`], [`StoreError::Crypto`] or a persistence error.
    #[instrument(skip_all)]
    pub async fn clean_content_duplicates(&self) -> Result<usize, StoreError> {
        let (mut vault, cipher) = self.vault().await?;
        let records = vault.doc.open_all(&cipher)?;

        let mut keepers: HashMap<&RecordContent, &VaultRecord> = HashMap::new();
        for record in &records {
            keepers
                .entry(&record.content)
                .and_modify(|keeper| {
                    if (record.last_modified, record.local_id)
                        > (keeper.last_modified, keeper.local_id)
                    {
                        *keeper = record;
                    }
                })
                .or_insert(record);
        }

        let doomed: HashSet<LocalId> = records
            .iter()
            .filter(|r| keepers.get(&r.content).is_some_and(|keeper| keeper.local_id != r.local_id))
            .map(|r| r.local_id)
            .collect();
        if doomed.is_empty() {
            return Ok(0);
        }

        let mut next = vault.doc.clone();
        let mut buried = Vec::new();
        next.records.retain(|r| {
            let keep = !doomed.contains(&r.local_id);
            if !keep && let Some(remote_id) = &r.remote_id {
                buried.push(remote_id.clone());
            }
            keep
        });
        let now = Utc::now();
        for remote_id in buried {
            next.bury(remote_id, now);
        }
        vault.commit(next).await?;

        info!(removed = doomed.len(), "Content duplicates cleaned");
        Ok(doomed.len())
    }

    /// Persists derived flags in one write. Never touches `synced` or `last_modified`;
    /// unknown ids are ignored. Returns how many records changed.
    ///
    /// # Errors
    /// [`StoreError::Locked`] or a persistence error.
    #[instrument(skip_all, fields(updates = updates.len()))]
    pub async fn write_flags(&self, updates: &[(LocalId, SecurityFlags)]) -> Result<usize, StoreError> {
        let (mut vault, _) = self.vault().await?;

        let mut next = vault.doc.clone();
        let mut changed = 0;
        for (local_id, flags) in updates {
            if let Some(record) = next.records.iter_mut().find(|r| r.local_id == *local_id)
                && record.flags != *flags
            {
                record.flags = *flags;
                changed += 1;
            }
        }

        if changed > 0 {
            vault.commit(next).await?;
            debug!(changed, "Security flags written");
        }
        Ok(changed)
    }
}

fn validate(content: &RecordContent) -> Result<(), StoreError> {
    match content.missing_field() {
        Some(field) => Err(StoreError::Validation {
            message: format!("{field} is required").into(),
            context: None,
        }),
        None => Ok(()),
    }
}

fn ensure_unique(
    doc: &VaultDocument,
    cipher: &Cipher,
    content: &RecordContent,
    exclude: Option<LocalId>,
) -> Result<(), StoreError> {
    for record in doc.records.iter().filter(|r| Some(r.local_id) != exclude) {
        if record.content.open(cipher)? == *content {
            return Err(StoreError::DuplicateRejected {
                message: "a record with identical content already exists".into(),
                context: Some(format!("local id {}", record.local_id).into()),
            });
        }
    }
    Ok(())
}
