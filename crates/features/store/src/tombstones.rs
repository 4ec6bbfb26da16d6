use crate::error::StoreError;
use crate::store::VaultStore;
use chrono::Utc;
use ksafe_domain::{RemoteId, Tombstone};
use tracing::{debug, instrument};

/// Remote ids deleted on this device, stored in clear next to the records.
///
/// Suppresses re-import of deleted records and drives deletion pushes.
#[derive(Debug, Clone)]
pub struct TombstoneStore {
    store: VaultStore,
}

impl TombstoneStore {
    pub(crate) const fn new(store: VaultStore) -> Self {
        Self { store }
    }

    /// Idempotent. Returns `false` if the id was already recorded.
    ///
    /// # Errors
    /// [`StoreError::Locked`] or a persistence error.
    #[instrument(skip(self))]
    pub async fn record_deleted(&self, remote_id: RemoteId) -> Result<bool, StoreError> {
        let (mut vault, _) = self.store.vault().await?;
        if vault.doc.tombstones.iter().any(|t| t.remote_id == remote_id) {
            return Ok(false);
        }

        let mut next = vault.doc.clone();
        next.bury(remote_id, Utc::now());
        vault.commit(next).await?;
        Ok(true)
    }

    /// # Errors
    /// [`StoreError::Locked`] or a load error.
    pub async fn was_deleted(&self, remote_id: &RemoteId) -> Result<bool, StoreError> {
        let (vault, _) = self.store.vault().await?;
        Ok(vault.doc.tombstones.iter().any(|t| &t.remote_id == remote_id))
    }

    /// Drops a tombstone once the remote deletion is confirmed.
    ///
    /// # Errors
    /// [`StoreError::Locked`] or a persistence error.
    #[instrument(skip(self))]
    pub async fn forget(&self, remote_id: &RemoteId) -> Result<bool, StoreError> {
        let (mut vault, _) = self.store.vault().await?;
        if !vault.doc.tombstones.iter().any(|t| &t.remote_id == remote_id) {
            return Ok(false);
        }

        let mut next = vault.doc.clone();
        next.tombstones.retain(|t| &t.remote_id != remote_id);
        vault.commit(next).await?;
        debug!("Tombstone forgotten");
        Ok(true)
    }

    /// # Errors
    /// [`StoreError::Locked`] or a load error.
    pub async fn all_deleted_ids(&self) -> Result<Vec<RemoteId>, StoreError> {
        let (vault, _) = self.store.vault().await?;
        Ok(vault.doc.tombstones.iter().map(|t| t.remote_id.clone()).collect())
    }

    /// # Errors
    /// [`StoreError::Locked`] or a load error.
    pub async fn all(&self) -> Result<Vec<Tombstone>, StoreError> {
        let (vault, _) = self.store.vault().await?;
        Ok(vault.doc.tombstones.clone())
    }
}
