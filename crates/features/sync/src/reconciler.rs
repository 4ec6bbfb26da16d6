use crate::error::{RemoteError, SyncError};
use crate::remote::RemoteVault;
use crate::report::{DeletionReport, ImportReport, SyncReport, UploadReport};
use ksafe_domain::config::SyncConfig;
use ksafe_domain::{Credentials, VaultRecord};
use ksafe_kernel::CancellationToken;
use ksafe_kernel::session::Session;
use ksafe_store::VaultStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Moves records between the local [`VaultStore`] and a [`RemoteVault`].
///
/// Credentials and the cancellation token come from the store's [`Session`]; closing
/// the session aborts a running sync between records. Remote failures of a single
/// record are logged and counted, store failures abort the run.
#[derive(Debug, Clone)]
pub struct Reconciler {
    store: VaultStore,
    remote: Arc<dyn RemoteVault>,
    request_timeout: Duration,
}

impl Reconciler {
    pub fn new(store: VaultStore, remote: Arc<dyn RemoteVault>) -> Self {
        Self { store, remote, request_timeout: DEFAULT_REQUEST_TIMEOUT }
    }

    pub fn from_config(store: VaultStore, remote: Arc<dyn RemoteVault>, config: &SyncConfig) -> Self {
        Self::new(store, remote).with_request_timeout(config.request_timeout())
    }

    /// Upper bound for every single remote call.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn session(&self) -> &Session {
        self.store.session()
    }

    /// Import, then upload, then push local deletions.
    ///
    /// # Errors
    /// See [`Reconciler::import_remote`]; a failed fetch aborts before any upload.
    #[instrument(skip_all)]
    pub async fn full_sync(&self) -> Result<SyncReport, SyncError> {
        let import = self.import_remote().await?;
        let upload = self.upload_unsynced().await?;
        let deletions = self.push_deletions().await?;

        let report = SyncReport { import, upload, deletions };
        info!(%report, "Sync finished");
        Ok(report)
    }

    /// Uploads every unsynced record, one at a time under the session mutation gate.
    ///
    /// # Errors
    /// [`SyncError::Cancelled`] when the session closes, [`SyncError::Store`] when the
    /// vault cannot be read or written. Remote errors only count as `failed`, except an
    /// update whose remote copy is gone, which counts as `orphaned`. The record keeps
    /// its `remote_id` since that id is assigned once.
    #[instrument(skip_all)]
    pub async fn upload_unsynced(&self) -> Result<UploadReport, SyncError> {
        let cancel = self.session().cancellation();
        let creds = self.session().credentials()?;
        let pending = self.store.unsynced().await?;
        let mut report = UploadReport::default();

        for snapshot in pending {
            let _guard = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(SyncError::cancelled()),
                guard = self.session().begin_local_update() => guard,
            };

            let current = match self.store.get(snapshot.local_id).await? {
                Some(record) if !record.synced => record,
                _ => {
                    report.skipped += 1;
                    continue;
                },
            };

            let local_id = current.local_id;
            let remote_id = current.remote_id.clone();
            match self.upload(&cancel, &creds, current).await {
                Ok(()) => report.uploaded += 1,
                Err(SyncError::Remote { source: RemoteError::NotFound { .. }, .. })
                    if remote_id.is_some() =>
                {
                    warn!(
                        %local_id,
                        ?remote_id,
                        "Remote copy no longer exists; record kept locally and left unsynced"
                    );
                    report.orphaned += 1;
                },
                Err(SyncError::Remote { source, .. }) => {
                    warn!(%local_id, error = %source, "Upload failed; record stays unsynced");
                    report.failed += 1;
                },
                Err(err) => return Err(err),
            }
        }

        debug!(?report, "Upload pass complete");
        Ok(report)
    }

    async fn upload(
        &self,
        cancel: &CancellationToken,
        creds: &Credentials,
        mut record: VaultRecord,
    ) -> Result<(), SyncError> {
        match record.remote_id.clone() {
            None => {
                let remote_id = self
                    .call(cancel, "create", self.remote.create_record(creds, &record.content))
                    .await?;
                record.remote_id = Some(remote_id);
            },
            Some(remote_id) => {
                self.call(cancel, "update", self.remote.update_record(creds, &remote_id, &record.content))
                    .await?;
            },
        }

        record.synced = true;
        self.store.update_by_remote_id(&record).await?;
        Ok(())
    }

    /// Imports remote records this device has neither seen nor deleted.
    ///
    /// # Errors
    /// [`SyncError::Remote`] if the remote set cannot be fetched,
    /// [`SyncError::Cancelled`] or [`SyncError::Store`] otherwise.
    #[instrument(skip_all)]
    pub async fn import_remote(&self) -> Result<ImportReport, SyncError> {
        let cancel = self.session().cancellation();
        let creds = self.session().credentials()?;
        let tombstones = self.store.tombstones();

        let remote_records =
            self.call(&cancel, "read_all", self.remote.read_all_records(&creds)).await?;
        let mut report = ImportReport::default();

        for record in remote_records {
            if cancel.is_cancelled() {
                return Err(SyncError::cancelled());
            }
            if self.store.exists_by_remote_id(&record.remote_id).await? {
                report.skipped += 1;
                continue;
            }
            if tombstones.was_deleted(&record.remote_id).await? {
                debug!(remote_id = %record.remote_id, "Skipping record deleted on this device");
                report.suppressed += 1;
                continue;
            }

            let sealed = self.store.seal(&record)?;
            self.store.create_from_remote(sealed).await?;
            report.imported += 1;
        }

        debug!(?report, "Import pass complete");
        Ok(report)
    }

    /// Deletes tombstoned records on the remote and forgets the tombstone on success.
    ///
    /// A record the remote no longer has counts as deleted. Other failures keep the
    /// tombstone for the next cycle.
    ///
    /// # Errors
    /// [`SyncError::Cancelled`] or [`SyncError::Store`].
    #[instrument(skip_all)]
    pub async fn push_deletions(&self) -> Result<DeletionReport, SyncError> {
        let cancel = self.session().cancellation();
        let creds = self.session().credentials()?;
        let tombstones = self.store.tombstones();
        let mut report = DeletionReport::default();

        for remote_id in tombstones.all_deleted_ids().await? {
            match self.call(&cancel, "delete", self.remote.delete_record(&creds, &remote_id)).await {
                Ok(()) | Err(SyncError::Remote { source: RemoteError::NotFound { .. }, .. }) => {
                    tombstones.forget(&remote_id).await?;
                    report.deleted += 1;
                },
                Err(SyncError::Remote { source, .. }) => {
                    warn!(%remote_id, error = %source, "Remote delete failed; tombstone kept");
                    report.failed += 1;
                },
                Err(err) => return Err(err),
            }
        }

        debug!(?report, "Deletion pass complete");
        Ok(report)
    }

    /// Runs one remote call bounded by the request timeout and the session token.
    async fn call<T, F>(
        &self,
        cancel: &CancellationToken,
        operation: &'static str,
        request: F,
    ) -> Result<T, SyncError>
    where
        F: Future<Output = Result<T, RemoteError>>,
    {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(SyncError::cancelled()),
            result = tokio::time::timeout(self.request_timeout, request) => match result {
                Ok(outcome) => outcome.map_err(SyncError::from),
                Err(_) => Err(RemoteError::timed_out(operation).into()),
            },
        }
    }
}
