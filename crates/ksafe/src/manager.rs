use crate::builder::VaultManagerBuilder;
use crate::error::ManagerError;
use ksafe_analyzer::SecurityAnalyzer;
use ksafe_cipher::{Aes, Cipher, KeyManager};
use ksafe_domain::config::KeepsafeConfig;
use ksafe_domain::{AuthTokens, LocalId, RecordContent, VaultRecord};
use ksafe_kernel::session::{DeviceSessionStore, Session, SessionPersistence, account_namespace};
use ksafe_storage::{Compression, Storage};
use ksafe_store::VaultStore;
use ksafe_sync::{Reconciler, RemoteVault, SyncReport};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};
use zeroize::Zeroizing;

/// Master-password verifier, relative to the account namespace.
pub const VERIFIER_FILE: &str = "verifier";

pub(crate) struct ManagerInner {
    pub(crate) storage: Storage,
    pub(crate) session: Session,
    pub(crate) store: VaultStore,
    pub(crate) analyzer: SecurityAnalyzer,
    pub(crate) reconciler: Option<Reconciler>,
    pub(crate) persistence: Option<Arc<dyn SessionPersistence>>,
    pub(crate) keys: KeyManager,
    /// Serializes security passes.
    pub(crate) analysis: Mutex<()>,
}

/// Entry point for the UI: one signed-in account, its vault and the background
/// bookkeeping around it.
///
/// Every successful mutation is followed by a security pass that recomputes the
/// flags of all records. A failing pass is logged and never changes the result of
/// the mutation that triggered it.
///
/// ```rust,no_run
/// use ksafe::VaultManager;
/// use ksafe::domain::{AuthTokens, RecordContent};
/// use ksafe::domain::config::KeepsafeConfig;
///
/// # async fn run() -> Result<(), ksafe::ManagerError> {
/// let manager = VaultManager::from_config(&KeepsafeConfig::default(), None).await?;
/// manager.unlock(AuthTokens::new("user-1", "id-token", "refresh"), "master password").await?;
///
/// let id = manager.save(RecordContent::new("mail", "me", "https://mail.test", "s3cret!")).await?;
/// for record in manager.get_all().await? {
///     println!("{} {} [{}]", record.local_id, record.content.description, record.flags);
/// }
/// manager.delete(id).await?;
/// manager.lock().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct VaultManager {
    pub(crate) inner: Arc<ManagerInner>,
}

impl fmt::Debug for VaultManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultManager")
            .field("session", &self.inner.session)
            .field("sync", &self.inner.reconciler.is_some())
            .finish_non_exhaustive()
    }
}

impl VaultManager {
    #[must_use]
    pub fn builder() -> VaultManagerBuilder {
        VaultManagerBuilder::default()
    }

    /// Wires storage, analyzer and device-bound session persistence from `config`.
    ///
    /// `remote` is only used when `sync.enabled` is set.
    ///
    /// # Errors
    /// [`ManagerError::Storage`] if the data directory is unusable,
    /// [`ManagerError::Analysis`] for an invalid security section,
    /// [`ManagerError::Crypto`] for an unsupported iteration count.
    pub async fn from_config(
        config: &KeepsafeConfig,
        remote: Option<Arc<dyn RemoteVault>>,
    ) -> Result<Self, ManagerError> {
        let storage = Storage::builder()
            .root(&config.storage.data_dir)
            .compression(Compression::from_enabled(config.storage.compression))
            .connect()
            .await?;

        let mut builder = Self::builder()
            .analyzer(SecurityAnalyzer::from_config(&config.security)?)
            .kdf_iterations(config.security.kdf_iterations)
            .sync_timeout(config.sync.request_timeout());

        match DeviceSessionStore::new(storage.clone()) {
            Ok(persistence) => builder = builder.persistence(Arc::new(persistence)),
            Err(err) => warn!(error = %err, "Device binding unavailable; sign-in will not be remembered"),
        }

        match (config.sync.enabled, remote) {
            (true, Some(remote)) => builder = builder.remote(remote),
            (true, None) => warn!("Sync is enabled but no remote vault is available"),
            (false, _) => debug!("Sync disabled"),
        }

        builder.storage(storage).build()
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        self.inner.session.is_open()
    }

    #[must_use]
    pub fn sync_available(&self) -> bool {
        self.inner.reconciler.is_some()
    }

    /// The account remembered on this device, if any.
    ///
    /// # Errors
    /// [`ManagerError::Storage`] if the session file cannot be read.
    pub async fn restore_session(&self) -> Result<Option<AuthTokens>, ManagerError> {
        match &self.inner.persistence {
            Some(persistence) => Ok(persistence.load().await?),
            None => Ok(None),
        }
    }

    /// Derives the vault key and opens the session.
    ///
    /// The first unlock of an account stores a verifier of the key; later unlocks must
    /// match it. The remembered session is updated on success.
    ///
    /// # Errors
    /// [`ManagerError::WrongMasterPassword`] on mismatch (the session stays closed),
    /// [`ManagerError::Crypto`] for an empty password, [`ManagerError::Storage`].
    #[instrument(skip_all, fields(user_id = %tokens.user_id))]
    pub async fn unlock(&self, tokens: AuthTokens, master_password: &str) -> Result<(), ManagerError> {
        let keys = self.inner.keys;
        let password = Zeroizing::new(master_password.to_owned());
        let salt = tokens.user_id.clone();
        let key = tokio::task::spawn_blocking(move || keys.derive_key(&password, salt.as_bytes()))
            .await
            .map_err(|e| ManagerError::Internal {
                message: e.to_string().into(),
                context: Some("key derivation task".into()),
            })??;

        let files = self.inner.storage.namespace(account_namespace(&tokens.user_id))?;
        match files.read_optional(VERIFIER_FILE).await? {
            Some(stored) => {
                let expected = String::from_utf8_lossy(&stored);
                if !KeyManager::matches(&key, expected.trim()) {
                    warn!("Master password rejected");
                    return Err(ManagerError::WrongMasterPassword {
                        message: "the master password does not open this vault".into(),
                        context: None,
                    });
                }
            },
            None => {
                files.write(VERIFIER_FILE, KeyManager::verifier(&key).as_bytes()).await?;
                info!("Master password verifier created");
            },
        }

        let cipher = Cipher::<Aes>::builder().key(&key).build()?;
        if let Some(persistence) = &self.inner.persistence
            && let Err(err) = persistence.save(&tokens).await
        {
            warn!(error = %err, "Could not remember the session on this device");
        }

        self.inner.session.open(tokens, cipher);
        Ok(())
    }

    /// Closes the session, cancelling running passes, and drops the cached vault.
    /// Returns `false` if it was already locked.
    ///
    /// # Errors
    /// None at present.
    pub async fn lock(&self) -> Result<bool, ManagerError> {
        let was_open = self.inner.session.close();
        self.inner.store.evict().await;
        Ok(was_open)
    }

    /// Locks and forgets the remembered session.
    ///
    /// # Errors
    /// [`ManagerError::Storage`] if the session file cannot be removed.
    pub async fn logout(&self) -> Result<(), ManagerError> {
        self.lock().await?;
        if let Some(persistence) = &self.inner.persistence {
            persistence.clear().await?;
        }
        info!("Signed out");
        Ok(())
    }

    /// # Errors
    /// [`ManagerError::Validation`] for blank mandatory fields or an exact duplicate.
    #[instrument(skip_all)]
    pub async fn save(&self, content: RecordContent) -> Result<LocalId, ManagerError> {
        let local_id = {
            let _update = self.inner.session.begin_local_update().await;
            self.inner.store.create(content).await?
        };
        self.after_change().await;
        Ok(local_id)
    }

    /// Returns `false` when the record is unknown or unchanged.
    ///
    /// # Errors
    /// Same as [`VaultManager::save`].
    #[instrument(skip_all, fields(local_id = %record.local_id))]
    pub async fn update(&self, record: &VaultRecord) -> Result<bool, ManagerError> {
        let changed = {
            let _update = self.inner.session.begin_local_update().await;
            self.inner.store.update(record).await?
        };
        if changed {
            self.after_change().await;
        }
        Ok(changed)
    }

    /// # Errors
    /// [`ManagerError::Locked`] or [`ManagerError::Storage`].
    #[instrument(skip(self))]
    pub async fn delete(&self, local_id: LocalId) -> Result<bool, ManagerError> {
        let removed = {
            let _update = self.inner.session.begin_local_update().await;
            self.inner.store.delete(local_id).await?
        };
        if removed {
            self.after_change().await;
        }
        Ok(removed)
    }

    /// # Errors
    /// [`ManagerError::Locked`], [`ManagerError::Crypto`] or [`ManagerError::Storage`].
    pub async fn get_all(&self) -> Result<Vec<VaultRecord>, ManagerError> {
        Ok(self.inner.store.read_all_decrypted().await?)
    }

    /// Records sharing their full content with another record.
    ///
    /// # Errors
    /// Same as [`VaultManager::get_all`].
    pub async fn find_duplicates(&self) -> Result<Vec<VaultRecord>, ManagerError> {
        Ok(self.inner.store.find_content_duplicates().await?)
    }

    /// Keeps the newest record of each duplicate group. Returns how many were removed.
    ///
    /// # Errors
    /// Same as [`VaultManager::get_all`].
    #[instrument(skip_all)]
    pub async fn clean_duplicates(&self) -> Result<usize, ManagerError> {
        let removed = {
            let _update = self.inner.session.begin_local_update().await;
            self.inner.store.clean_content_duplicates().await?
        };
        if removed > 0 {
            self.after_change().await;
        }
        Ok(removed)
    }

    /// Runs a full sync against the configured remote.
    ///
    /// # Errors
    /// [`ManagerError::SyncUnavailable`] without a remote, [`ManagerError::Network`]
    /// when the remote set cannot be fetched, [`ManagerError::Locked`] when the
    /// session closes mid-sync.
    #[instrument(skip_all)]
    pub async fn sync(&self) -> Result<SyncReport, ManagerError> {
        let Some(reconciler) = &self.inner.reconciler else {
            return Err(ManagerError::SyncUnavailable {
                message: "no remote vault is configured".into(),
                context: None,
            });
        };

        let report = reconciler.full_sync().await?;
        if report.changed() {
            self.after_change().await;
        }
        Ok(report)
    }

    /// Recomputes the flags of every record and persists the changes.
    /// Returns how many records changed flags.
    ///
    /// # Errors
    /// [`ManagerError::Analysis`] if the session closed during the pass, or a store error.
    #[instrument(skip_all)]
    pub async fn refresh_security(&self) -> Result<usize, ManagerError> {
        let _pass = self.inner.analysis.lock().await;
        let cancel = self.inner.session.cancellation();

        let mut records = self.inner.store.read_all_decrypted().await?;
        self.inner.analyzer.analyze_batch(&mut records, &cancel).await?;

        let updates: Vec<_> = records.iter().map(|r| (r.local_id, r.flags)).collect();
        let changed = self.inner.store.write_flags(&updates).await?;
        debug!(records = records.len(), changed, "Security flags refreshed");
        Ok(changed)
    }

    /// Removes every record and tombstone of the signed-in account.
    ///
    /// # Errors
    /// [`ManagerError::Locked`] or [`ManagerError::Storage`].
    #[instrument(skip_all)]
    pub async fn clear(&self) -> Result<usize, ManagerError> {
        let removed = {
            let _update = self.inner.session.begin_local_update().await;
            self.inner.store.clear().await?
        };
        self.after_change().await;
        Ok(removed)
    }

    async fn after_change(&self) {
        if let Err(err) = self.refresh_security().await {
            error!(error = %err, "Security pass failed");
        }
    }
}
