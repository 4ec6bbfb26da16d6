use crate::error::ManagerError;
use crate::manager::{ManagerInner, VaultManager};
use ksafe_analyzer::SecurityAnalyzer;
use ksafe_cipher::{DEFAULT_ITERATIONS, KeyManager};
use ksafe_kernel::session::{Session, SessionPersistence};
use ksafe_storage::Storage;
use ksafe_store::VaultStore;
use ksafe_sync::{Reconciler, RemoteVault};
use private::Sealed;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Default)]
pub struct NoStorage;
#[derive(Debug)]
pub struct WithStorage(Storage);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoStorage {}
impl Sealed for WithStorage {}

#[allow(private_bounds)]
#[derive(Debug)]
pub struct VaultManagerBuilder<S: Sealed = NoStorage> {
    state: S,
    session: Session,
    analyzer: SecurityAnalyzer,
    remote: Option<Arc<dyn RemoteVault>>,
    persistence: Option<Arc<dyn SessionPersistence>>,
    kdf_iterations: u32,
    sync_timeout: Duration,
}

impl Default for VaultManagerBuilder<NoStorage> {
    fn default() -> Self {
        Self {
            state: NoStorage,
            session: Session::new(),
            analyzer: SecurityAnalyzer::default(),
            remote: None,
            persistence: None,
            kdf_iterations: DEFAULT_ITERATIONS,
            sync_timeout: DEFAULT_SYNC_TIMEOUT,
        }
    }
}

#[allow(private_bounds)]
impl<S: Sealed> VaultManagerBuilder<S> {
    /// Shares an existing session instead of creating a fresh one.
    #[must_use]
    pub fn session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    #[must_use]
    pub fn analyzer(mut self, analyzer: SecurityAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Enables [`VaultManager::sync`].
    #[must_use]
    pub fn remote(mut self, remote: Arc<dyn RemoteVault>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Remembers the signed-in account across restarts.
    #[must_use]
    pub fn persistence(mut self, persistence: Arc<dyn SessionPersistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    #[must_use]
    pub const fn kdf_iterations(mut self, iterations: u32) -> Self {
        self.kdf_iterations = iterations;
        self
    }

    #[must_use]
    pub const fn sync_timeout(mut self, timeout: Duration) -> Self {
        self.sync_timeout = timeout;
        self
    }
}

impl VaultManagerBuilder<NoStorage> {
    #[must_use]
    pub fn storage(self, storage: Storage) -> VaultManagerBuilder<WithStorage> {
        VaultManagerBuilder {
            state: WithStorage(storage),
            session: self.session,
            analyzer: self.analyzer,
            remote: self.remote,
            persistence: self.persistence,
            kdf_iterations: self.kdf_iterations,
            sync_timeout: self.sync_timeout,
        }
    }
}

impl VaultManagerBuilder<WithStorage> {
    /// # Errors
    /// [`ManagerError::Crypto`] if the iteration count is below the supported minimum.
    pub fn build(self) -> Result<VaultManager, ManagerError> {
        let storage = self.state.0;
        let keys = KeyManager::new(self.kdf_iterations)?;
        let store = VaultStore::new(storage.clone(), self.session.clone());
        let reconciler = self
            .remote
            .map(|remote| Reconciler::new(store.clone(), remote).with_request_timeout(self.sync_timeout));

        Ok(VaultManager {
            inner: Arc::new(ManagerInner {
                storage,
                session: self.session,
                store,
                analyzer: self.analyzer,
                reconciler,
                persistence: self.persistence,
                keys,
                analysis: Mutex::new(()),
            }),
        })
    }
}
