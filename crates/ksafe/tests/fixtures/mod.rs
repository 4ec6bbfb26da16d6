#![allow(dead_code)]

use async_trait::async_trait;
use ksafe::VaultManager;
use ksafe::analyzer::{BreachOracle, OracleError, SecurityAnalyzer};
use ksafe::domain::{AuthTokens, RecordContent};
use ksafe::kernel::session::{DeviceSessionStore, Session};
use ksafe::storage::Storage;
use ksafe::sync::MemoryRemote;
use ksafe_cipher::MIN_ITERATIONS;
use std::sync::Arc;
use tempfile::TempDir;

pub const MASTER: &str = "correct horse battery staple";
pub const STRONG: &str = "Zk7#mQ2!vR9@";
pub const DEVICE_SECRET: &[u8] = b"test-device";

pub fn tokens(user: &str) -> AuthTokens {
    AuthTokens::new(user, format!("{user}-id-token"), format!("{user}-refresh"))
}

pub fn content(description: &str, password: &str) -> RecordContent {
    RecordContent::new(description, "alice", format!("https://{description}.test"), password)
}

/// Flags exactly one password as breached.
#[derive(Debug)]
pub struct OneBreach(pub &'static str);

#[async_trait]
impl BreachOracle for OneBreach {
    async fn is_known_breached(&self, password: &str) -> Result<bool, OracleError> {
        Ok(password == self.0)
    }
}

/// Locks the vault from inside a lookup, so the security pass that calls it fails.
#[derive(Debug)]
pub struct LocksMidPass(pub Session);

#[async_trait]
impl BreachOracle for LocksMidPass {
    async fn is_known_breached(&self, _password: &str) -> Result<bool, OracleError> {
        self.0.close();
        Ok(true)
    }
}

pub struct Harness {
    pub dir: TempDir,
    pub storage: Storage,
    pub remote: MemoryRemote,
}

impl Harness {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = Storage::builder().root(dir.path()).connect().await.expect("storage");
        Self { dir, storage, remote: MemoryRemote::new() }
    }

    /// A manager over this harness' files, with the given analyzer and an optional remote.
    pub fn manager_with(&self, analyzer: SecurityAnalyzer, with_remote: bool) -> VaultManager {
        let persistence = DeviceSessionStore::with_device_secret(self.storage.clone(), DEVICE_SECRET)
            .expect("device store");
        let mut builder = VaultManager::builder()
            .analyzer(analyzer)
            .persistence(Arc::new(persistence))
            .kdf_iterations(MIN_ITERATIONS);
        if with_remote {
            builder = builder.remote(Arc::new(self.remote.clone()));
        }
        builder.storage(self.storage.clone()).build().expect("manager")
    }

    /// A manager sharing `session` with its collaborators, without a remote.
    pub fn manager_on(&self, session: Session, analyzer: SecurityAnalyzer) -> VaultManager {
        VaultManager::builder()
            .session(session)
            .analyzer(analyzer)
            .kdf_iterations(MIN_ITERATIONS)
            .storage(self.storage.clone())
            .build()
            .expect("manager")
    }

    pub fn manager(&self) -> VaultManager {
        self.manager_with(SecurityAnalyzer::default(), true)
    }

    /// An unlocked manager for `alice`.
    pub async fn unlocked(&self) -> VaultManager {
        let manager = self.manager();
        manager.unlock(tokens("alice"), MASTER).await.expect("unlock");
        manager
    }
}
