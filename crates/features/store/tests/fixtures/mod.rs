#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use ksafe_cipher::{Aes, Cipher, KeyManager, MIN_ITERATIONS};
use ksafe_domain::{AuthTokens, RecordContent, RemoteId, RemoteRecord};
use ksafe_kernel::session::Session;
use ksafe_storage::Storage;
use ksafe_store::VaultStore;
use std::path::Path;
use tempfile::TempDir;

pub const MASTER: &str = "correct horse battery staple";

pub struct TestVault {
    pub dir: TempDir,
    pub storage: Storage,
    pub session: Session,
    pub store: VaultStore,
}

impl TestVault {
    /// A second store over the same files, as after a restart.
    pub async fn reopen(&self) -> VaultStore {
        let storage = storage(self.dir.path()).await;
        let session = Session::new();
        session.open(AuthTokens::new("alice", "id", "refresh"), cipher_for("alice"));
        VaultStore::new(storage, session)
    }
}

pub async fn storage(root: &Path) -> Storage {
    Storage::builder().root(root).connect().await.expect("storage root")
}

pub fn cipher_for(user: &str) -> Cipher {
    let key = KeyManager::new(MIN_ITERATIONS)
        .and_then(|m| m.derive_key(MASTER, user.as_bytes()))
        .expect("key derivation");
    Cipher::<Aes>::builder().key(&key).build().expect("cipher")
}

/// An unlocked store for `alice` over a fresh temp root.
pub async fn unlocked() -> TestVault {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = storage(dir.path()).await;
    let session = Session::new();
    session.open(AuthTokens::new("alice", "id", "refresh"), cipher_for("alice"));
    let store = VaultStore::new(storage.clone(), session.clone());
    TestVault { dir, storage, session, store }
}

pub fn content(description: &str, password: &str) -> RecordContent {
    RecordContent::new(description, "alice", format!("https://{description}.test"), password)
}

pub fn remote(id: &str, content: RecordContent, last_modified: DateTime<Utc>) -> RemoteRecord {
    RemoteRecord { remote_id: RemoteId::from(id), content, last_modified }
}

pub fn hours_ago(hours: i64) -> DateTime<Utc> {
    Utc::now() - Duration::hours(hours)
}
