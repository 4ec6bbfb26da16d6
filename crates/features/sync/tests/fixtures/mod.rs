#![allow(dead_code)]

use ksafe_cipher::{Aes, Cipher, KeyManager, MIN_ITERATIONS};
use ksafe_domain::{AuthTokens, Credentials, RecordContent};
use ksafe_kernel::session::Session;
use ksafe_storage::Storage;
use ksafe_store::VaultStore;
use ksafe_sync::{MemoryRemote, Reconciler};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const USER: &str = "alice";

pub struct Device {
    pub dir: TempDir,
    pub session: Session,
    pub store: VaultStore,
    pub remote: MemoryRemote,
    pub reconciler: Reconciler,
}

impl Device {
    pub fn creds(&self) -> Credentials {
        self.session.credentials().expect("open session")
    }
}

fn cipher() -> Cipher {
    let key = KeyManager::new(MIN_ITERATIONS)
        .and_then(|m| m.derive_key("correct horse battery staple", USER.as_bytes()))
        .expect("key derivation");
    Cipher::<Aes>::builder().key(&key).build().expect("cipher")
}

/// A signed-in device with its own vault, talking to `remote`.
pub async fn device(remote: &MemoryRemote) -> Device {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = Storage::builder().root(dir.path()).connect().await.expect("storage root");
    let session = Session::new();
    session.open(AuthTokens::new(USER, "id-token", "refresh-token"), cipher());

    let store = VaultStore::new(storage, session.clone());
    let reconciler = Reconciler::new(store.clone(), Arc::new(remote.clone()))
        .with_request_timeout(Duration::from_secs(2));
    Device { dir, session, store, remote: remote.clone(), reconciler }
}

pub fn content(description: &str) -> RecordContent {
    RecordContent::new(description, USER, format!("https://{description}.test"), "Zk7#mQ2!vR9@")
}
