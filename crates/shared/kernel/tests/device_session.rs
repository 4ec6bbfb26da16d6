use ksafe_domain::AuthTokens;
use ksafe_kernel::session::{DeviceSessionStore, SESSION_FILE, SessionPersistence};
use ksafe_storage::Storage;

async fn storage(root: &std::path::Path) -> Storage {
    Storage::builder().root(root).connect().await.expect("storage root")
}

#[tokio::test]
async fn tokens_survive_a_restart_on_the_same_device() {
    let dir = tempfile::tempdir().unwrap();
    let tokens = AuthTokens::new("user-7", "id-token", "refresh-token");

    let store = DeviceSessionStore::with_device_secret(storage(dir.path()).await, "device-a").unwrap();
    store.save(&tokens).await.unwrap();

    let reopened =
        DeviceSessionStore::with_device_secret(storage(dir.path()).await, "device-a").unwrap();
    assert_eq!(reopened.load().await.unwrap(), Some(tokens));
}

#[tokio::test]
async fn payload_from_another_device_loads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let root = storage(dir.path()).await;

    DeviceSessionStore::with_device_secret(root.clone(), "device-a")
        .unwrap()
        .save(&AuthTokens::new("u", "i", "r"))
        .await
        .unwrap();

    let elsewhere = DeviceSessionStore::with_device_secret(root, "device-b").unwrap();
    assert_eq!(elsewhere.load().await.unwrap(), None);
}

#[tokio::test]
async fn tampered_file_loads_as_none_and_clear_removes_it() {
    let dir = tempfile::tempdir().unwrap();
    let root = storage(dir.path()).await;
    let store = DeviceSessionStore::with_device_secret(root.clone(), "device-a").unwrap();
    store.save(&AuthTokens::new("u", "i", "r")).await.unwrap();

    let mut bytes = root.read(SESSION_FILE).await.unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;
    root.write(SESSION_FILE, &bytes).await.unwrap();
    assert_eq!(store.load().await.unwrap(), None);

    store.clear().await.unwrap();
    assert!(!root.exists(SESSION_FILE).unwrap());
    assert_eq!(store.load().await.unwrap(), None);
    store.clear().await.unwrap();
}

#[tokio::test]
async fn session_file_is_never_plaintext() {
    let dir = tempfile::tempdir().unwrap();
    let root = storage(dir.path()).await;
    let store = DeviceSessionStore::with_device_secret(root.clone(), "device-a").unwrap();
    store.save(&AuthTokens::new("user-7", "very-secret-id-token", "r")).await.unwrap();

    let raw = root.read(SESSION_FILE).await.unwrap();
    let needle = b"very-secret-id-token";
    assert!(!raw.windows(needle.len()).any(|w| w == needle));
}
