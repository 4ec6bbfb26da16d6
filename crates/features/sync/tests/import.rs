mod fixtures;

use fixtures::{USER, content, device};
use ksafe_sync::{ImportReport, MemoryRemote, RemoteVault, SyncError};

#[tokio::test]
async fn imports_records_from_other_devices() {
    let remote = MemoryRemote::new();
    let laptop = device(&remote).await;
    let phone = device(&remote).await;

    laptop.store.create(content("mail")).await.unwrap();
    laptop.reconciler.upload_unsynced().await.unwrap();

    let report = phone.reconciler.import_remote().await.unwrap();
    assert_eq!(report, ImportReport { imported: 1, skipped: 0, suppressed: 0 });

    let records = phone.store.read_all_decrypted().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].content, content("mail"));
    assert!(records[0].synced);

    let again = phone.reconciler.import_remote().await.unwrap();
    assert_eq!(again, ImportReport { imported: 0, skipped: 1, suppressed: 0 });
}

#[tokio::test]
async fn import_honors_tombstones() {
    let remote = MemoryRemote::new();
    let dev = device(&remote).await;
    remote.insert(USER, content("mail"));
    remote.insert(USER, content("old-forum"));

    dev.reconciler.import_remote().await.unwrap();
    let forum = dev
        .store
        .read_all_decrypted()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.content.description == "old-forum")
        .unwrap();
    assert!(dev.store.delete(forum.local_id).await.unwrap());

    let report = dev.reconciler.import_remote().await.unwrap();
    assert_eq!(report, ImportReport { imported: 0, skipped: 1, suppressed: 1 });
    assert_eq!(dev.store.read_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn fetch_failure_is_a_remote_error() {
    let remote = MemoryRemote::new();
    let dev = device(&remote).await;
    remote.set_offline(true);

    let result = dev.reconciler.import_remote().await;
    assert!(matches!(result, Err(SyncError::Remote { .. })));
}

#[tokio::test]
async fn deletions_are_pushed_and_forgotten() {
    let remote = MemoryRemote::new();
    let dev = device(&remote).await;
    let mail = dev.store.create(content("mail")).await.unwrap();
    let bank = dev.store.create(content("bank")).await.unwrap();
    dev.reconciler.upload_unsynced().await.unwrap();

    let bank_remote = dev.store.get(bank).await.unwrap().unwrap().remote_id.unwrap();
    dev.store.delete(mail).await.unwrap();
    dev.store.delete(bank).await.unwrap();
    // Already gone remotely; still counts as deleted.
    remote.delete_record(&dev.creds(), &bank_remote).await.unwrap();

    remote.set_offline(true);
    let offline = dev.reconciler.push_deletions().await.unwrap();
    assert_eq!((offline.deleted, offline.failed), (0, 2));
    assert_eq!(dev.store.tombstones().all_deleted_ids().await.unwrap().len(), 2);

    remote.clear_faults();
    let online = dev.reconciler.push_deletions().await.unwrap();
    assert_eq!((online.deleted, online.failed), (2, 0));
    assert!(dev.store.tombstones().all_deleted_ids().await.unwrap().is_empty());
    assert!(remote.records(USER).is_empty());
}

#[tokio::test]
async fn full_sync_round_trip() {
    let remote = MemoryRemote::new();
    let laptop = device(&remote).await;
    let phone = device(&remote).await;

    laptop.store.create(content("mail")).await.unwrap();
    phone.store.create(content("bank")).await.unwrap();

    let first = laptop.reconciler.full_sync().await.unwrap();
    assert_eq!(first.upload.uploaded, 1);
    assert!(!first.changed());

    let second = phone.reconciler.full_sync().await.unwrap();
    assert_eq!(second.import.imported, 1);
    assert_eq!(second.upload.uploaded, 1);
    assert!(second.changed());

    let third = laptop.reconciler.full_sync().await.unwrap();
    assert_eq!(third.import.imported, 1);
    assert_eq!(laptop.store.read_all().await.unwrap().len(), 2);
    assert_eq!(remote.records(USER).len(), 2);
}
