mod fixtures;

use fixtures::{Harness, STRONG, content};
use ksafe::ManagerError;
use ksafe::analyzer::SecurityAnalyzer;

#[tokio::test]
async fn sync_requires_a_remote() {
    let harness = Harness::new().await;
    let manager = harness.manager_with(SecurityAnalyzer::default(), false);
    manager.unlock(fixtures::tokens("alice"), fixtures::MASTER).await.unwrap();

    assert!(!manager.sync_available());
    assert!(matches!(manager.sync().await, Err(ManagerError::SyncUnavailable { .. })));
}

#[tokio::test]
async fn sync_uploads_and_imports() {
    let harness = Harness::new().await;
    let manager = harness.unlocked().await;
    manager.save(content("mail", STRONG)).await.unwrap();
    harness.remote.insert("alice", content("bank", "password"));

    let report = manager.sync().await.unwrap();
    assert_eq!(report.import.imported, 1);
    assert_eq!(report.upload.uploaded, 1);

    let records = manager.get_all().await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.synced));
    let imported = records.iter().find(|r| r.content.description == "bank").unwrap();
    assert!(imported.flags.weak(), "imports trigger a security pass");
}

#[tokio::test]
async fn offline_remote_is_a_network_error() {
    let harness = Harness::new().await;
    let manager = harness.unlocked().await;
    harness.remote.set_offline(true);

    assert!(matches!(manager.sync().await, Err(ManagerError::Network { .. })));
}

#[tokio::test]
async fn imported_duplicates_can_be_cleaned() {
    let harness = Harness::new().await;
    let manager = harness.unlocked().await;
    harness.remote.insert("alice", content("mail", STRONG));
    harness.remote.insert("alice", content("mail", STRONG));

    manager.sync().await.unwrap();
    assert_eq!(manager.find_duplicates().await.unwrap().len(), 2);

    assert_eq!(manager.clean_duplicates().await.unwrap(), 1);
    assert_eq!(manager.clean_duplicates().await.unwrap(), 0);
    assert!(manager.find_duplicates().await.unwrap().is_empty());
    assert_eq!(manager.get_all().await.unwrap().len(), 1);
}
