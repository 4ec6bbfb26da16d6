mod fixtures;

use fixtures::{Harness, MASTER, STRONG, content, tokens};
use ksafe::kernel::session::account_namespace;
use ksafe::{ManagerError, VERIFIER_FILE};

#[tokio::test]
async fn first_unlock_sets_the_master_password() {
    let harness = Harness::new().await;
    let manager = harness.manager();
    assert!(!manager.is_unlocked());

    manager.unlock(tokens("alice"), MASTER).await.unwrap();
    assert!(manager.is_unlocked());
    assert!(harness.storage.namespace(account_namespace("alice")).unwrap().exists(VERIFIER_FILE).unwrap());

    manager.lock().await.unwrap();
    let wrong = manager.unlock(tokens("alice"), "not it").await;
    assert!(matches!(wrong, Err(ManagerError::WrongMasterPassword { .. })));
    assert!(!manager.is_unlocked());

    manager.unlock(tokens("alice"), MASTER).await.unwrap();
    assert!(manager.is_unlocked());
}

#[tokio::test]
async fn each_account_has_its_own_master_password() {
    let harness = Harness::new().await;
    let manager = harness.manager();

    manager.unlock(tokens("alice"), MASTER).await.unwrap();
    manager.save(content("mail", STRONG)).await.unwrap();
    manager.lock().await.unwrap();

    manager.unlock(tokens("carol"), "another master password").await.unwrap();
    assert!(manager.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn locked_vault_refuses_operations() {
    let harness = Harness::new().await;
    let manager = harness.unlocked().await;
    assert!(manager.lock().await.unwrap());
    assert!(!manager.lock().await.unwrap());

    assert!(matches!(manager.get_all().await, Err(ManagerError::Locked { .. })));
    assert!(matches!(manager.save(content("mail", STRONG)).await, Err(ManagerError::Locked { .. })));
}

#[tokio::test]
async fn empty_master_password_is_a_crypto_error() {
    let harness = Harness::new().await;
    let result = harness.manager().unlock(tokens("alice"), "").await;
    assert!(matches!(result, Err(ManagerError::Crypto { .. })));
}

#[tokio::test]
async fn session_is_remembered_until_logout() {
    let harness = Harness::new().await;
    let manager = harness.unlocked().await;
    manager.lock().await.unwrap();

    let restarted = harness.manager();
    let restored = restarted.restore_session().await.unwrap().expect("remembered session");
    assert_eq!(restored, tokens("alice"));

    restarted.unlock(restored, MASTER).await.unwrap();
    restarted.logout().await.unwrap();
    assert!(!restarted.is_unlocked());
    assert!(harness.manager().restore_session().await.unwrap().is_none());
}

#[tokio::test]
async fn identity_provider_ids_unlock_their_own_vaults() {
    let harness = Harness::new().await;
    let manager = harness.manager();

    for user in ["auth0|5f7c1a2b", "alice@example.com", "google-oauth2.1234"] {
        manager.unlock(tokens(user), MASTER).await.unwrap();
        manager.save(content(user, STRONG)).await.unwrap();
        let records = manager.get_all().await.unwrap();
        assert_eq!(records.len(), 1, "{user} sees only its own record");
        assert_eq!(records[0].content.description, user);
        assert!(harness.storage.namespace(account_namespace(user)).unwrap().exists(VERIFIER_FILE).unwrap());
        manager.lock().await.unwrap();
    }

    let wrong = manager.unlock(tokens("auth0|5f7c1a2b"), "not it").await;
    assert!(matches!(wrong, Err(ManagerError::WrongMasterPassword { .. })));
}
