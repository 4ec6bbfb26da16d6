mod fixtures;

use fixtures::{content, hours_ago, remote, unlocked};
use ksafe_kernel::session::account_namespace;
use ksafe_domain::{AuthTokens, LocalId, RecordContent, RemoteId, SecurityFlags};
use ksafe_store::{StoreError, VAULT_FILE};

#[tokio::test]
async fn create_assigns_fresh_ids_that_survive_restart() {
    let vault = unlocked().await;
    let a = vault.store.create(content("mail", "pw-a")).await.unwrap();
    let b = vault.store.create(content("bank", "pw-b")).await.unwrap();
    assert_ne!(a, b);

    let reopened = vault.reopen().await;
    let records = reopened.read_all_decrypted().await.unwrap();
    assert_eq!(records.iter().map(|r| r.local_id).collect::<Vec<_>>(), vec![a, b]);
    assert!(records.iter().all(|r| !r.synced && r.remote_id.is_none()));

    let c = reopened.create(content("shop", "pw-c")).await.unwrap();
    assert!(c > b, "ids are never reused after restart");
}

#[tokio::test]
async fn identical_tuple_is_rejected_but_any_difference_is_accepted() {
    let vault = unlocked().await;
    let base = RecordContent::new("Mail", "alice", "https://mail.test", "pw");
    vault.store.create(base.clone()).await.unwrap();

    let err = vault.store.create(base.clone()).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateRejected { .. }));

    for variant in [
        RecordContent { description: "Mail 2".into(), ..base.clone() },
        RecordContent { username: "bob".into(), ..base.clone() },
        RecordContent { url: "https://mail.test/".into(), ..base.clone() },
        RecordContent { password: "pw2".into(), ..base.clone() },
    ] {
        vault.store.create(variant).await.expect("differing tuple is accepted");
    }
    assert_eq!(vault.store.read_all().await.unwrap().len(), 5);
}

#[tokio::test]
async fn empty_mandatory_fields_are_rejected() {
    let vault = unlocked().await;
    for bad in [content("", "pw"), content("mail", "")] {
        let err = vault.store.create(bad).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation { .. }));
    }
    let optional_empty = RecordContent::new("note", "", "", "pw");
    vault.store.create(optional_empty).await.unwrap();
}

#[tokio::test]
async fn whitespace_password_is_a_real_password() {
    let vault = unlocked().await;
    let id = vault.store.create(RecordContent::new("wifi", "", "", "    ")).await.unwrap();

    let stored = vault.store.get(id).await.unwrap().expect("stored record");
    assert_eq!(stored.content.password, "    ");
}

#[tokio::test]
async fn locked_session_refuses_every_operation() {
    let vault = unlocked().await;
    vault.store.create(content("mail", "pw")).await.unwrap();
    vault.session.close();

    assert!(matches!(vault.store.read_all().await, Err(StoreError::Locked { .. })));
    assert!(matches!(vault.store.create(content("x", "y")).await, Err(StoreError::Locked { .. })));
    assert!(matches!(vault.store.delete(LocalId::new(1)).await, Err(StoreError::Locked { .. })));
}

#[tokio::test]
async fn update_reports_no_op_and_marks_changes_unsynced() {
    let vault = unlocked().await;
    let id = vault.store.create(content("mail", "pw")).await.unwrap();
    let mut record = vault.store.get(id).await.unwrap().unwrap();

    record.remote_id = Some(RemoteId::from("r-1"));
    record.synced = true;
    assert!(vault.store.update_by_remote_id(&record).await.unwrap());
    vault.store.write_flags(&[(id, SecurityFlags::WEAK)]).await.unwrap();
    let before = vault.store.get(id).await.unwrap().unwrap();

    assert!(!vault.store.update(&before).await.unwrap(), "unchanged content is a no-op");

    let mut edited = before.clone();
    edited.content.password = "longer and stronger".into();
    assert!(vault.store.update(&edited).await.unwrap());

    let after = vault.store.get(id).await.unwrap().unwrap();
    assert_eq!(after.content.password, "longer and stronger");
    assert!(!after.synced);
    assert!(after.last_modified >= before.last_modified);
    assert_eq!(after.remote_id, Some(RemoteId::from("r-1")));
    assert_eq!(after.flags, SecurityFlags::WEAK);

    let mut ghost = after.clone();
    ghost.local_id = LocalId::new(999);
    ghost.content.description = "ghost".into();
    assert!(!vault.store.update(&ghost).await.unwrap());
}

#[tokio::test]
async fn update_cannot_collide_with_another_record() {
    let vault = unlocked().await;
    vault.store.create(content("mail", "pw")).await.unwrap();
    let id = vault.store.create(content("bank", "pw")).await.unwrap();

    let mut record = vault.store.get(id).await.unwrap().unwrap();
    record.content = content("mail", "pw");
    let err = vault.store.update(&record).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateRejected { .. }));
}

#[tokio::test]
async fn update_by_remote_id_falls_back_to_local_id_and_sets_remote_id_once() {
    let vault = unlocked().await;
    let id = vault.store.create(content("mail", "pw")).await.unwrap();
    let mut record = vault.store.get(id).await.unwrap().unwrap();

    record.remote_id = Some(RemoteId::from("r-1"));
    record.synced = true;
    assert!(vault.store.update_by_remote_id(&record).await.unwrap());
    assert!(!vault.store.update_by_remote_id(&record).await.unwrap(), "nothing changed");

    record.remote_id = Some(RemoteId::from("r-2"));
    record.synced = false;
    assert!(vault.store.update_by_remote_id(&record).await.unwrap());
    let stored = vault.store.get(id).await.unwrap().unwrap();
    assert_eq!(stored.remote_id, Some(RemoteId::from("r-1")), "remote id is set at most once");
    assert!(!stored.synced);

    let mut unknown = stored.clone();
    unknown.local_id = LocalId::new(77);
    unknown.remote_id = Some(RemoteId::from("nope"));
    assert!(!vault.store.update_by_remote_id(&unknown).await.unwrap());
}

#[tokio::test]
async fn deleting_an_uploaded_record_leaves_a_tombstone() {
    let vault = unlocked().await;
    let local_only = vault.store.create(content("mail", "pw")).await.unwrap();
    let sealed = vault.store.seal(&remote("r-9", content("bank", "pw"), hours_ago(1))).unwrap();
    let uploaded = vault.store.create_from_remote(sealed).await.unwrap();

    assert!(vault.store.delete(local_only).await.unwrap());
    assert!(vault.store.tombstones().all_deleted_ids().await.unwrap().is_empty());

    assert!(vault.store.delete(uploaded).await.unwrap());
    assert!(!vault.store.delete(uploaded).await.unwrap());
    assert_eq!(
        vault.store.tombstones().all_deleted_ids().await.unwrap(),
        vec![RemoteId::from("r-9")]
    );
    assert!(vault.store.read_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn clean_keeps_the_newest_duplicate_and_is_idempotent() {
    let vault = unlocked().await;
    let newer = vault.store.create(content("mail", "pw")).await.unwrap();
    let older_sealed =
        vault.store.seal(&remote("r-old", content("mail", "pw"), hours_ago(5))).unwrap();
    let older = vault.store.create_from_remote(older_sealed).await.unwrap();
    vault.store.create(content("bank", "other")).await.unwrap();

    let duplicates = vault.store.find_content_duplicates().await.unwrap();
    assert_eq!(duplicates.iter().map(|r| r.local_id).collect::<Vec<_>>(), vec![newer, older]);

    assert_eq!(vault.store.clean_content_duplicates().await.unwrap(), 1);
    assert!(vault.store.get(older).await.unwrap().is_none());
    assert!(vault.store.get(newer).await.unwrap().is_some());
    assert!(vault.store.tombstones().was_deleted(&RemoteId::from("r-old")).await.unwrap());

    assert_eq!(vault.store.clean_content_duplicates().await.unwrap(), 0);
    assert!(vault.store.find_content_duplicates().await.unwrap().is_empty());
}

#[tokio::test]
async fn clean_breaks_timestamp_ties_by_highest_local_id() {
    let vault = unlocked().await;
    let at = hours_ago(2);
    let a = vault.store.seal(&remote("a", content("mail", "pw"), at)).unwrap();
    let b = vault.store.seal(&remote("b", content("mail", "pw"), at)).unwrap();
    let first = vault.store.create_from_remote(a).await.unwrap();
    let second = vault.store.create_from_remote(b).await.unwrap();

    assert_eq!(vault.store.clean_content_duplicates().await.unwrap(), 1);
    assert!(vault.store.get(first).await.unwrap().is_none());
    assert!(vault.store.get(second).await.unwrap().is_some());
}

#[tokio::test]
async fn flags_never_touch_sync_state_or_timestamps() {
    let vault = unlocked().await;
    let id = vault.store.create(content("mail", "pw")).await.unwrap();
    let before = vault.store.get(id).await.unwrap().unwrap();

    let flags = SecurityFlags::WEAK | SecurityFlags::COMPROMISED;
    let updates = [(id, flags), (LocalId::new(404), SecurityFlags::all())];
    let written = vault.store.write_flags(&updates).await.unwrap();
    assert_eq!(written, 1);

    let after = vault.store.get(id).await.unwrap().unwrap();
    assert_eq!(after.flags, flags);
    assert_eq!(after.synced, before.synced);
    assert_eq!(after.last_modified, before.last_modified);

    assert_eq!(vault.store.write_flags(&[(id, flags)]).await.unwrap(), 0);
}

#[tokio::test]
async fn clear_wipes_records_and_tombstones_but_not_the_id_counter() {
    let vault = unlocked().await;
    vault.store.create(content("mail", "pw")).await.unwrap();
    let sealed = vault.store.seal(&remote("r", content("bank", "pw"), hours_ago(1))).unwrap();
    let uploaded = vault.store.create_from_remote(sealed).await.unwrap();
    vault.store.delete(uploaded).await.unwrap();

    assert_eq!(vault.store.clear().await.unwrap(), 1);
    assert!(vault.store.read_all().await.unwrap().is_empty());
    assert!(vault.store.tombstones().all_deleted_ids().await.unwrap().is_empty());

    let fresh = vault.store.create(content("mail", "pw")).await.unwrap();
    assert!(fresh > uploaded);
}

#[tokio::test]
async fn vault_file_holds_no_plaintext() {
    let vault = unlocked().await;
    let secret = RecordContent::new("Mail", "alice", "https://mail.test", "Sup3r-S3cret!");
    vault.store.create(secret).await.unwrap();

    let raw = vault.storage.namespace(account_namespace("alice")).unwrap().read(VAULT_FILE).await.unwrap();
    for needle in ["Sup3r-S3cret!", "https://mail.test"] {
        assert!(!raw.windows(needle.len()).any(|w| w == needle.as_bytes()), "{needle} leaked");
    }
}

#[tokio::test]
async fn accounts_do_not_see_each_other() {
    let vault = unlocked().await;
    vault.store.create(content("mail", "pw")).await.unwrap();

    vault.session.open(AuthTokens::new("bob", "id", "refresh"), fixtures::cipher_for("bob"));
    assert!(vault.store.read_all().await.unwrap().is_empty());
    vault.store.create(content("mail", "pw")).await.expect("a separate vault per account");
}
