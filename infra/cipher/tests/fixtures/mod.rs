use ksafe_cipher::prelude::*;

#[sealed_model(tag = "ksafe.test.credentials")]
#[derive(Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    pub user_id: String,
    pub refresh_token: String,
}

#[sealed_model(tag = "ksafe.test.other")]
#[derive(Clone, PartialEq, Eq)]
pub struct OtherModel {
    pub user_id: String,
    pub refresh_token: String,
}

pub const ITERATIONS: u32 = ksafe_cipher::MIN_ITERATIONS;

/// Cipher keyed from a master password the way an unlocked session is.
///
/// # Panics
/// If key derivation or cipher construction fails.
#[must_use]
pub fn unlocked(master_password: &str, user_id: &str) -> Cipher {
    let key = KeyManager::new(ITERATIONS)
        .and_then(|m| m.derive_key(master_password, user_id.as_bytes()))
        .expect("key derivation");
    Cipher::builder().key(&key).compression(true).build().expect("cipher setup")
}
