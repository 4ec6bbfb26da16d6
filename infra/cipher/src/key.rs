use crate::error::CipherError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::Hmac;
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Lowest PBKDF2 iteration count [`KeyManager`] accepts.
pub const MIN_ITERATIONS: u32 = 10_000;

/// Iteration count used by [`KeyManager::default`].
pub const DEFAULT_ITERATIONS: u32 = 210_000;

pub const KEY_LEN: usize = 32;

const VERIFIER_TAG: &[u8] = b"ksafe.verifier.v1";

/// A 256-bit symmetric key. Wiped on drop, redacted in `Debug`, never serializable.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct VaultKey([u8; KEY_LEN]);

impl VaultKey {
    /// Wraps raw key bytes, e.g. from HKDF or a test fixture.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub(crate) const fn expose(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VaultKey(<redacted>)")
    }
}

/// Derives vault keys from a master password using PBKDF2-HMAC-SHA256.
///
/// The salt binds the key to an account (the remote user id bytes), so the same master
/// password yields unrelated keys for different users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyManager {
    iterations: u32,
}

impl Default for KeyManager {
    fn default() -> Self {
        Self { iterations: DEFAULT_ITERATIONS }
    }
}

impl KeyManager {
    /// # Errors
    /// [`CipherError::KeyDerivation`] when `iterations` is below [`MIN_ITERATIONS`].
    pub fn new(iterations: u32) -> Result<Self, CipherError> {
        if iterations < MIN_ITERATIONS {
            return Err(CipherError::KeyDerivation {
                message: format!("{iterations} iterations is below the minimum of {MIN_ITERATIONS}")
                    .into(),
                context: None,
            });
        }
        Ok(Self { iterations })
    }

    #[must_use]
    pub const fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Derives the vault key. Same `(master_password, salt)` always yields the same key.
    ///
    /// # Errors
    /// [`CipherError::KeyDerivation`] for an empty password or salt, or if PBKDF2 fails.
    pub fn derive_key(&self, master_password: &str, salt: &[u8]) -> Result<VaultKey, CipherError> {
        if master_password.is_empty() {
            return Err(CipherError::derivation("master password is empty"));
        }
        if salt.is_empty() {
            return Err(CipherError::derivation("salt is empty"));
        }

        let mut out = [0u8; KEY_LEN];
        pbkdf2::pbkdf2::<Hmac<Sha256>>(master_password.as_bytes(), salt, self.iterations, &mut out)
            .map_err(|e| CipherError::KeyDerivation {
                message: e.to_string().into(),
                context: Some("PBKDF2-HMAC-SHA256".into()),
            })?;

        let key = VaultKey::from_bytes(out);
        out.zeroize();
        Ok(key)
    }

    /// One-way verifier for a master password.
    ///
    /// `base64(SHA-256(tag || derived_key))`: deterministic, distinct per password and salt,
    /// and not usable as the encryption key itself.
    ///
    /// # Errors
    /// Same as [`KeyManager::derive_key`].
    pub fn hash(&self, master_password: &str, salt: &[u8]) -> Result<String, CipherError> {
        let key = self.derive_key(master_password, salt)?;
        Ok(Self::verifier(&key))
    }

    /// The [`KeyManager::hash`] of an already derived key, sparing a second PBKDF2 run.
    #[must_use]
    pub fn verifier(key: &VaultKey) -> String {
        let mut hasher = Sha256::new();
        hasher.update(VERIFIER_TAG);
        hasher.update(key.expose());
        STANDARD.encode(hasher.finalize())
    }

    /// Constant-time check of a derived key against a stored verifier.
    #[must_use]
    pub fn matches(key: &VaultKey, expected: &str) -> bool {
        constant_time_eq(Self::verifier(key).as_bytes(), expected.as_bytes())
    }

    /// Checks a master password against a stored [`KeyManager::hash`] in constant time.
    ///
    /// # Errors
    /// Same as [`KeyManager::derive_key`].
    pub fn verify(
        &self,
        master_password: &str,
        salt: &[u8],
        expected: &str,
    ) -> Result<bool, CipherError> {
        let actual = self.hash(master_password, salt)?;
        Ok(constant_time_eq(actual.as_bytes(), expected.as_bytes()))
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> KeyManager {
        KeyManager::new(MIN_ITERATIONS).unwrap()
    }

    #[test]
    fn derivation_is_deterministic() {
        let a = manager().derive_key("correct horse", b"user-42").unwrap();
        let b = manager().derive_key("correct horse", b"user-42").unwrap();
        assert_eq!(a.expose(), b.expose());
    }

    #[test]
    fn different_passwords_or_salts_give_different_keys() {
        let base = manager().derive_key("correct horse", b"user-42").unwrap();
        let other_pw = manager().derive_key("battery staple", b"user-42").unwrap();
        let other_salt = manager().derive_key("correct horse", b"user-43").unwrap();

        assert_ne!(base.expose(), other_pw.expose());
        assert_ne!(base.expose(), other_salt.expose());
    }

    #[test]
    fn hash_is_deterministic_and_not_the_key() {
        let m = manager();
        let h1 = m.hash("correct horse", b"user-42").unwrap();
        let h2 = m.hash("correct horse", b"user-42").unwrap();
        let key = m.derive_key("correct horse", b"user-42").unwrap();

        assert_eq!(h1, h2);
        assert_ne!(h1, STANDARD.encode(key.expose()));
        assert_ne!(h1, m.hash("correct horse", b"user-99").unwrap());
        assert_ne!(h1, m.hash("wrong horse", b"user-42").unwrap());
    }

    #[test]
    fn verify_accepts_only_the_right_password() {
        let m = manager();
        let stored = m.hash("s3cret!", b"salt").unwrap();
        assert!(m.verify("s3cret!", b"salt", &stored).unwrap());
        assert!(!m.verify("s3cret?", b"salt", &stored).unwrap());
        assert!(!m.verify("s3cret!", b"salt", "").unwrap());
    }

    #[test]
    fn verifier_of_derived_key_matches_hash() {
        let m = manager();
        let key = m.derive_key("s3cret!", b"salt").unwrap();
        let stored = m.hash("s3cret!", b"salt").unwrap();
        assert_eq!(KeyManager::verifier(&key), stored);
        assert!(KeyManager::matches(&key, &stored));
        assert!(!KeyManager::matches(&key, "AAAA"));
    }

    #[test]
    fn rejects_weak_parameters() {
        assert!(matches!(KeyManager::new(1_000), Err(CipherError::KeyDerivation { .. })));
        assert!(matches!(manager().derive_key("", b"salt"), Err(CipherError::KeyDerivation { .. })));
        assert!(matches!(manager().derive_key("pw", b""), Err(CipherError::KeyDerivation { .. })));
    }

    #[test]
    fn debug_never_prints_key_bytes() {
        let key = VaultKey::from_bytes([0xAB; KEY_LEN]);
        assert_eq!(format!("{key:?}"), "VaultKey(<redacted>)");
    }
}
