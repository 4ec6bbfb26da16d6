use crate::engine::{Cipher, CipherInner};
use crate::error::CipherError;
use crate::key::{KEY_LEN, VaultKey};
use crate::types::{Aes, CipherSuite};
use hkdf::Hkdf;
use private::Sealed;
use sha2::Sha256;
use std::marker::PhantomData;
use std::sync::Arc;
use zeroize::{Zeroize, ZeroizeOnDrop};

#[derive(Debug, Default, ZeroizeOnDrop)]
pub struct NoKey;
#[derive(Debug, Zeroize, ZeroizeOnDrop)]
pub struct WithKey {
    key: [u8; KEY_LEN],
}

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoKey {}
impl Sealed for WithKey {}

/// Builder for [`Cipher`]. Raw key material is wiped when the builder is consumed or dropped.
#[allow(private_bounds)]
#[derive(Debug, Zeroize, ZeroizeOnDrop)]
pub struct CipherBuilder<C: CipherSuite = Aes, K: Sealed + ZeroizeOnDrop = NoKey> {
    #[zeroize(skip)]
    _suite: PhantomData<C>,
    compression: bool,
    key: K,
}

impl<C: CipherSuite> Default for CipherBuilder<C> {
    fn default() -> Self {
        Self { _suite: PhantomData, compression: false, key: NoKey }
    }
}

impl<C: CipherSuite> CipherBuilder<C> {
    #[must_use = "Builder must be given a key before use"]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a key produced by [`crate::KeyManager::derive_key`].
    #[must_use]
    pub fn key(self, key: &VaultKey) -> CipherBuilder<C, WithKey> {
        CipherBuilder {
            _suite: PhantomData,
            compression: self.compression,
            key: WithKey { key: *key.expose() },
        }
    }

    /// Derives the key with HKDF-SHA256 from high-entropy input such as a device id.
    ///
    /// Not a password KDF: use [`crate::KeyManager`] for anything a human typed.
    ///
    /// # Errors
    /// Returns [`CipherError::KeyDerivation`] if HKDF expansion fails.
    pub fn derived_key(
        self,
        ikm: impl AsRef<[u8]>,
        salt: impl AsRef<[u8]>,
        info: impl AsRef<[u8]>,
    ) -> Result<CipherBuilder<C, WithKey>, CipherError> {
        let hk = Hkdf::<Sha256>::new(Some(salt.as_ref()), ikm.as_ref());
        let mut key = [0u8; KEY_LEN];
        hk.expand(info.as_ref(), &mut key)
            .map_err(|_| CipherError::derivation("HKDF expansion failed"))?;

        Ok(CipherBuilder { _suite: PhantomData, compression: self.compression, key: WithKey { key } })
    }
}

#[allow(private_bounds)]
impl<C: CipherSuite, K: Sealed + ZeroizeOnDrop> CipherBuilder<C, K> {
    /// Toggles LZ4 compression of large plaintexts before encryption.
    ///
    /// Compression leaks information through ciphertext length when an attacker controls part
    /// of the plaintext and can observe sizes. Keep it for local storage only.
    #[must_use]
    pub const fn compression(mut self, enabled: bool) -> Self {
        self.compression = enabled;
        self
    }
}

impl<C: CipherSuite> CipherBuilder<C, WithKey> {
    /// # Errors
    /// Returns [`CipherError::Internal`] if the suite rejects the key length.
    pub fn build(mut self) -> Result<Cipher<C>, CipherError> {
        let suite = C::new_from_slice(&self.key.key).map_err(|_| CipherError::Internal {
            message: format!("suite rejected a {KEY_LEN}-byte key").into(),
            context: None,
        })?;
        let compression = self.compression;
        self.zeroize();

        Ok(Cipher { inner: Arc::new(CipherInner { suite, compression }) })
    }
}
