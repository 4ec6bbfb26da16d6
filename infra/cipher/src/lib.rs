//! Key derivation and authenticated field encryption for the vault.
//!
//! * [`KeyManager`] turns a master password and a per-user salt into a [`VaultKey`] with
//!   PBKDF2-HMAC-SHA256 and produces a one-way verifier for unlock checks.
//! * [`Cipher`] seals strings and `#[sealed_model]` structs with AES-256-GCM (default) or
//!   ChaCha20-Poly1305 under a random nonce per call.
//!
//! ## Nonce Policy
//!
//! Random 96-bit nonces are drawn for every seal. This is safe for the volumes a personal
//! vault produces; rotate keys if a single key ever seals billions of messages.
//!
//! ## Compression Threat Model
//!
//! LZ4 is applied before encryption, only when enabled and only for plaintexts of at least
//! 512 bytes. Ciphertext length then depends on content; keep it off for data an attacker
//! can both influence and observe.
//!
//! ## Example
//! ```rust
//! use ksafe_cipher::prelude::*;
//!
//! #[sealed_model(tag = "demo.profile.v1")]
//! struct Profile {
//!     id: String,
//!     token: String,
//! }
//!
//! # fn main() -> Result<(), CipherError> {
//! let cipher = Cipher::<Aes>::builder().derived_key("device-id", "salt", "profile")?.build()?;
//! let profile = Profile { id: "42".into(), token: "t0k3n".into() };
//!
//! let bytes = profile.seal(&cipher)?;
//! let restored = Profile::open(&cipher, &bytes)?;
//! assert_eq!(restored.token, "t0k3n");
//! # Ok(())
//! # }
//! ```

mod builder;
mod engine;
mod error;
mod key;
mod types;

pub use builder::CipherBuilder;
pub use engine::Cipher;
pub use error::{CipherError, CipherErrorExt};
pub use key::{DEFAULT_ITERATIONS, KEY_LEN, KeyManager, MIN_ITERATIONS, VaultKey};
pub use ksafe_derive::sealed_model;
pub use serde;
pub use types::{Aes, ChaCha, CipherSuite, SealedModel};

/// Method-call sugar over [`Cipher::seal_model`] / [`Cipher::open_model`].
pub trait SealExt: SealedModel {
    /// # Errors
    /// See [`Cipher::seal_model`].
    fn seal<C: CipherSuite>(&self, cipher: &Cipher<C>) -> Result<Vec<u8>, CipherError> {
        cipher.seal_model(self)
    }

    /// # Errors
    /// See [`Cipher::open_model`].
    fn open<C: CipherSuite>(cipher: &Cipher<C>, payload: &[u8]) -> Result<Self, CipherError> {
        cipher.open_model(payload)
    }
}

impl<T: SealedModel> SealExt for T {}

pub mod prelude {
    pub use crate::engine::Cipher;
    pub use crate::error::{CipherError, CipherErrorExt};
    pub use crate::key::{KeyManager, VaultKey};
    pub use crate::types::{Aes, ChaCha, CipherSuite, SealedModel};
    pub use crate::SealExt;
    pub use ksafe_derive::sealed_model;
}
