use aead::consts::{U12, U16};
use aead::{AeadInPlace, KeyInit};
use aes_gcm::Aes256Gcm;
use chacha20poly1305::ChaCha20Poly1305;
use serde::Serialize;
use serde::de::DeserializeOwned;

// --- Aliases ---

pub type Aes = Aes256Gcm;
pub type ChaCha = ChaCha20Poly1305;

/// AEAD suites usable by [`crate::Cipher`]: 96-bit nonce, 128-bit tag.
pub trait CipherSuite:
    AeadInPlace<NonceSize = U12, TagSize = U16> + KeyInit + Send + Sync + 'static
{
}
impl<T> CipherSuite for T where
    T: AeadInPlace<NonceSize = U12, TagSize = U16> + KeyInit + Send + Sync + 'static
{
}

// --- Payload format constants ---

/// Payload header version.
pub(crate) const PAYLOAD_VERSION_V1: u8 = 1;

/// Header layout: `[version: u8][flags: u8]`
pub(crate) const HEADER_LEN: usize = 2;

pub(crate) const NONCE_LEN: usize = 12;

pub(crate) const TAG_LEN: usize = 16;

/// Flag bit: plaintext was LZ4-compressed before encryption.
pub(crate) const FLAG_COMPRESSED: u8 = 1 << 0;

/// Plaintexts shorter than this are never compressed; short fields gain nothing from LZ4.
pub(crate) const COMPRESSION_THRESHOLD: usize = 512;

/// Associated data for string fields sealed through [`crate::Cipher::encrypt`].
pub(crate) const FIELD_CONTEXT: &[u8] = b"ksafe.field.v1";

// --- Models ---

/// A serializable type with a stable tag that is bound into its ciphertext.
///
/// Implemented by `#[sealed_model]`; manual impls are fine for types that already derive serde.
pub trait SealedModel: Serialize + DeserializeOwned {
    const TAG: &'static str;
}
