use aead::{Nonce, Tag};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use getrandom::fill;
use std::fmt;
use std::sync::Arc;

use crate::builder::CipherBuilder;
use crate::error::{CipherError, CipherErrorExt};
use crate::types::{
    Aes, COMPRESSION_THRESHOLD, CipherSuite, FIELD_CONTEXT, FLAG_COMPRESSED, HEADER_LEN, NONCE_LEN,
    PAYLOAD_VERSION_V1, SealedModel, TAG_LEN,
};

pub(crate) struct CipherInner<C: CipherSuite> {
    pub(crate) suite: C,
    pub(crate) compression: bool,
}

/// Authenticated encryption of vault fields and sealed models.
///
/// Every call draws a fresh random 96-bit nonce, so sealing the same plaintext twice yields
/// different payloads. Payload layout:
///
/// ```text
/// [V(1)][FLAGS(1)][NONCE(12)][CIPHERTEXT(N)][TAG(16)]
/// ```
///
/// The two header bytes are authenticated together with the caller's context bytes.
/// Cloning is cheap; clones share the key schedule.
///
/// ```rust
/// use ksafe_cipher::prelude::*;
///
/// # fn main() -> Result<(), CipherError> {
/// let key = KeyManager::new(10_000)?.derive_key("master password", b"user-1")?;
/// let cipher = Cipher::<Aes>::builder().key(&key).build()?;
///
/// let sealed = cipher.encrypt("hunter2")?;
/// assert_ne!(sealed, cipher.encrypt("hunter2")?);
/// assert_eq!(cipher.decrypt(&sealed)?, "hunter2");
/// # Ok(())
/// # }
/// ```
pub struct Cipher<C: CipherSuite = Aes> {
    pub(crate) inner: Arc<CipherInner<C>>,
}

impl<C: CipherSuite> Clone for Cipher<C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<C: CipherSuite> fmt::Debug for Cipher<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cipher").field("compression", &self.inner.compression).finish_non_exhaustive()
    }
}

impl<C: CipherSuite> Cipher<C> {
    #[must_use]
    pub fn builder() -> CipherBuilder<C> {
        CipherBuilder::<C>::new()
    }

    fn next_nonce() -> Result<Nonce<C>, CipherError> {
        let mut nonce = Nonce::<C>::default();
        fill(&mut nonce).map_err(|e| CipherError::Encryption {
            message: e.to_string().into(),
            context: Some("system RNG unavailable for nonce generation".into()),
        })?;
        Ok(nonce)
    }

    /// Encrypts a string field to base64 text.
    ///
    /// # Errors
    /// [`CipherError::Encryption`] if the RNG or the AEAD fails.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let payload = self.seal_bytes(plaintext.as_bytes(), FIELD_CONTEXT)?;
        Ok(STANDARD.encode(payload))
    }

    /// [`Cipher::encrypt`] with `None` passed through untouched.
    ///
    /// # Errors
    /// Same as [`Cipher::encrypt`].
    pub fn encrypt_opt(&self, plaintext: Option<&str>) -> Result<Option<String>, CipherError> {
        plaintext.map(|p| self.encrypt(p)).transpose()
    }

    /// Decrypts text produced by [`Cipher::encrypt`].
    ///
    /// # Errors
    /// * [`CipherError::Decryption`] for a wrong key, tampering, truncation, invalid base64 or
    ///   a plaintext that is not UTF-8.
    /// * [`CipherError::InvalidPayload`] for an unknown payload version.
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
        let payload = STANDARD
            .decode(ciphertext)
            .map_err(|e| CipherError::Decryption { message: e.to_string().into(), context: Some("base64".into()) })?;
        let bytes = self.open_bytes(&payload, FIELD_CONTEXT)?;
        String::from_utf8(bytes).map_err(|_| CipherError::decryption("plaintext is not valid UTF-8"))
    }

    /// [`Cipher::decrypt`] with `None` passed through untouched.
    ///
    /// # Errors
    /// Same as [`Cipher::decrypt`].
    pub fn decrypt_opt(&self, ciphertext: Option<&str>) -> Result<Option<String>, CipherError> {
        ciphertext.map(|c| self.decrypt(c)).transpose()
    }

    /// Serializes a model with postcard and seals it under its [`SealedModel::TAG`].
    ///
    /// # Errors
    /// [`CipherError::Serialization`] or [`CipherError::Encryption`].
    pub fn seal_model<T: SealedModel>(&self, value: &T) -> Result<Vec<u8>, CipherError> {
        let bytes = postcard::to_stdvec(value).context("postcard encoding failed")?;
        self.seal_bytes(&bytes, T::TAG.as_bytes())
    }

    /// Opens a payload produced by [`Cipher::seal_model`] for the same `T`.
    ///
    /// # Errors
    /// [`CipherError::Decryption`] if the key or tag differs, [`CipherError::Serialization`] if
    /// the plaintext does not decode as `T`.
    pub fn open_model<T: SealedModel>(&self, payload: &[u8]) -> Result<T, CipherError> {
        let bytes = self.open_bytes(payload, T::TAG.as_bytes())?;
        postcard::from_bytes(&bytes).context("postcard decoding failed")
    }

    /// Seals raw bytes, authenticating `context` alongside the header.
    ///
    /// # Errors
    /// [`CipherError::Encryption`] if the RNG or the AEAD fails.
    pub fn seal_bytes(&self, data: &[u8], context: &[u8]) -> Result<Vec<u8>, CipherError> {
        let compress = self.inner.compression && data.len() >= COMPRESSION_THRESHOLD;
        let compressed;
        let (flags, data) = if compress {
            compressed = lz4_flex::compress_prepend_size(data);
            (FLAG_COMPRESSED, compressed.as_slice())
        } else {
            (0, data)
        };

        let header = [PAYLOAD_VERSION_V1, flags];
        let nonce = Self::next_nonce()?;

        let mut buf = Vec::with_capacity(HEADER_LEN + NONCE_LEN + data.len() + TAG_LEN);
        buf.extend_from_slice(&header);
        buf.extend_from_slice(&nonce);
        buf.extend_from_slice(data);

        let tag = self
            .inner
            .suite
            .encrypt_in_place_detached(&nonce, &associated_data(header, context), &mut buf[HEADER_LEN + NONCE_LEN..])
            .map_err(|_| CipherError::Encryption {
                message: "AEAD encryption failed".into(),
                context: None,
            })?;

        buf.extend_from_slice(&tag);
        Ok(buf)
    }

    /// Opens raw bytes sealed with the same `context`.
    ///
    /// # Errors
    /// [`CipherError::InvalidPayload`] for a bad header, [`CipherError::Decryption`] for
    /// everything the AEAD or LZ4 rejects.
    pub fn open_bytes(&self, payload: &[u8], context: &[u8]) -> Result<Vec<u8>, CipherError> {
        if payload.len() < HEADER_LEN + NONCE_LEN + TAG_LEN {
            return Err(CipherError::Decryption {
                message: format!("payload truncated to {} bytes", payload.len()).into(),
                context: None,
            });
        }

        let header = [payload[0], payload[1]];
        if header[0] != PAYLOAD_VERSION_V1 {
            return Err(CipherError::InvalidPayload {
                message: "unsupported payload version".into(),
                context: Some(format!("version={}", header[0]).into()),
            });
        }

        let (nonce, rest) = payload[HEADER_LEN..].split_at(NONCE_LEN);
        let (ciphertext, tag) = rest.split_at(rest.len() - TAG_LEN);

        let mut buf = ciphertext.to_vec();
        self.inner
            .suite
            .decrypt_in_place_detached(
                Nonce::<C>::from_slice(nonce),
                &associated_data(header, context),
                &mut buf,
                Tag::<C>::from_slice(tag),
            )
            .map_err(|_| CipherError::Decryption {
                message: "authentication failed".into(),
                context: Some("wrong key, wrong context or tampered payload".into()),
            })?;

        if header[1] & FLAG_COMPRESSED != 0 {
            buf = lz4_flex::decompress_size_prepended(&buf)
                .map_err(|_| CipherError::decryption("LZ4 stream invalid"))?;
        }

        Ok(buf)
    }
}

fn associated_data(header: [u8; HEADER_LEN], context: &[u8]) -> Vec<u8> {
    let mut aad = Vec::with_capacity(HEADER_LEN + context.len());
    aad.extend_from_slice(&header);
    aad.extend_from_slice(context);
    aad
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    fn cipher<C: CipherSuite>(compression: bool) -> Cipher<C> {
        Cipher::<C>::builder()
            .compression(compression)
            .derived_key("device-ikm", "salt", "tests")
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn nonces_differ_per_call() {
        let n1 = Cipher::<ChaCha>::next_nonce().unwrap();
        let n2 = Cipher::<ChaCha>::next_nonce().unwrap();
        assert_ne!(n1, n2);
    }

    #[test]
    fn large_payloads_roundtrip_with_compression() {
        let c = cipher::<Aes>(true);
        let data = "a".repeat(4096);
        let sealed = c.seal_bytes(data.as_bytes(), b"ctx").unwrap();
        assert!(sealed.len() < data.len(), "repetitive data should compress");
        assert_eq!(c.open_bytes(&sealed, b"ctx").unwrap(), data.as_bytes());
    }

    #[test]
    fn header_is_authenticated() {
        let c = cipher::<Aes>(false);
        let mut sealed = c.seal_bytes(b"data", b"ctx").unwrap();
        sealed[1] ^= super::FLAG_COMPRESSED;
        assert!(matches!(c.open_bytes(&sealed, b"ctx"), Err(CipherError::Decryption { .. })));
    }

    #[test]
    fn unknown_version_is_invalid_payload() {
        let c = cipher::<Aes>(false);
        let mut sealed = c.seal_bytes(b"data", b"ctx").unwrap();
        sealed[0] = 9;
        assert!(matches!(c.open_bytes(&sealed, b"ctx"), Err(CipherError::InvalidPayload { .. })));
    }

    #[test]
    fn optional_fields_pass_none_through() {
        let c = cipher::<ChaCha>(false);
        assert_eq!(c.encrypt_opt(None).unwrap(), None);
        assert_eq!(c.decrypt_opt(None).unwrap(), None);

        let sealed = c.encrypt_opt(Some("x")).unwrap();
        assert_eq!(c.decrypt_opt(sealed.as_deref()).unwrap().as_deref(), Some("x"));
    }
}
