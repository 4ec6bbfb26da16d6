//! # Cipher Errors
//!
//! [`CipherError`] covers key derivation, sealing and opening failures. Every variant is a
//! recoverable value: a wrong master password surfaces as [`CipherError::Decryption`], never
//! as a panic or a silently wrong plaintext.

use std::borrow::Cow;

#[ksafe_derive::ksafe_error]
pub enum CipherError {
    /// PBKDF2/HKDF failed or was called with unusable parameters.
    #[error("Key derivation error{}: {message}", format_context(.context))]
    KeyDerivation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The AEAD seal step or the system RNG failed.
    #[error("Encryption error{}: {message}", format_context(.context))]
    Encryption { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Wrong key, mismatched associated data, tampering, truncation or undecodable text.
    #[error("Decryption error{}: {message}", format_context(.context))]
    Decryption { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Postcard encoding/decoding of a sealed model failed.
    #[error("Serialization error{}: {source}", format_context(.context))]
    Serialization { source: postcard::Error, context: Option<Cow<'static, str>> },

    /// The payload header is not one this engine understands.
    #[error("Invalid payload{}: {message}", format_context(.context))]
    InvalidPayload { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal cipher error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl CipherError {
    pub(crate) fn decryption(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Decryption { message: message.into(), context: None }
    }

    pub(crate) fn derivation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::KeyDerivation { message: message.into(), context: None }
    }
}
