use ksafe_kernel::error::SessionError;
use std::borrow::Cow;

#[ksafe_derive::ksafe_error]
pub enum StoreError {
    /// A mandatory field is missing or blank.
    #[error("Validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The content tuple already exists in the vault.
    #[error("Duplicate record rejected{}: {message}", format_context(.context))]
    DuplicateRejected { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Vault is locked{}: {message}", format_context(.context))]
    Locked { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Vault storage error{}: {source}", format_context(.context))]
    Storage { source: ksafe_storage::StorageError, context: Option<Cow<'static, str>> },

    #[error("Vault crypto error{}: {source}", format_context(.context))]
    Crypto { source: ksafe_cipher::CipherError, context: Option<Cow<'static, str>> },

    #[error("Vault document codec error{}: {source}", format_context(.context))]
    Codec { source: postcard::Error, context: Option<Cow<'static, str>> },

    #[error("Internal store error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl From<SessionError> for StoreError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Locked { message, context } => Self::Locked { message, context },
            SessionError::Storage { source, context } => Self::Storage { source, context },
            SessionError::Crypto { source, context } => Self::Crypto { source, context },
            SessionError::Device { message, context } => Self::Internal { message, context },
        }
    }
}
