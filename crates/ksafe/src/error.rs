use ksafe_analyzer::AnalyzerError;
use ksafe_kernel::error::SessionError;
use ksafe_store::StoreError;
use ksafe_sync::{RemoteError, SyncError};
use std::borrow::Cow;

/// What the UI sees. Feature errors are folded into these kinds.
#[ksafe_derive::ksafe_error]
pub enum ManagerError {
    /// Missing mandatory field or a rejected duplicate. Never retried.
    #[error("Validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Storage error{}: {source}", format_context(.context))]
    Storage { source: ksafe_storage::StorageError, context: Option<Cow<'static, str>> },

    #[error("Crypto error{}: {source}", format_context(.context))]
    Crypto { source: ksafe_cipher::CipherError, context: Option<Cow<'static, str>> },

    #[error("Network error{}: {source}", format_context(.context))]
    Network { source: RemoteError, context: Option<Cow<'static, str>> },

    #[error("Vault is locked{}: {message}", format_context(.context))]
    Locked { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Wrong master password{}: {message}", format_context(.context))]
    WrongMasterPassword { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Sync unavailable{}: {message}", format_context(.context))]
    SyncUnavailable { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Security analysis failed{}: {source}", format_context(.context))]
    Analysis { source: AnalyzerError, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl From<StoreError> for ManagerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation { message, context }
            | StoreError::DuplicateRejected { message, context } => Self::Validation { message, context },
            StoreError::Locked { message, context } => Self::Locked { message, context },
            StoreError::Storage { source, context } => Self::Storage { source, context },
            StoreError::Crypto { source, context } => Self::Crypto { source, context },
            StoreError::Codec { source, context } => Self::Internal {
                message: source.to_string().into(),
                context: Some(context.unwrap_or(Cow::Borrowed("vault document codec"))),
            },
            StoreError::Internal { message, context } => Self::Internal { message, context },
        }
    }
}

impl From<SessionError> for ManagerError {
    fn from(err: SessionError) -> Self {
        StoreError::from(err).into()
    }
}

impl From<SyncError> for ManagerError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Cancelled { message, context } => Self::Locked { message, context },
            SyncError::Remote { source, context } => Self::Network { source, context },
            SyncError::Store { source, .. } => source.into(),
        }
    }
}
