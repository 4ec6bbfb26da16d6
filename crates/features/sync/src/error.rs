use ksafe_kernel::error::SessionError;
use ksafe_store::StoreError;
use std::borrow::Cow;

/// Failure reported by a [`crate::RemoteVault`] implementation.
#[ksafe_derive::ksafe_error]
pub enum RemoteError {
    /// Transport failure or timeout. Worth retrying.
    #[error("Remote unreachable{}: {message}", format_context(.context))]
    Network { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Remote refused credentials{}: {message}", format_context(.context))]
    Unauthorized { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Remote record not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The remote understood the request and declined it.
    #[error("Remote rejected the request{}: {message}", format_context(.context))]
    Rejected { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl RemoteError {
    pub(crate) fn timed_out(operation: &'static str) -> Self {
        Self::Network { message: "request timed out".into(), context: Some(operation.into()) }
    }
}

#[ksafe_derive::ksafe_error]
pub enum SyncError {
    /// The session was closed while the sync was running.
    #[error("Sync cancelled{}: {message}", format_context(.context))]
    Cancelled { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Sync remote error{}: {source}", format_context(.context))]
    Remote { source: RemoteError, context: Option<Cow<'static, str>> },

    #[error("Sync store error{}: {source}", format_context(.context))]
    Store { source: StoreError, context: Option<Cow<'static, str>> },
}

impl From<SessionError> for SyncError {
    fn from(err: SessionError) -> Self {
        Self::Store { source: err.into(), context: None }
    }
}

impl SyncError {
    pub(crate) fn cancelled() -> Self {
        Self::Cancelled { message: "session closed".into(), context: None }
    }
}
