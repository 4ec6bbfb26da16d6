use std::borrow::Cow;

#[ksafe_derive::ksafe_error]
pub enum SessionError {
    /// No unlocked session: there is no key to work with.
    #[error("Vault is locked{}: {message}", format_context(.context))]
    Locked { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The device fingerprint backing session persistence is unavailable.
    #[error("Device identity error{}: {message}", format_context(.context))]
    Device { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Session storage error{}: {source}", format_context(.context))]
    Storage { source: ksafe_storage::StorageError, context: Option<Cow<'static, str>> },

    #[error("Session crypto error{}: {source}", format_context(.context))]
    Crypto { source: ksafe_cipher::CipherError, context: Option<Cow<'static, str>> },
}

impl SessionError {
    pub(crate) fn locked() -> Self {
        Self::Locked { message: "unlock the vault first".into(), context: None }
    }
}
