//! The unlocked-vault context injected into every feature crate.

mod gate;
mod namespace;
mod persistence;

pub use gate::{MutationGate, MutationGuard};
pub use namespace::account_namespace;
pub use persistence::{DeviceSessionStore, SESSION_FILE, SessionPersistence};

use crate::error::SessionError;
use ksafe_cipher::Cipher;
use ksafe_domain::{AuthTokens, Credentials};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

struct ActiveSession {
    tokens: AuthTokens,
    cipher: Cipher,
}

struct SessionInner {
    active: RwLock<Option<ActiveSession>>,
    cancel: RwLock<CancellationToken>,
    gate: MutationGate,
}

/// Signed-in account, its vault cipher and the coordination primitives around them.
///
/// Cheap to clone; clones observe the same state. The cipher is installed by
/// [`Session::open`] and dropped (zeroizing the key schedule) by [`Session::close`].
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("open", &self.is_open())
            .field("user_id", &self.user_id())
            .finish_non_exhaustive()
    }
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SessionInner {
                active: RwLock::new(None),
                cancel: RwLock::new(CancellationToken::new()),
                gate: MutationGate::new(),
            }),
        }
    }

    /// Installs the account and its cipher, replacing any previous one.
    ///
    /// A token cancelled by an earlier [`Session::close`] is replaced with a fresh one.
    pub fn open(&self, tokens: AuthTokens, cipher: Cipher) {
        {
            let mut cancel = self.inner.cancel.write();
            if cancel.is_cancelled() {
                *cancel = CancellationToken::new();
            }
        }
        info!(user_id = %tokens.user_id, "Session opened");
        *self.inner.active.write() = Some(ActiveSession { tokens, cipher });
    }

    /// Cancels in-flight work and drops the cipher. Returns `false` if already closed.
    pub fn close(&self) -> bool {
        self.inner.cancel.read().cancel();
        let previous = self.inner.active.write().take();
        if previous.is_some() {
            debug!("Session closed");
        }
        previous.is_some()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.active.read().is_some()
    }

    #[must_use]
    pub fn user_id(&self) -> Option<String> {
        self.inner.active.read().as_ref().map(|s| s.tokens.user_id.clone())
    }

    #[must_use]
    pub fn tokens(&self) -> Option<AuthTokens> {
        self.inner.active.read().as_ref().map(|s| s.tokens.clone())
    }

    /// Replaces the tokens of the open session, e.g. after a refresh.
    ///
    /// # Errors
    /// [`SessionError::Locked`] when no session is open.
    pub fn refresh_tokens(&self, tokens: AuthTokens) -> Result<(), SessionError> {
        let mut active = self.inner.active.write();
        let session = active.as_mut().ok_or_else(SessionError::locked)?;
        session.tokens = tokens;
        Ok(())
    }

    /// # Errors
    /// [`SessionError::Locked`] when no session is open.
    pub fn credentials(&self) -> Result<Credentials, SessionError> {
        self.inner
            .active
            .read()
            .as_ref()
            .map(|s| s.tokens.credentials())
            .ok_or_else(SessionError::locked)
    }

    /// # Errors
    /// [`SessionError::Locked`] when no session is open.
    pub fn cipher(&self) -> Result<Cipher, SessionError> {
        self.inner.active.read().as_ref().map(|s| s.cipher.clone()).ok_or_else(SessionError::locked)
    }

    /// Starts a local update; see [`MutationGate`].
    pub async fn begin_local_update(&self) -> MutationGuard {
        self.inner.gate.begin().await
    }

    #[must_use]
    pub fn mutation_gate(&self) -> &MutationGate {
        &self.inner.gate
    }

    /// The token cancelled on the next [`Session::close`].
    #[must_use]
    pub fn cancellation(&self) -> CancellationToken {
        self.inner.cancel.read().clone()
    }
}
