use crate::error::SessionError;
use async_trait::async_trait;
use ksafe_cipher::prelude::*;
use ksafe_domain::AuthTokens;
use ksafe_storage::Storage;
use machineid_rs::{Encryption, HWIDComponent, IdBuilder};
use tracing::{debug, instrument, warn};

/// File holding the sealed tokens, relative to the storage root.
pub const SESSION_FILE: &str = "session.bin";

const DEVICE_ID_KEY: &str = "ksafe.device";
const DEVICE_SALT: &[u8] = b"ksafe.session.salt.v1";
const DEVICE_INFO: &[u8] = b"ksafe.session.key.v1";

/// Keeps the signed-in account across process restarts.
#[async_trait]
pub trait SessionPersistence: Send + Sync + std::fmt::Debug {
    async fn save(&self, tokens: &AuthTokens) -> Result<(), SessionError>;

    /// `None` when nothing is stored or the stored payload is unusable.
    async fn load(&self) -> Result<Option<AuthTokens>, SessionError>;

    async fn clear(&self) -> Result<(), SessionError>;
}

#[sealed_model(tag = "ksafe.session.v1")]
struct PersistedSession {
    user_id: String,
    id_token: String,
    refresh_token: String,
}

/// Seals tokens under a key derived from this machine's identity.
///
/// The key never depends on the master password, so the account can be restored
/// before unlock. A file copied to another machine does not open there.
#[derive(Debug, Clone)]
pub struct DeviceSessionStore {
    storage: Storage,
    cipher: Cipher,
}

impl DeviceSessionStore {
    /// Binds to the current machine id.
    ///
    /// # Errors
    /// [`SessionError::Device`] if the machine id cannot be read.
    pub fn new(storage: Storage) -> Result<Self, SessionError> {
        let device_id = IdBuilder::new(Encryption::SHA256)
            .add_component(HWIDComponent::SystemID)
            .build(DEVICE_ID_KEY)
            .map_err(|e| SessionError::Device {
                message: e.to_string().into(),
                context: Some("machineid_rs build failed".into()),
            })?;
        Self::with_device_secret(storage, device_id)
    }

    /// Binds to an explicit device secret instead of the machine id.
    ///
    /// # Errors
    /// [`SessionError::Crypto`] if key derivation fails.
    pub fn with_device_secret(
        storage: Storage,
        secret: impl AsRef<[u8]>,
    ) -> Result<Self, SessionError> {
        let cipher = Cipher::<Aes>::builder()
            .derived_key(secret, DEVICE_SALT, DEVICE_INFO)
            .context("device key derivation")?
            .build()?;
        Ok(Self { storage, cipher })
    }
}

#[async_trait]
impl SessionPersistence for DeviceSessionStore {
    #[instrument(skip_all, fields(user_id = %tokens.user_id))]
    async fn save(&self, tokens: &AuthTokens) -> Result<(), SessionError> {
        let persisted = PersistedSession {
            user_id: tokens.user_id.clone(),
            id_token: tokens.id_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
        };
        let sealed = persisted.seal(&self.cipher)?;
        self.storage.write(SESSION_FILE, &sealed).await?;
        debug!("Session persisted");
        Ok(())
    }

    #[instrument(skip_all)]
    async fn load(&self) -> Result<Option<AuthTokens>, SessionError> {
        let Some(payload) = self.storage.read_optional(SESSION_FILE).await? else {
            return Ok(None);
        };

        match PersistedSession::open(&self.cipher, &payload) {
            Ok(s) => Ok(Some(AuthTokens::new(s.user_id, s.id_token, s.refresh_token))),
            Err(err) => {
                warn!(error = %err, "Stored session does not open on this device; ignoring it");
                Ok(None)
            },
        }
    }

    #[instrument(skip_all)]
    async fn clear(&self) -> Result<(), SessionError> {
        if self.storage.delete(SESSION_FILE).await? {
            debug!("Session cleared");
        }
        Ok(())
    }
}
