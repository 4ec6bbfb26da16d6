use crate::error::RemoteError;
use crate::remote::RemoteVault;
use async_trait::async_trait;
use chrono::Utc;
use ksafe_domain::{Credentials, RecordContent, RemoteId, RemoteRecord};
use ksafe_kernel::safe_nanoid;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

type Accounts = HashMap<String, BTreeMap<String, RemoteRecord>>;

#[derive(Debug, Default)]
struct Faults {
    offline: bool,
    latency: Option<Duration>,
    rejected: HashSet<String>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    accounts: Mutex<Accounts>,
    faults: Mutex<Faults>,
}

/// In-process [`RemoteVault`] with one record map per user id.
///
/// Useful as a local backend and for tests: it can be taken offline, slowed down, or
/// told to reject records by description. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryRemote {
    inner: Arc<MemoryInner>,
}

impl MemoryRemote {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with [`RemoteError::Network`] while offline.
    pub fn set_offline(&self, offline: bool) {
        self.inner.faults.lock().offline = offline;
    }

    /// Delays every call, e.g. to exercise timeouts and cancellation.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.inner.faults.lock().latency = latency;
    }

    /// Writes of content with this description fail with [`RemoteError::Rejected`].
    pub fn reject_description(&self, description: impl Into<String>) {
        self.inner.faults.lock().rejected.insert(description.into());
    }

    pub fn clear_faults(&self) {
        *self.inner.faults.lock() = Faults::default();
    }

    /// Stores a record directly, as if another device had uploaded it.
    pub fn insert(&self, user_id: &str, content: RecordContent) -> RemoteId {
        let remote_id = RemoteId::new(safe_nanoid!(20));
        let record = RemoteRecord { remote_id: remote_id.clone(), content, last_modified: Utc::now() };
        self.inner
            .accounts
            .lock()
            .entry(user_id.to_owned())
            .or_default()
            .insert(remote_id.as_str().to_owned(), record);
        remote_id
    }

    /// Snapshot of one account, ordered by remote id.
    #[must_use]
    pub fn records(&self, user_id: &str) -> Vec<RemoteRecord> {
        self.inner.accounts.lock().get(user_id).map(|m| m.values().cloned().collect()).unwrap_or_default()
    }

    async fn enter(&self, creds: &Credentials) -> Result<(), RemoteError> {
        let (offline, latency) = {
            let faults = self.inner.faults.lock();
            (faults.offline, faults.latency)
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if offline {
            return Err(RemoteError::Network { message: "remote is offline".into(), context: None });
        }
        if creds.id_token.is_empty() {
            return Err(RemoteError::Unauthorized { message: "missing id token".into(), context: None });
        }
        Ok(())
    }

    fn check_accepted(&self, content: &RecordContent) -> Result<(), RemoteError> {
        if self.inner.faults.lock().rejected.contains(&content.description) {
            return Err(RemoteError::Rejected {
                message: "record refused by remote policy".into(),
                context: None,
            });
        }
        Ok(())
    }
}

fn not_found(remote_id: &RemoteId) -> RemoteError {
    RemoteError::NotFound { message: remote_id.to_string().into(), context: None }
}

#[async_trait]
impl RemoteVault for MemoryRemote {
    async fn create_record(
        &self,
        creds: &Credentials,
        content: &RecordContent,
    ) -> Result<RemoteId, RemoteError> {
        self.enter(creds).await?;
        self.check_accepted(content)?;
        let remote_id = self.insert(&creds.user_id, content.clone());
        debug!(%remote_id, "Remote record created");
        Ok(remote_id)
    }

    async fn read_all_records(&self, creds: &Credentials) -> Result<Vec<RemoteRecord>, RemoteError> {
        self.enter(creds).await?;
        Ok(self.records(&creds.user_id))
    }

    async fn read_record(
        &self,
        creds: &Credentials,
        remote_id: &RemoteId,
    ) -> Result<Option<RemoteRecord>, RemoteError> {
        self.enter(creds).await?;
        let accounts = self.inner.accounts.lock();
        Ok(accounts.get(&creds.user_id).and_then(|m| m.get(remote_id.as_str())).cloned())
    }

    async fn update_record(
        &self,
        creds: &Credentials,
        remote_id: &RemoteId,
        content: &RecordContent,
    ) -> Result<(), RemoteError> {
        self.enter(creds).await?;
        self.check_accepted(content)?;
        let mut accounts = self.inner.accounts.lock();
        let record = accounts
            .get_mut(&creds.user_id)
            .and_then(|m| m.get_mut(remote_id.as_str()))
            .ok_or_else(|| not_found(remote_id))?;
        record.content = content.clone();
        record.last_modified = Utc::now();
        Ok(())
    }

    async fn delete_record(&self, creds: &Credentials, remote_id: &RemoteId) -> Result<(), RemoteError> {
        self.enter(creds).await?;
        self.inner
            .accounts
            .lock()
            .get_mut(&creds.user_id)
            .and_then(|m| m.remove(remote_id.as_str()))
            .map(|_| ())
            .ok_or_else(|| not_found(remote_id))
    }
}
