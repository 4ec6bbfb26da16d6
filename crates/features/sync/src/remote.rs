use crate::error::RemoteError;
use async_trait::async_trait;
use ksafe_domain::{Credentials, RecordContent, RemoteId, RemoteRecord};
use std::fmt::Debug;

/// The remote record store of one account.
///
/// Content travels decrypted: the remote sees the same fields the user typed.
/// Implementations authorize every call with the bearer token in [`Credentials`].
#[async_trait]
pub trait RemoteVault: Send + Sync + Debug {
    /// Stores a new record and returns the id the remote assigned.
    async fn create_record(
        &self,
        creds: &Credentials,
        content: &RecordContent,
    ) -> Result<RemoteId, RemoteError>;

    async fn read_all_records(&self, creds: &Credentials) -> Result<Vec<RemoteRecord>, RemoteError>;

    async fn read_record(
        &self,
        creds: &Credentials,
        remote_id: &RemoteId,
    ) -> Result<Option<RemoteRecord>, RemoteError>;

    /// # Errors
    /// [`RemoteError::NotFound`] if `remote_id` does not exist.
    async fn update_record(
        &self,
        creds: &Credentials,
        remote_id: &RemoteId,
        content: &RecordContent,
    ) -> Result<(), RemoteError>;

    /// # Errors
    /// [`RemoteError::NotFound`] if `remote_id` does not exist.
    async fn delete_record(&self, creds: &Credentials, remote_id: &RemoteId) -> Result<(), RemoteError>;
}
