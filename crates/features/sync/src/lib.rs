//! Local/remote reconciliation.
//!
//! The [`Reconciler`] pulls records other devices uploaded, pushes local changes
//! and propagates local deletions to a [`RemoteVault`]. Deletions only travel one
//! way: a record deleted elsewhere stays on this device.
//!
//! ```rust
//! # use ksafe_sync::{MemoryRemote, RemoteVault};
//! # use ksafe_kernel::domain::{Credentials, RecordContent};
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let remote = MemoryRemote::new();
//! let creds = Credentials { user_id: "alice".into(), id_token: "token".into() };
//! let content = RecordContent::new("mail", "alice", "https://mail.test", "s3cret!");
//!
//! let id = remote.create_record(&creds, &content).await.unwrap();
//! assert_eq!(remote.read_record(&creds, &id).await.unwrap().unwrap().content, content);
//! # }
//! ```

mod error;
mod memory;
mod reconciler;
mod remote;
mod report;

pub use error::{RemoteError, RemoteErrorExt, SyncError, SyncErrorExt};
pub use memory::MemoryRemote;
pub use reconciler::Reconciler;
pub use remote::RemoteVault;
pub use report::{DeletionReport, ImportReport, SyncReport, UploadReport};
