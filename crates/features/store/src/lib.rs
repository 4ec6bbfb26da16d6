//! Encrypted local persistence of vault records.
//!
//! [`VaultStore`] owns the per-account vault document: sealed records, the local id
//! counter and the [`TombstoneStore`] log of remote ids deleted on this device.
//! Content fields are sealed with the session cipher; ids, flags and sync metadata
//! stay in clear so they can be read without decrypting every record.

mod document;
mod error;
mod store;
mod tombstones;

pub use document::{SealedContent, SealedRecord};
pub use error::{StoreError, StoreErrorExt};
pub use store::{VAULT_FILE, VaultStore};
pub use tombstones::TombstoneStore;
