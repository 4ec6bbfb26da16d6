//! Sandboxed file storage for vault documents.
//!
//! * **Sandbox**: paths are normalized and checked against the canonical root, so `..`,
//!   absolute paths and escaping symlinks are rejected.
//! * **Atomic writes**: unique temp file, `fsync`, rename, directory sync.
//! * **Namespaces**: one directory per account via [`Storage::namespace`].
//! * **Compression**: optional transparent LZ4.
//! * **Self-healing**: temp files orphaned by a crash are purged on connect.

mod builder;
mod engine;
mod error;
mod maintenance;
mod namespace;
mod security;

pub use builder::{Rooted, StorageBuilder, Unrooted};
pub use engine::{Compression, Storage};
pub use error::{StorageError, StorageErrorExt};
pub use namespace::{NamespaceName, NamespacedStorage};
