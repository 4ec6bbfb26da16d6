//! Keepsafe: a personal credential vault.
//!
//! [`VaultManager`] is the only type a UI needs. It composes the encrypted
//! [`store`], the security [`analyzer`] and the optional remote [`sync`], all
//! sharing one [`kernel::session::Session`].

mod builder;
mod error;
mod manager;

pub use builder::{NoStorage, VaultManagerBuilder, WithStorage};
pub use error::{ManagerError, ManagerErrorExt};
pub use manager::{VERIFIER_FILE, VaultManager};

pub use ksafe_analyzer as analyzer;
pub use ksafe_domain as domain;
pub use ksafe_kernel as kernel;
pub use ksafe_storage as storage;
pub use ksafe_store as store;
pub use ksafe_sync as sync;
