//! # Domain Models
//!
//! Pure vault types with minimal dependencies (`serde`, `bitflags`, `chrono`).
//! Keep it lean: no I/O, networking, or crypto. Just data and simple helpers.

pub mod config;
pub mod flags;
pub mod ids;
pub mod record;
pub mod session;

pub use flags::SecurityFlags;
pub use ids::{LocalId, RemoteId};
pub use record::{RecordContent, RemoteRecord, Tombstone, VaultRecord};
pub use session::{AuthTokens, Credentials};
