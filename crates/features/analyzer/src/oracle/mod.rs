//! Remote lookups that can flag a record. Every implementation may fail; the
//! analyzer treats a failure as "not flagged".

mod pwned;
mod safe_browsing;

pub use pwned::PwnedPasswords;
pub use safe_browsing::SafeBrowsing;

use crate::error::OracleError;
use async_trait::async_trait;
use std::fmt::Debug;

#[async_trait]
pub trait BreachOracle: Send + Sync + Debug {
    /// Whether `password` appears in a known breach corpus.
    async fn is_known_breached(&self, password: &str) -> Result<bool, OracleError>;
}

#[async_trait]
pub trait UrlSafetyOracle: Send + Sync + Debug {
    /// Whether `url` is classified as malicious.
    async fn is_unsafe(&self, url: &str) -> Result<bool, OracleError>;
}

/// Stand-in for a check switched off in configuration. Never flags anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Disabled;

#[async_trait]
impl BreachOracle for Disabled {
    async fn is_known_breached(&self, _password: &str) -> Result<bool, OracleError> {
        Ok(false)
    }
}

#[async_trait]
impl UrlSafetyOracle for Disabled {
    async fn is_unsafe(&self, _url: &str) -> Result<bool, OracleError> {
        Ok(false)
    }
}
