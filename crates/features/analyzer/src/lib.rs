//! Security posture of vault records.
//!
//! [`SecurityAnalyzer`] combines a [`StrengthScorer`] with a [`BreachOracle`] and a
//! [`UrlSafetyOracle`] into per-record [`ksafe_domain::SecurityFlags`]:
//!
//! | flag          | raised when                                             |
//! |---------------|---------------------------------------------------------|
//! | `WEAK`        | strength score below 3                                  |
//! | `DUPLICATE`   | an earlier record in the same pass uses the password    |
//! | `COMPROMISED` | the breach oracle knows the password                    |
//! | `URL_UNSAFE`  | the URL safety oracle flags the (non-empty) URL         |
//!
//! Oracles fail open. The scorer is purely local.

mod analyzer;
mod error;
pub mod oracle;
pub mod strength;

pub use analyzer::{SecurityAnalyzer, SecurityAnalyzerBuilder};
pub use error::{AnalyzerError, AnalyzerErrorExt, OracleError, OracleErrorExt};
pub use oracle::{BreachOracle, Disabled, PwnedPasswords, SafeBrowsing, UrlSafetyOracle};
pub use strength::{Dictionary, PasswordStrength, StrengthScorer};
