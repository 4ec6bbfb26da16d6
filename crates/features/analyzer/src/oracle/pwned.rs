use super::BreachOracle;
use crate::error::OracleError;
use async_trait::async_trait;
use reqwest::Client;
use sha1::{Digest, Sha1};
use std::time::Duration;
use tracing::{debug, instrument};

const PREFIX_LEN: usize = 5;

/// Pwned Passwords k-anonymity range lookup.
///
/// Only the first five hex chars of the SHA-1 digest leave the machine; the
/// returned suffix list is matched locally. Padding is requested so response
/// sizes do not reveal the prefix bucket, and padded entries (count `0`) are ignored.
#[derive(Debug, Clone)]
pub struct PwnedPasswords {
    client: Client,
    endpoint: String,
}

impl PwnedPasswords {
    /// `endpoint` is the API base, e.g. `https://api.pwnedpasswords.com`.
    ///
    /// # Errors
    /// [`OracleError::Network`] if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("keepsafe/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, endpoint: endpoint.into().trim_end_matches('/').to_owned() })
    }
}

#[async_trait]
impl BreachOracle for PwnedPasswords {
    #[instrument(skip_all)]
    async fn is_known_breached(&self, password: &str) -> Result<bool, OracleError> {
        let digest = hex::encode_upper(Sha1::digest(password.as_bytes()));
        let (prefix, suffix) = digest.split_at(PREFIX_LEN);

        let body = self
            .client
            .get(format!("{}/range/{prefix}", self.endpoint))
            .header("Add-Padding", "true")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let breached = range_contains(&body, suffix)?;
        debug!(breached, "Breach range checked");
        Ok(breached)
    }
}

/// Scans `SUFFIX:COUNT` lines for `suffix` with a non-zero count.
fn range_contains(body: &str, suffix: &str) -> Result<bool, OracleError> {
    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some((candidate, count)) = line.split_once(':') else {
            return Err(OracleError::Protocol {
                message: "range line without a count".into(),
                context: None,
            });
        };
        if candidate.eq_ignore_ascii_case(suffix) {
            return Ok(count.trim().parse::<u64>().is_ok_and(|n| n > 0));
        }
    }
    Ok(false)
}
