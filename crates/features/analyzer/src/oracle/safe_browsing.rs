use super::UrlSafetyOracle;
use crate::error::OracleError;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

const THREAT_TYPES: [&str; 4] =
    ["MALWARE", "SOCIAL_ENGINEERING", "UNWANTED_SOFTWARE", "POTENTIALLY_HARMFUL_APPLICATION"];

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FindRequest<'a> {
    client: ClientInfo<'a>,
    threat_info: ThreatInfo<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientInfo<'a> {
    client_id: &'a str,
    client_version: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThreatInfo<'a> {
    threat_types: &'a [&'a str],
    platform_types: &'a [&'a str],
    threat_entry_types: &'a [&'a str],
    threat_entries: [ThreatEntry<'a>; 1],
}

#[derive(Serialize)]
struct ThreatEntry<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct FindResponse {
    #[serde(default)]
    matches: Vec<IgnoredAny>,
}

/// Google Safe Browsing v4 `threatMatches:find` lookup.
#[derive(Clone)]
pub struct SafeBrowsing {
    client: Client,
    endpoint: String,
    api_key: String,
    client_id: String,
}

impl fmt::Debug for SafeBrowsing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafeBrowsing")
            .field("endpoint", &self.endpoint)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl SafeBrowsing {
    /// `endpoint` is the full `threatMatches:find` URL.
    ///
    /// # Errors
    /// [`OracleError::Network`] if the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        client_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, OracleError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            client_id: client_id.into(),
        })
    }
}

#[async_trait]
impl UrlSafetyOracle for SafeBrowsing {
    #[instrument(skip_all)]
    async fn is_unsafe(&self, url: &str) -> Result<bool, OracleError> {
        let request = FindRequest {
            client: ClientInfo { client_id: &self.client_id, client_version: env!("CARGO_PKG_VERSION") },
            threat_info: ThreatInfo {
                threat_types: &THREAT_TYPES,
                platform_types: &["ANY_PLATFORM"],
                threat_entry_types: &["URL"],
                threat_entries: [ThreatEntry { url }],
            },
        };

        let response: FindResponse = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let flagged = !response.matches.is_empty();
        debug!(flagged, "URL reputation checked");
        Ok(flagged)
    }
}
