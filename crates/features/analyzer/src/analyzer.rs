use crate::error::{AnalyzerError, OracleError};
use crate::oracle::{BreachOracle, Disabled, PwnedPasswords, SafeBrowsing, UrlSafetyOracle};
use crate::strength::{PasswordStrength, StrengthScorer, WEAK_BELOW};
use ksafe_domain::config::SecurityConfig;
use ksafe_domain::{SecurityFlags, VaultRecord};
use ksafe_kernel::CancellationToken;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Derives [`SecurityFlags`] for vault records.
///
/// Oracle lookups are bounded by a timeout and fail open: an error or a timeout
/// leaves the flag unset and is logged at `warn`. A missing flag therefore means
/// "not known to be bad", never "checked and clean".
#[derive(Debug, Clone)]
pub struct SecurityAnalyzer {
    scorer: Arc<dyn StrengthScorer>,
    breach: Arc<dyn BreachOracle>,
    url_safety: Arc<dyn UrlSafetyOracle>,
    oracle_timeout: Duration,
}

impl Default for SecurityAnalyzer {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SecurityAnalyzer {
    #[must_use]
    pub fn builder() -> SecurityAnalyzerBuilder {
        SecurityAnalyzerBuilder::default()
    }

    /// Wires the scorer and oracles described by `config`.
    ///
    /// # Errors
    /// [`AnalyzerError::Configuration`] if URL safety is enabled without an API key,
    /// [`AnalyzerError::Oracle`] if an HTTP client cannot be built.
    pub fn from_config(config: &SecurityConfig) -> Result<Self, AnalyzerError> {
        let timeout = config.oracle_timeout();
        let mut builder = Self::builder()
            .scorer(PasswordStrength::from_config(&config.strength))
            .oracle_timeout(timeout);

        if config.breach.enabled {
            builder = builder.breach(PwnedPasswords::new(config.breach.endpoint.as_str(), timeout)?);
        }

        if config.url_safety.enabled {
            let Some(api_key) = config.url_safety.api_key.as_deref().filter(|k| !k.is_empty()) else {
                return Err(AnalyzerError::Configuration {
                    message: "url_safety.api_key is required when URL checks are enabled".into(),
                    context: None,
                });
            };
            builder = builder.url_safety(SafeBrowsing::new(
                config.url_safety.endpoint.as_str(),
                api_key,
                config.url_safety.client_id.as_str(),
                timeout,
            )?);
        }

        Ok(builder.build())
    }

    /// Flags one record. `seen` holds the passwords of records analyzed earlier in
    /// the same pass; the first occurrence of a password is never a duplicate.
    pub async fn analyze(&self, record: &VaultRecord, seen: &mut HashSet<String>) -> SecurityFlags {
        self.flags_for(record, seen, &mut HashMap::new()).await
    }

    /// `breached` memoizes breach answers per password for the current pass, so a
    /// reused password costs one range query.
    async fn flags_for(
        &self,
        record: &VaultRecord,
        seen: &mut HashSet<String>,
        breached: &mut HashMap<String, bool>,
    ) -> SecurityFlags {
        let password = record.content.password.as_str();
        let url = record.content.url.trim();
        let mut flags = SecurityFlags::empty();

        flags.set(SecurityFlags::WEAK, self.scorer.score(password) < WEAK_BELOW);
        flags.set(SecurityFlags::DUPLICATE, !seen.insert(password.to_owned()));

        let compromised = match breached.get(password) {
            Some(&known) => known,
            None => {
                let known = self.fail_open("breach", self.breach.is_known_breached(password)).await;
                breached.insert(password.to_owned(), known);
                known
            },
        };
        flags.set(SecurityFlags::COMPROMISED, compromised);

        if !url.is_empty() {
            let unsafe_url = self.fail_open("url_safety", self.url_safety.is_unsafe(url)).await;
            flags.set(SecurityFlags::URL_UNSAFE, unsafe_url);
        }

        flags
    }

    /// Recomputes the flags of every record in order, in place.
    ///
    /// # Errors
    /// [`AnalyzerError::Cancelled`] if `cancel` fires; records already visited keep
    /// their new flags in the slice, nothing is persisted here.
    #[instrument(skip_all, fields(records = records.len()))]
    pub async fn analyze_batch(
        &self,
        records: &mut [VaultRecord],
        cancel: &CancellationToken,
    ) -> Result<(), AnalyzerError> {
        let mut seen = HashSet::with_capacity(records.len());
        let mut breached = HashMap::with_capacity(records.len());

        for record in records.iter_mut() {
            let flags = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(cancelled()),
                flags = self.flags_for(record, &mut seen, &mut breached) => flags,
            };
            record.flags = flags;
        }

        debug!("Security pass complete");
        Ok(())
    }

    async fn fail_open<F>(&self, oracle: &'static str, lookup: F) -> bool
    where
        F: Future<Output = Result<bool, OracleError>>,
    {
        match tokio::time::timeout(self.oracle_timeout, lookup).await {
            Ok(Ok(flagged)) => flagged,
            Ok(Err(err)) => {
                warn!(oracle, error = %err, "Oracle lookup failed; treating as not flagged");
                false
            },
            Err(_) => {
                warn!(oracle, timeout = ?self.oracle_timeout, "Oracle lookup timed out; treating as not flagged");
                false
            },
        }
    }
}

fn cancelled() -> AnalyzerError {
    AnalyzerError::Cancelled { message: "session closed during security pass".into(), context: None }
}

#[derive(Debug)]
pub struct SecurityAnalyzerBuilder {
    scorer: Arc<dyn StrengthScorer>,
    breach: Arc<dyn BreachOracle>,
    url_safety: Arc<dyn UrlSafetyOracle>,
    oracle_timeout: Duration,
}

impl Default for SecurityAnalyzerBuilder {
    fn default() -> Self {
        Self {
            scorer: Arc::new(PasswordStrength::default()),
            breach: Arc::new(Disabled),
            url_safety: Arc::new(Disabled),
            oracle_timeout: DEFAULT_ORACLE_TIMEOUT,
        }
    }
}

impl SecurityAnalyzerBuilder {
    #[must_use]
    pub fn scorer(mut self, scorer: impl StrengthScorer + 'static) -> Self {
        self.scorer = Arc::new(scorer);
        self
    }

    #[must_use]
    pub fn breach(mut self, oracle: impl BreachOracle + 'static) -> Self {
        self.breach = Arc::new(oracle);
        self
    }

    #[must_use]
    pub fn url_safety(mut self, oracle: impl UrlSafetyOracle + 'static) -> Self {
        self.url_safety = Arc::new(oracle);
        self
    }

    #[must_use]
    pub const fn oracle_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout = timeout;
        self
    }

    #[must_use]
    pub fn build(self) -> SecurityAnalyzer {
        SecurityAnalyzer {
            scorer: self.scorer,
            breach: self.breach,
            url_safety: self.url_safety,
            oracle_timeout: self.oracle_timeout,
        }
    }
}
