#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use ksafe_analyzer::{BreachOracle, OracleError, UrlSafetyOracle};
use ksafe_domain::{LocalId, RecordContent, VaultRecord};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn record(id: u64, url: &str, password: &str) -> VaultRecord {
    VaultRecord::local(
        LocalId::new(id),
        RecordContent::new(format!("site {id}"), "alice", url, password),
        Utc::now(),
    )
}

/// Knows a fixed set of breached passwords and counts lookups.
#[derive(Debug, Default, Clone)]
pub struct KnownBreaches {
    pub passwords: HashSet<String>,
    pub calls: Arc<AtomicUsize>,
}

impl KnownBreaches {
    pub fn of(passwords: &[&str]) -> Self {
        Self { passwords: passwords.iter().map(|p| (*p).to_owned()).collect(), ..Self::default() }
    }
}

#[async_trait]
impl BreachOracle for KnownBreaches {
    async fn is_known_breached(&self, password: &str) -> Result<bool, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.passwords.contains(password))
    }
}

/// Flags URLs containing `needle` and counts lookups.
#[derive(Debug, Default, Clone)]
pub struct Blocklist {
    pub needle: &'static str,
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl UrlSafetyOracle for Blocklist {
    async fn is_unsafe(&self, url: &str) -> Result<bool, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(url.contains(self.needle))
    }
}

/// Always errors.
#[derive(Debug, Clone, Copy)]
pub struct Broken;

#[async_trait]
impl BreachOracle for Broken {
    async fn is_known_breached(&self, _password: &str) -> Result<bool, OracleError> {
        Err(OracleError::Protocol { message: "service unavailable".into(), context: None })
    }
}

#[async_trait]
impl UrlSafetyOracle for Broken {
    async fn is_unsafe(&self, _url: &str) -> Result<bool, OracleError> {
        Err(OracleError::Protocol { message: "service unavailable".into(), context: None })
    }
}

/// Would flag everything, but only after `delay`.
#[derive(Debug, Clone, Copy)]
pub struct Slow {
    pub delay: Duration,
}

#[async_trait]
impl BreachOracle for Slow {
    async fn is_known_breached(&self, _password: &str) -> Result<bool, OracleError> {
        tokio::time::sleep(self.delay).await;
        Ok(true)
    }
}

#[async_trait]
impl UrlSafetyOracle for Slow {
    async fn is_unsafe(&self, _url: &str) -> Result<bool, OracleError> {
        tokio::time::sleep(self.delay).await;
        Ok(true)
    }
}
