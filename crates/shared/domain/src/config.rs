use serde::Deserialize;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Top-level Keepsafe configuration.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeepsafeConfigInner {
    pub storage: StorageConfig,
    pub security: SecurityConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct KeepsafeConfig {
    #[serde(flatten, default)]
    inner: Arc<KeepsafeConfigInner>,
}

impl Deref for KeepsafeConfig {
    type Target = KeepsafeConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for KeepsafeConfig {
    fn deref_mut(&mut self) -> &mut KeepsafeConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Local vault files.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    /// LZ4-compress files at rest.
    pub compression: bool,
}

/// Key derivation and security analysis knobs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub kdf_iterations: u32,
    pub oracle_timeout_secs: u64,
    pub strength: StrengthConfig,
    pub breach: BreachConfig,
    pub url_safety: UrlSafetyConfig,
}

impl SecurityConfig {
    #[must_use]
    pub const fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }
}

/// How dictionary words are matched inside a password.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DictionaryMode {
    /// A word anywhere inside the password is a hit.
    #[default]
    Substring,
    /// Only maximal alphabetic runs that are themselves words are hits.
    WholeWord,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StrengthConfig {
    pub dictionary_mode: DictionaryMode,
    pub case_sensitive: bool,
    pub min_word_len: usize,
}

/// Pwned Passwords range API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BreachConfig {
    pub enabled: bool,
    pub endpoint: String,
}

/// Google Safe Browsing v4 lookup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UrlSafetyConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub client_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub enabled: bool,
    pub request_timeout_secs: u64,
}

impl SyncConfig {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for rolling log files; console only when unset.
    pub dir: Option<PathBuf>,
    pub json: bool,
}

// --- Default ---

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: PathBuf::from(".keepsafe"), compression: true }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            kdf_iterations: 210_000,
            oracle_timeout_secs: 5,
            strength: StrengthConfig::default(),
            breach: BreachConfig::default(),
            url_safety: UrlSafetyConfig::default(),
        }
    }
}

impl Default for StrengthConfig {
    fn default() -> Self {
        Self { dictionary_mode: DictionaryMode::Substring, case_sensitive: false, min_word_len: 4 }
    }
}

impl Default for BreachConfig {
    fn default() -> Self {
        Self { enabled: true, endpoint: "https://api.pwnedpasswords.com".to_owned() }
    }
}

impl Default for UrlSafetyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "https://safebrowsing.googleapis.com/v4/threatMatches:find".to_owned(),
            api_key: None,
            client_id: "keepsafe".to_owned(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { enabled: false, request_timeout_secs: 15 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "warn".to_owned(), dir: None, json: false }
    }
}
