use config::{Config, Environment, File, Map};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::Path;
use tracing::info;

/// Default configuration file stem, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "keepsafe";

/// Environment prefix; nested keys are joined with `__` (e.g. `KSAFE__SYNC__ENABLED`).
pub const ENV_PREFIX: &str = "KSAFE";

/// Custom error type for config loading.
#[ksafe_derive::ksafe_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Layered configuration loader: a file overlaid with `KSAFE__` environment variables.
///
/// 1. **Base File**: `path` if given (must exist), otherwise an optional `keepsafe.{toml,yaml,json}`
///    in the working directory. Missing defaults are fine when `T` is `#[serde(default)]`.
/// 2. **Environment Overrides**: `KSAFE__SECURITY__KDF_ITERATIONS=300000` maps to
///    `security.kdf_iterations`.
///
/// # Errors
/// * An explicit `path` that does not exist.
/// * Content that does not match the structure of `T`.
///
/// # Example
/// ```rust
/// use ksafe_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct AppConfig {
///     port: u16,
/// }
///
/// let cfg: AppConfig = load_config(Some("config/local")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    load_layered(path.as_ref().map(AsRef::as_ref), None)
}

fn load_layered<T>(path: Option<&Path>, env: Option<Map<String, String>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let file = path.map_or_else(
        || File::with_name(DEFAULT_CONFIG_FILE).required(false),
        |p| File::from(p).required(true),
    );

    let builder = Config::builder().add_source(file).add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .convert_case(config::Case::Snake)
            .try_parsing(true)
            .source(env),
    );

    match path {
        Some(p) => info!("Loading config from {}", p.display()),
        None => info!("Loading config from defaults and {ENV_PREFIX}__ environment"),
    }

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ksafe_domain::config::{DictionaryMode, KeepsafeConfig};

    fn env(pairs: &[(&str, &str)]) -> Option<Map<String, String>> {
        Some(pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect())
    }

    #[test]
    fn file_values_are_overridden_by_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keepsafe.toml");
        std::fs::write(
            &path,
            "[security]\nkdf_iterations = 300000\n\n[security.strength]\ndictionary_mode = \"whole_word\"\n",
        )
        .unwrap();

        let cfg: KeepsafeConfig = load_layered(
            Some(&path),
            env(&[("KSAFE__SECURITY__KDF_ITERATIONS", "400000"), ("KSAFE__SYNC__ENABLED", "true")]),
        )
        .unwrap();

        assert_eq!(cfg.security.kdf_iterations, 400_000);
        assert_eq!(cfg.security.strength.dictionary_mode, DictionaryMode::WholeWord);
        assert!(cfg.sync.enabled);
        assert_eq!(cfg.security.oracle_timeout_secs, 5);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let result: Result<KeepsafeConfig, _> = load_layered(Some(&missing), env(&[]));
        assert!(matches!(result, Err(ConfigError::Config { .. })));
    }
}
