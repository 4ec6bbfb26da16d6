use crate::error::LoggerError;
use std::str::FromStr;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// HTTP and TLS internals are chatty at `debug`.
const QUIET_DEPENDENCIES: [&str; 4] = ["hyper=warn", "hyper_util=warn", "reqwest=warn", "rustls=warn"];

/// Parses a textual level (`"trace"`, `"debug"`, `"info"`, `"warn"`, `"error"`, `"off"`).
///
/// # Errors
/// [`LoggerError::InvalidConfiguration`] for anything else.
pub fn parse_level(level: &str) -> Result<LevelFilter, LoggerError> {
    LevelFilter::from_str(level.trim()).map_err(|e| LoggerError::InvalidConfiguration {
        message: format!("unknown log level '{level}': {e}").into(),
        context: None,
    })
}

/// Picks directives in order: explicit filter, then `RUST_LOG`, then the quiet defaults.
///
/// The builder's default directive only applies to an empty directive string, so the
/// level is always spelled out as the leading global directive.
pub(crate) fn directives(
    level: LevelFilter,
    explicit: Option<&str>,
) -> Result<EnvFilter, LoggerError> {
    let base = EnvFilter::builder().with_default_directive(level.into());

    match explicit {
        Some(filter) => {
            base.parse(format!("{level},{filter}")).map_err(|e| LoggerError::InvalidConfiguration {
                message: format!("invalid filter '{filter}': {e}").into(),
                context: None,
            })
        },
        None if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() => Ok(base.from_env_lossy()),
        None => Ok(base.parse_lossy(quiet_defaults(level))),
    }
}

fn quiet_defaults(level: LevelFilter) -> String {
    std::iter::once(level.to_string())
        .chain(QUIET_DEPENDENCIES.iter().map(|d| (*d).to_owned()))
        .collect::<Vec<_>>()
        .join(",")
}
