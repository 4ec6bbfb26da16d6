use std::borrow::Cow;

#[ksafe_derive::ksafe_error]
pub enum AnalyzerError {
    /// The session was closed while a pass was running.
    #[error("Security analysis cancelled{}: {message}", format_context(.context))]
    Cancelled { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid analyzer configuration{}: {message}", format_context(.context))]
    Configuration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Oracle setup failed{}: {source}", format_context(.context))]
    Oracle { source: OracleError, context: Option<Cow<'static, str>> },
}

/// Failure of a single oracle lookup. Callers treat it as "not flagged".
#[ksafe_derive::ksafe_error]
pub enum OracleError {
    #[error("Oracle request failed{}: {source}", format_context(.context))]
    Network { source: reqwest::Error, context: Option<Cow<'static, str>> },

    /// The service answered with something other than the documented format.
    #[error("Unexpected oracle response{}: {message}", format_context(.context))]
    Protocol { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
