use ksafe_derive::ksafe_error;
use std::borrow::Cow;

#[ksafe_error]
pub enum LookupError {
    #[error("Lookup failed{}: {message}", format_context(.context))]
    Failed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

#[ksafe_error]
pub enum AuditError {
    #[error("Audit cancelled{}: {message}", format_context(.context))]
    Cancelled { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Lookup error{}: {source}", Self::format_context(.context))]
    Lookup { source: LookupError, context: Option<Cow<'static, str>> },
}

fn main() {
    let lookup = LookupError::Failed { message: "offline".into(), context: None };
    let audit: AuditError = lookup.into();
    assert_eq!(audit.to_string(), "Lookup error: Lookup failed: offline");

    let failed: Result<(), LookupError> =
        Err(LookupError::Failed { message: "offline".into(), context: None });
    let wrapped = AuditErrorExt::context(failed, "record 3").unwrap_err();
    assert_eq!(wrapped.to_string(), "Lookup error (record 3): Lookup failed: offline");
}
