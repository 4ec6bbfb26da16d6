use ksafe_derive::ksafe_error;
use std::borrow::Cow;

#[ksafe_error]
pub enum ValidationError {
    #[error("Missing field `{field}`")]
    Missing { field: &'static str },

    #[error("Rejected{}: {message}", format_context(.context))]
    Rejected { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn main() {
    let err: Result<(), ValidationError> =
        Err(ValidationError::Rejected { message: "duplicate".into(), context: None });
    let _ = err.context("creating record");
    let _ = ValidationError::Missing { field: "password" };
}
