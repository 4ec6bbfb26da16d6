use ksafe_derive::ksafe_error;
use std::borrow::Cow;

#[ksafe_error]
pub enum ProbeError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn failing_io() -> Result<(), std::io::Error> {
    Err(std::io::Error::other("disk gone"))
}

#[test]
fn source_errors_convert_with_question_mark() {
    fn run() -> Result<(), ProbeError> {
        failing_io()?;
        Ok(())
    }

    let err = run().unwrap_err();
    assert!(matches!(err, ProbeError::Io { context: None, .. }));
    assert_eq!(err.to_string(), "IO error: disk gone");
}

#[test]
fn context_is_attached_to_source_results() {
    let err = failing_io().context("writing vault").unwrap_err();
    assert_eq!(err.to_string(), "IO error (writing vault): disk gone");
}

#[test]
fn context_overrides_on_own_results() {
    let res: Result<(), ProbeError> = Err("broken invariant".into());
    let err = res.context("loading").unwrap_err();
    assert_eq!(err.to_string(), "Internal error (loading): broken invariant");
}

#[test]
fn owned_strings_map_to_internal() {
    let err = ProbeError::from(format!("id {} missing", 7));
    assert!(matches!(err, ProbeError::Internal { ref message, .. } if message == "id 7 missing"));
}
