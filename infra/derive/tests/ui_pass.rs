#[test]
fn ksafe_error_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/error_pass.rs");
    t.pass("tests/ui/error_message_only.rs");
    t.pass("tests/ui/error_shared_module.rs");
}
