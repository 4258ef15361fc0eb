use cardly_derive::cardly_error;
use std::borrow::Cow;

#[cardly_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn read_missing() -> std::io::Result<()> {
    Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))
}

#[test]
fn cardly_error_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/cardly_error_pass.rs");
    t.pass("tests/ui/cardly_error_plain_variants.rs");
}

#[test]
fn context_is_attached_to_source_errors() {
    let result: Result<()> = read_missing().context("loading card template");
    let err = result.unwrap_err();

    assert!(matches!(err, DemoError::Io { .. }));
    assert_eq!(err.to_string(), "IO error (loading card template): gone");
}

#[test]
fn context_is_attached_to_own_errors() {
    let result: Result<()> =
        Err(DemoError::NotFound { message: Cow::Borrowed("card"), context: None });
    let err = result.context("public view").unwrap_err();

    assert_eq!(err.to_string(), "Not found (public view): card");
}

#[test]
fn question_mark_converts_sources() {
    fn load() -> Result<()> {
        read_missing()?;
        Ok(())
    }

    let err = load().unwrap_err();
    assert_eq!(err.to_string(), "IO error: gone");
}

#[test]
fn strings_become_internal_errors() {
    let borrowed: DemoError = "static failure".into();
    let owned: DemoError = String::from("owned failure").into();

    assert!(matches!(borrowed, DemoError::Internal { .. }));
    assert_eq!(owned.to_string(), "Internal error: owned failure");
}
