use cardly_derive::cardly_error;
use std::borrow::Cow;

#[cardly_error]
#[derive(Debug)]
pub enum QuotaError {
    #[error("quota exceeded: {message}")]
    Exceeded { message: Cow<'static, str> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn main() {
    let err = QuotaError::Exceeded { message: Cow::Borrowed("storage") };
    assert_eq!(err.to_string(), "quota exceeded: storage");
}
