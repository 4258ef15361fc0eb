use std::borrow::Cow;

#[cardly_derive::cardly_error]
pub enum MailError {
    #[error("Invalid e-mail{}: {message}", format_context(.context))]
    Invalid { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Mail delivery failed{}: {message}", format_context(.context))]
    Delivery { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
