use std::borrow::Cow;

#[cardly_derive::cardly_error]
pub enum SecurityError {
    /// Missing, malformed, expired or wrong-purpose token.
    #[api_status(UNAUTHORIZED)]
    #[error("{message}{}", format_context(.context))]
    Unauthorized { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[api_status(FORBIDDEN)]
    #[error("{message}{}", format_context(.context))]
    Forbidden { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Security configuration error{}: {message}", format_context(.context))]
    Config { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Token encoding failed{}: {source}", format_context(.context))]
    Jwt {
        #[source]
        source: jsonwebtoken::errors::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Internal security error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
