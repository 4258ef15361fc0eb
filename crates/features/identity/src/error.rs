use cardly_database::DatabaseError;
use cardly_kernel::security::SecurityError;
use cardly_settings::SettingsError;
use std::borrow::Cow;

/// A specialized [`IdentityError`] enum of this crate.
#[cardly_derive::cardly_error]
pub enum IdentityError {
    #[api_status(UNPROCESSABLE_ENTITY)]
    #[error("{message}{}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Wrong e-mail/password pair; the message never says which part was wrong.
    #[api_status(UNAUTHORIZED)]
    #[error("invalid credentials")]
    InvalidCredentials { context: Option<Cow<'static, str>> },

    /// Bad or expired one-time token, MFA token or TOTP code.
    #[api_status(UNAUTHORIZED)]
    #[error("{message}{}", format_context(.context))]
    Unauthorized { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[api_status(FORBIDDEN)]
    #[error("{message}{}", format_context(.context))]
    Forbidden { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[api_status(NOT_FOUND)]
    #[error("{message}{}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[api_status(CONFLICT)]
    #[error("{message}{}", format_context(.context))]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[api_status(TOO_MANY_REQUESTS)]
    #[error("too many failed attempts, try again in {retry_after} seconds")]
    Locked { retry_after: i64, context: Option<Cow<'static, str>> },

    #[error("Password hashing failed{}: {message}", format_context(.context))]
    Hash { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Token error{}: {source}", format_context(.context))]
    Security {
        #[source]
        source: SecurityError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Identity storage error{}: {source}", format_context(.context))]
    Database {
        #[source]
        source: DatabaseError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Identity query failed{}: {source}", format_context(.context))]
    Surreal {
        #[source]
        source: surrealdb::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Identity settings error{}: {source}", format_context(.context))]
    Settings {
        #[source]
        source: SettingsError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Internal identity error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
