use cardly_cards::CardsError;
use cardly_database::DatabaseError;
use std::borrow::Cow;

/// A specialized [`ContactsError`] enum of this crate.
#[cardly_derive::cardly_error]
pub enum ContactsError {
    #[api_status(UNPROCESSABLE_ENTITY)]
    #[error("{message}{}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[api_status(NOT_FOUND)]
    #[error("{message}{}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The card cannot take submissions.
    #[api_status(CONFLICT)]
    #[error("{message}{}", format_context(.context))]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Card lookup failed{}: {source}", format_context(.context))]
    Cards {
        #[source]
        source: CardsError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Contacts storage error{}: {source}", format_context(.context))]
    Database {
        #[source]
        source: DatabaseError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Contacts query failed{}: {source}", format_context(.context))]
    Surreal {
        #[source]
        source: surrealdb::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Stored contact fields are not valid JSON{}: {source}", format_context(.context))]
    Json {
        #[source]
        source: serde_json::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("CSV export failed{}: {source}", format_context(.context))]
    Csv {
        #[source]
        source: csv::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Internal contacts error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl ContactsError {
    pub(crate) fn not_found(what: &'static str) -> Self {
        Self::NotFound { message: format!("{what} not found").into(), context: None }
    }

    pub(crate) fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Validation { message: message.into(), context: None }
    }

    /// Keeps a missing card a 404 instead of wrapping it.
    pub(crate) fn from_lookup(err: CardsError) -> Self {
        match err {
            CardsError::NotFound { message, context } => Self::NotFound { message, context },
            source => Self::Cards { source, context: None },
        }
    }
}
