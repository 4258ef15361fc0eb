use cardly_billing::BillingError;
use cardly_cards::CardsError;
use cardly_database::DatabaseError;
use cardly_event_bus::EventBusError;
use std::borrow::Cow;

/// A specialized [`AnalyticsError`] enum of this crate.
#[cardly_derive::cardly_error]
pub enum AnalyticsError {
    #[api_status(UNPROCESSABLE_ENTITY)]
    #[error("{message}{}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[api_status(NOT_FOUND)]
    #[error("{message}{}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Card lookup failed{}: {source}", format_context(.context))]
    Cards {
        #[source]
        source: CardsError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Tier lookup failed{}: {source}", format_context(.context))]
    Billing {
        #[source]
        source: BillingError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Analytics storage error{}: {source}", format_context(.context))]
    Database {
        #[source]
        source: DatabaseError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Analytics query failed{}: {source}", format_context(.context))]
    Surreal {
        #[source]
        source: surrealdb::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Event bus error{}: {source}", format_context(.context))]
    Events {
        #[source]
        source: EventBusError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Internal analytics error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl AnalyticsError {
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
