use cardly_database::DatabaseError;
use cardly_event_bus::EventBusError;
use std::borrow::Cow;

/// A specialized [`BillingError`] enum of this crate.
#[cardly_derive::cardly_error]
pub enum BillingError {
    #[api_status(UNPROCESSABLE_ENTITY)]
    #[error("{message}{}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[api_status(NOT_FOUND)]
    #[error("{message}{}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[api_status(CONFLICT)]
    #[error("{message}{}", format_context(.context))]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Payments are disabled until a provider key (and prices) are configured.
    #[api_status(SERVICE_UNAVAILABLE)]
    #[error("{message}{}", format_context(.context))]
    NotConfigured { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[api_status(BAD_REQUEST)]
    #[error("Invalid webhook signature{}: {message}", format_context(.context))]
    InvalidSignature { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[api_status(BAD_REQUEST)]
    #[error("Malformed webhook payload{}: {source}", format_context(.context))]
    Payload {
        #[source]
        source: serde_json::Error,
        context: Option<Cow<'static, str>>,
    },

    /// The payment provider answered with an error.
    #[api_status(BAD_GATEWAY)]
    #[error("Payment provider error{}: {message}", format_context(.context))]
    Provider { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[api_status(BAD_GATEWAY)]
    #[error("Payment provider unreachable{}: {source}", format_context(.context))]
    Http {
        #[source]
        source: reqwest::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Billing storage error{}: {source}", format_context(.context))]
    Database {
        #[source]
        source: DatabaseError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Billing query failed{}: {source}", format_context(.context))]
    Surreal {
        #[source]
        source: surrealdb::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Billing event error{}: {source}", format_context(.context))]
    Events {
        #[source]
        source: EventBusError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Internal billing error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
