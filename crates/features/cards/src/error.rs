use cardly_billing::BillingError;
use cardly_database::DatabaseError;
use cardly_domain::tier::EntitlementViolation;
use cardly_event_bus::EventBusError;
use std::borrow::Cow;

/// A specialized [`CardsError`] enum of this crate.
#[cardly_derive::cardly_error]
pub enum CardsError {
    #[api_status(UNPROCESSABLE_ENTITY)]
    #[error("{message}{}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The owner's tier does not allow the operation.
    #[api_status(FORBIDDEN)]
    #[error("{message}{}", format_context(.context))]
    Entitlement { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[api_status(NOT_FOUND)]
    #[error("{message}{}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[api_status(CONFLICT)]
    #[error("{message}{}", format_context(.context))]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Tier lookup failed{}: {source}", format_context(.context))]
    Billing {
        #[source]
        source: BillingError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Cards storage error{}: {source}", format_context(.context))]
    Database {
        #[source]
        source: DatabaseError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Cards query failed{}: {source}", format_context(.context))]
    Surreal {
        #[source]
        source: surrealdb::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Stored component content is not valid JSON{}: {source}", format_context(.context))]
    Json {
        #[source]
        source: serde_json::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Page rendering failed{}: {source}", format_context(.context))]
    Template {
        #[source]
        source: askama::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Event bus error{}: {source}", format_context(.context))]
    Events {
        #[source]
        source: EventBusError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Internal cards error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl From<EntitlementViolation> for CardsError {
    fn from(violation: EntitlementViolation) -> Self {
        Self::Entitlement { message: violation.to_string().into(), context: None }
    }
}

impl CardsError {
    pub(crate) fn not_found(what: &'static str) -> Self {
        Self::NotFound { message: format!("{what} not found").into(), context: None }
    }

    pub(crate) fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Validation { message: message.into(), context: None }
    }
}
