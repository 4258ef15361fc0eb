use cardly_billing::BillingError;
use cardly_cards::CardsError;
use cardly_database::DatabaseError;
use cardly_domain::tier::EntitlementViolation;
use std::borrow::Cow;

/// A specialized [`NfcError`] enum of this crate.
#[cardly_derive::cardly_error]
pub enum NfcError {
    #[api_status(UNPROCESSABLE_ENTITY)]
    #[error("{message}{}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[api_status(FORBIDDEN)]
    #[error("{message}{}", format_context(.context))]
    Entitlement { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[api_status(NOT_FOUND)]
    #[error("{message}{}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The tag belongs to another account.
    #[api_status(CONFLICT)]
    #[error("{message}{}", format_context(.context))]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

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

    #[error("NFC storage error{}: {source}", format_context(.context))]
    Database {
        #[source]
        source: DatabaseError,
        context: Option<Cow<'static, str>>,
    },

    #[error("NFC query failed{}: {source}", format_context(.context))]
    Surreal {
        #[source]
        source: surrealdb::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Internal NFC error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl From<EntitlementViolation> for NfcError {
    fn from(violation: EntitlementViolation) -> Self {
        Self::Entitlement { message: violation.to_string().into(), context: None }
    }
}

impl NfcError {
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
