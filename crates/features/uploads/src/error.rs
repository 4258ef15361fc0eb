use cardly_billing::BillingError;
use cardly_database::DatabaseError;
use cardly_storage::StorageError;
use std::borrow::Cow;

/// A specialized [`UploadsError`] enum of this crate.
#[cardly_derive::cardly_error]
pub enum UploadsError {
    #[api_status(UNPROCESSABLE_ENTITY)]
    #[error("{message}{}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[api_status(PAYLOAD_TOO_LARGE)]
    #[error("{message}{}", format_context(.context))]
    TooLarge { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The owner's storage quota would be exceeded.
    #[api_status(FORBIDDEN)]
    #[error("{message}{}", format_context(.context))]
    QuotaExceeded { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[api_status(UNSUPPORTED_MEDIA_TYPE)]
    #[error("{message}{}", format_context(.context))]
    UnsupportedMedia { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[api_status(NOT_FOUND)]
    #[error("{message}{}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[api_status(BAD_REQUEST)]
    #[error("Malformed multipart body{}: {source}", format_context(.context))]
    Multipart {
        #[source]
        source: axum::extract::multipart::MultipartError,
        context: Option<Cow<'static, str>>,
    },

    #[error("File storage error{}: {source}", format_context(.context))]
    Storage {
        #[source]
        source: StorageError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Tier lookup failed{}: {source}", format_context(.context))]
    Billing {
        #[source]
        source: BillingError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Upload storage error{}: {source}", format_context(.context))]
    Database {
        #[source]
        source: DatabaseError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Upload query failed{}: {source}", format_context(.context))]
    Surreal {
        #[source]
        source: surrealdb::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Internal upload error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl UploadsError {
    pub(crate) fn not_found(what: &'static str) -> Self {
        Self::NotFound { message: format!("{what} not found").into(), context: None }
    }

    pub(crate) fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Validation { message: message.into(), context: None }
    }

    pub(crate) fn unsupported(message: impl Into<Cow<'static, str>>) -> Self {
        Self::UnsupportedMedia { message: message.into(), context: None }
    }

    /// A file missing on disk is a missing upload, not an I/O failure.
    pub(crate) fn from_read(err: StorageError) -> Self {
        match err {
            StorageError::FileNotFound { .. } => Self::not_found("file"),
            source => Self::Storage { source, context: None },
        }
    }
}
