use std::borrow::Cow;

/// Errors that can occur during event bus operations.
#[cardly_derive::cardly_error]
pub enum EventBusError {
    /// The type registry holds a sender of another type; an invariant violation.
    #[error("Type mismatch{}: {message}", format_context(.context))]
    TypeMismatch { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Capacity must be greater than zero.
    #[error("Invalid capacity{}: {message}", format_context(.context))]
    InvalidCapacity { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
