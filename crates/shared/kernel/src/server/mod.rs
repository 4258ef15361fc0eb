//! HTTP plumbing shared by every slice: state, error envelope, extractors and system routes.

mod auth;
mod context;
mod error;
mod health;
mod json;
mod router;
mod state;

pub use auth::{AdminUser, CurrentUser};
pub use axum::http::StatusCode;
pub use context::SliceContext;
pub use error::{ApiError, ApiResult, ErrorBody, ErrorDetail};
pub use json::ApiJson;
pub use router::system_router;
pub use state::{ApiState, ApiStateBuilder, ApiStateError, ApiStateErrorExt, ApiStateInner};

/// Name of the bearer security scheme referenced by protected handlers.
pub const BEARER_AUTH: &str = "bearer";
