//! Identity feature slice.
//!
//! Accounts with Argon2id password hashes, HS256 access tokens, e-mail verification and
//! password reset through single-use tokens, a per-e-mail login lockout and optional
//! TOTP second factor.

mod error;
mod handlers;
mod migrations;
mod model;
mod password;
mod service;
mod throttle;
mod tokens;
pub mod totp;

pub use crate::error::{IdentityError, IdentityErrorExt};
pub use crate::migrations::MIGRATIONS;
pub use crate::model::{
    AuthResponse, ChangePasswordRequest, CodeRequest, ForgotPasswordRequest, LoginRequest,
    MfaRequest, RegisterRequest, ResetPasswordRequest, TokenRequest, TwoFactorSetupResponse,
    UpdateProfileRequest, UserView,
};
pub use crate::password::{MAX_PASSWORD_LEN, MIN_PASSWORD_LEN, validate_policy};
pub use crate::service::MAX_DISPLAY_NAME_LEN;

use crate::throttle::LoginThrottle;
use cardly_database::Database;
use cardly_domain::config::{SecurityConfig, ServerConfig};
use cardly_kernel::mail::Mailer;
use cardly_kernel::security::JwtCodec;
use cardly_kernel::server::{ApiState, SliceContext};
use cardly_settings::Settings;
use utoipa_axum::router::OpenApiRouter;

/// Identity feature state
#[cardly_derive::cardly_slice]
#[derive(Debug)]
pub struct Identity {
    db: Database,
    settings: Settings,
    jwt: JwtCodec,
    mailer: Mailer,
    config: SecurityConfig,
    public: ServerConfig,
    throttle: LoginThrottle,
}

/// Builds the identity slice. Reads `registration.open` through `settings`.
pub fn init(ctx: &SliceContext, settings: Settings) -> Result<Identity, IdentityError> {
    let config = ctx.config.security.clone();
    let jwt = JwtCodec::new(&config.jwt)?;
    let throttle = LoginThrottle::new(&config.login);

    tracing::info!(admins = config.admin_emails.len(), "Identity slice initialized");
    Ok(Identity::new(IdentityInner {
        db: ctx.database.clone(),
        settings,
        jwt,
        mailer: ctx.mailer.clone(),
        config,
        public: ctx.config.server.clone(),
        throttle,
    }))
}

pub fn router() -> OpenApiRouter<ApiState> {
    handlers::router()
}
