use cardly_derive::api_model;
use cardly_domain::role::Role;
use surrealdb::types::SurrealValue;

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct UserRow {
    pub uid: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub role: String,
    pub email_verified: bool,
    pub totp_secret: Option<String>,
    pub totp_pending: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl UserRow {
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or_default()
    }

    pub fn view(&self) -> UserView {
        UserView {
            id: self.uid.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            role: self.role.clone(),
            email_verified: self.email_verified,
            two_factor_enabled: self.totp_secret.is_some(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct TokenRow {
    pub token_hash: String,
    pub owner: String,
    pub purpose: String,
    pub expires_at: i64,
    pub created_at: i64,
}

// --- API models ---

#[api_model]
#[derive(Clone, PartialEq, Eq)]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub display_name: String,
    #[schema(example = "user")]
    pub role: String,
    pub email_verified: bool,
    pub two_factor_enabled: bool,
    pub created_at: i64,
}

/// Result of register, login and MFA verification.
///
/// With two-factor enabled, login returns `mfa_required = true` and an `mfa_token` instead
/// of an access token.
#[api_model]
#[derive(Clone)]
pub struct AuthResponse {
    pub user: UserView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    pub mfa_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mfa_token: Option<String>,
}

#[api_model]
pub struct RegisterRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[api_model]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[api_model]
pub struct MfaRequest {
    pub mfa_token: String,
    #[schema(example = "123456")]
    pub code: String,
}

#[api_model]
pub struct TokenRequest {
    pub token: String,
}

#[api_model]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[api_model]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[api_model]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[api_model]
pub struct UpdateProfileRequest {
    pub display_name: String,
}

#[api_model]
pub struct TwoFactorSetupResponse {
    /// Base32 secret for manual entry.
    pub secret: String,
    pub otpauth_uri: String,
}

#[api_model]
pub struct CodeRequest {
    pub code: String,
}
