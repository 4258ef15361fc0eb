use super::error::ApiError;
use super::state::ApiState;
use crate::security::{SecurityError, TokenPurpose};
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use cardly_domain::role::Role;

/// The authenticated caller, resolved from an `Authorization: Bearer` access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub role: Role,
}

/// A [`CurrentUser`] holding the admin role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUser(pub CurrentUser);

fn bearer_token(parts: &Parts) -> Result<&str, SecurityError> {
    let missing = || SecurityError::Unauthorized {
        message: "missing bearer token".into(),
        context: None,
    };
    let header = parts.headers.get(AUTHORIZATION).ok_or_else(missing)?;
    let value = header.to_str().map_err(|_| missing())?;
    let (scheme, token) = value.split_once(' ').ok_or_else(missing)?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(missing());
    }
    Ok(token.trim())
}

impl<S> FromRequestParts<S> for CurrentUser
where
    ApiState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = ApiState::from_ref(state);
        let token = bearer_token(parts)?;
        let claims = state.jwt.verify(token, TokenPurpose::Access)?;
        Ok(Self { id: claims.sub, role: claims.role })
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    ApiState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if !user.role.is_admin() {
            return Err(SecurityError::Forbidden {
                message: "administrator role required".into(),
                context: None,
            }
            .into());
        }
        Ok(Self(user))
    }
}
