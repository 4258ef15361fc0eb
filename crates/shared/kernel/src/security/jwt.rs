use super::error::SecurityError;
use crate::time;
use cardly_domain::config::JwtConfig;
use cardly_domain::role::Role;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

const DEV_SECRET: &str = "dev-only-change-me";

/// What a token may be used for. Only `Access` tokens authenticate API calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    Access,
    /// Issued after a correct password while a second factor is still required.
    Mfa,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub purpose: TokenPurpose,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

/// HS256 encoder/decoder bound to the configured issuer, audience and lifetimes.
#[derive(Clone)]
pub struct JwtCodec {
    inner: Arc<JwtCodecInner>,
}

struct JwtCodecInner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: Option<String>,
    access_ttl: i64,
    mfa_ttl: i64,
}

impl fmt::Debug for JwtCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtCodec")
            .field("issuer", &self.inner.issuer)
            .field("audience", &self.inner.audience)
            .field("access_ttl", &self.inner.access_ttl)
            .finish_non_exhaustive()
    }
}

impl JwtCodec {
    /// # Errors
    /// [`SecurityError::Config`] when the secret is empty or a lifetime is zero.
    pub fn new(config: &JwtConfig) -> Result<Self, SecurityError> {
        if config.secret.is_empty() {
            return Err(SecurityError::Config { message: "JWT secret is empty".into(), context: None });
        }
        if config.ttl_seconds == 0 || config.mfa_ttl_seconds == 0 {
            return Err(SecurityError::Config {
                message: "token lifetimes must be positive".into(),
                context: None,
            });
        }
        if config.secret == DEV_SECRET {
            warn!("Using the development JWT secret; set security.jwt.secret in production");
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.clock_skew_seconds;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience.as_str()]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            inner: Arc::new(JwtCodecInner {
                encoding: EncodingKey::from_secret(config.secret.as_bytes()),
                decoding: DecodingKey::from_secret(config.secret.as_bytes()),
                validation,
                issuer: config.issuer.clone(),
                audience: config.audience.clone(),
                access_ttl: i64::try_from(config.ttl_seconds).unwrap_or(i64::MAX / 2),
                mfa_ttl: i64::try_from(config.mfa_ttl_seconds).unwrap_or(i64::MAX / 2),
            }),
        })
    }

    /// Signs a token for `subject`; the lifetime depends on the purpose.
    pub fn issue(
        &self,
        subject: &str,
        role: Role,
        purpose: TokenPurpose,
    ) -> Result<IssuedToken, SecurityError> {
        let iat = time::now();
        let ttl = match purpose {
            TokenPurpose::Access => self.inner.access_ttl,
            TokenPurpose::Mfa => self.inner.mfa_ttl,
        };
        let claims = Claims {
            sub: subject.to_owned(),
            role,
            purpose,
            iat,
            exp: iat.saturating_add(ttl),
            iss: self.inner.issuer.clone(),
            aud: self.inner.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.inner.encoding)?;
        Ok(IssuedToken { token, expires_at: claims.exp })
    }

    /// Verifies signature, expiry, issuer and audience, then checks the purpose.
    ///
    /// # Errors
    /// [`SecurityError::Unauthorized`] for any invalid token.
    pub fn verify(&self, token: &str, purpose: TokenPurpose) -> Result<Claims, SecurityError> {
        let data = decode::<Claims>(token, &self.inner.decoding, &self.inner.validation)
            .map_err(|err| {
                debug!(error = %err, "Rejected token");
                SecurityError::Unauthorized { message: "invalid or expired token".into(), context: None }
            })?;
        if data.claims.purpose != purpose {
            return Err(SecurityError::Unauthorized {
                message: "token cannot be used here".into(),
                context: None,
            });
        }
        Ok(data.claims)
    }
}
