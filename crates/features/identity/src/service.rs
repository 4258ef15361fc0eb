use crate::Identity;
use crate::error::{IdentityError, IdentityErrorExt};
use crate::model::{AuthResponse, TokenRow, TwoFactorSetupResponse, UserRow, UserView};
use crate::tokens::{self, TokenKind};
use crate::{password, totp};
use cardly_domain::constants::{SETTING_REGISTRATION_OPEN, SETTING_SITE_NAME};
use cardly_domain::role::Role;
use cardly_kernel::mail::Email;
use cardly_kernel::security::TokenPurpose;
use cardly_kernel::validation::{is_valid_email, normalize_email};
use cardly_kernel::{safe_nanoid, time};
use tracing::{debug, info, warn};

const USER_FIELDS: &str = "uid, email, password_hash, display_name, role, email_verified, \
    totp_secret, totp_pending, created_at, updated_at";

pub const MAX_DISPLAY_NAME_LEN: usize = 80;
const DEFAULT_ISSUER: &str = "Cardly";

fn unauthorized(message: &'static str) -> IdentityError {
    IdentityError::Unauthorized { message: message.into(), context: None }
}

fn validate_display_name(name: &str) -> Result<String, IdentityError> {
    let name = name.trim();
    let len = name.chars().count();
    if len == 0 || len > MAX_DISPLAY_NAME_LEN {
        return Err(IdentityError::Validation {
            message: "display name must be 1 to 80 characters".into(),
            context: None,
        });
    }
    Ok(name.to_owned())
}

impl Identity {
    // --- Accounts ---

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<AuthResponse, IdentityError> {
        let open = self
            .settings
            .get_bool(SETTING_REGISTRATION_OPEN, true)
            .await
            .context("Reading registration switch")?;
        if !open {
            return Err(IdentityError::Forbidden {
                message: "registration is closed".into(),
                context: None,
            });
        }

        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(IdentityError::Validation { message: "invalid e-mail address".into(), context: None });
        }
        password::validate_policy(password)?;
        let display_name = validate_display_name(display_name)?;

        if self.find_user("email", &email).await?.is_some() {
            return Err(IdentityError::Conflict {
                message: "an account with this e-mail already exists".into(),
                context: None,
            });
        }

        let role = if self.config.admin_emails.iter().any(|admin| normalize_email(admin) == email) {
            Role::Admin
        } else {
            Role::User
        };
        let now = time::now();
        let user = UserRow {
            uid: safe_nanoid!(),
            email,
            password_hash: password::hash(password.to_owned()).await?,
            display_name,
            role: role.as_str().to_owned(),
            email_verified: false,
            totp_secret: None,
            totp_pending: None,
            created_at: now,
            updated_at: now,
        };
        self.db.query("CREATE user CONTENT $row").bind(("row", user.clone())).await?.check()?;
        info!(user = %user.uid, role = %role, "Account registered");

        self.send_verification(&user).await?;
        self.session(&user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, IdentityError> {
        let email = normalize_email(email);
        let now = time::now();
        self.throttle.check(&email, now)?;

        let user = self.find_user("email", &email).await?;
        let valid = password::verify(password.to_owned(), user.as_ref().map(|u| u.password_hash.clone())).await?;
        let Some(user) = user.filter(|_| valid) else {
            if self.throttle.record_failure(&email, now) {
                warn!(email = %email, "Login locked after repeated failures");
            }
            return Err(IdentityError::InvalidCredentials { context: None });
        };
        self.throttle.clear(&email);

        if user.totp_secret.is_some() {
            let issued = self.jwt.issue(&user.uid, user.role(), TokenPurpose::Mfa)?;
            debug!(user = %user.uid, "Second factor required");
            return Ok(AuthResponse {
                user: user.view(),
                access_token: None,
                expires_at: None,
                mfa_required: true,
                mfa_token: Some(issued.token),
            });
        }

        info!(user = %user.uid, "Signed in");
        self.session(&user)
    }

    /// Exchanges an MFA token plus a TOTP code for an access token.
    pub async fn verify_mfa(&self, mfa_token: &str, code: &str) -> Result<AuthResponse, IdentityError> {
        let claims = self
            .jwt
            .verify(mfa_token, TokenPurpose::Mfa)
            .map_err(|_| unauthorized("invalid or expired sign-in attempt"))?;

        let throttle_key = format!("mfa:{}", claims.sub);
        let now = time::now();
        self.throttle.check(&throttle_key, now)?;

        let user = self.require_user(&claims.sub).await?;
        let Some(secret) = user.totp_secret.as_deref() else {
            return Err(unauthorized("two-factor authentication is not enabled"));
        };
        if !totp::verify(secret, code, now) {
            self.throttle.record_failure(&throttle_key, now);
            return Err(unauthorized("invalid code"));
        }
        self.throttle.clear(&throttle_key);

        info!(user = %user.uid, "Signed in with second factor");
        self.session(&user)
    }

    pub async fn me(&self, user_id: &str) -> Result<UserView, IdentityError> {
        Ok(self.require_user(user_id).await?.view())
    }

    pub async fn update_profile(&self, user_id: &str, display_name: &str) -> Result<UserView, IdentityError> {
        let display_name = validate_display_name(display_name)?;
        self.require_user(user_id).await?;
        self.db
            .query("UPDATE user SET display_name = $name, updated_at = $now WHERE uid = $uid")
            .bind(("name", display_name))
            .bind(("now", time::now()))
            .bind(("uid", user_id.to_owned()))
            .await?
            .check()?;
        self.me(user_id).await
    }

    // --- E-mail verification ---

    pub async fn verify_email(&self, token: &str) -> Result<UserView, IdentityError> {
        let owner = self.consume_token(token, TokenKind::VerifyEmail).await?;
        self.db
            .query("UPDATE user SET email_verified = true, updated_at = $now WHERE uid = $uid")
            .bind(("now", time::now()))
            .bind(("uid", owner.clone()))
            .await?
            .check()?;
        info!(user = %owner, "E-mail verified");
        self.me(&owner).await
    }

    pub async fn resend_verification(&self, user_id: &str) -> Result<(), IdentityError> {
        let user = self.require_user(user_id).await?;
        if user.email_verified {
            return Err(IdentityError::Conflict { message: "e-mail is already verified".into(), context: None });
        }
        self.send_verification(&user).await
    }

    // --- Passwords ---

    /// Always succeeds so callers cannot probe which e-mails have accounts.
    pub async fn forgot_password(&self, email: &str) -> Result<(), IdentityError> {
        let email = normalize_email(email);
        let Some(user) = self.find_user("email", &email).await? else {
            debug!("Password reset requested for unknown e-mail");
            return Ok(());
        };
        let token = self.issue_token(&user.uid, TokenKind::PasswordReset).await?;
        let link = self.public.public_link(&format!("reset-password?token={token}"));
        self.mailer.notify(&Email::new(
            &user.email,
            "Reset your password",
            format!("Hi {},\n\nReset your password within one hour:\n{link}\n\nIf you did not ask for this, ignore this message.\n", user.display_name),
        ));
        info!(user = %user.uid, "Password reset requested");
        Ok(())
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), IdentityError> {
        password::validate_policy(new_password)?;
        let owner = self.consume_token(token, TokenKind::PasswordReset).await?;
        self.set_password(&owner, new_password).await?;
        info!(user = %owner, "Password reset");
        Ok(())
    }

    pub async fn change_password(
        &self,
        user_id: &str,
        current: &str,
        new_password: &str,
    ) -> Result<(), IdentityError> {
        let user = self.require_user(user_id).await?;
        if !password::verify(current.to_owned(), Some(user.password_hash)).await? {
            return Err(IdentityError::InvalidCredentials { context: None });
        }
        password::validate_policy(new_password)?;
        self.set_password(user_id, new_password).await?;
        info!(user = %user_id, "Password changed");
        Ok(())
    }

    async fn set_password(&self, user_id: &str, new_password: &str) -> Result<(), IdentityError> {
        let hash = password::hash(new_password.to_owned()).await?;
        self.db
            .query("UPDATE user SET password_hash = $hash, updated_at = $now WHERE uid = $uid")
            .bind(("hash", hash))
            .bind(("now", time::now()))
            .bind(("uid", user_id.to_owned()))
            .await?
            .check()?;
        Ok(())
    }

    // --- Two-factor ---

    /// Generates a pending secret. It becomes active once a code from it is confirmed.
    pub async fn setup_2fa(&self, user_id: &str) -> Result<TwoFactorSetupResponse, IdentityError> {
        let user = self.require_user(user_id).await?;
        if user.totp_secret.is_some() {
            return Err(IdentityError::Conflict {
                message: "two-factor authentication is already enabled".into(),
                context: None,
            });
        }

        let secret = totp::generate_secret();
        self.db
            .query("UPDATE user SET totp_pending = $secret, updated_at = $now WHERE uid = $uid")
            .bind(("secret", secret.clone()))
            .bind(("now", time::now()))
            .bind(("uid", user_id.to_owned()))
            .await?
            .check()?;

        let issuer = self.settings.get_string(SETTING_SITE_NAME).await;
        let issuer = issuer.as_deref().unwrap_or(DEFAULT_ISSUER);
        Ok(TwoFactorSetupResponse {
            otpauth_uri: totp::otpauth_uri(issuer, &user.email, &secret),
            secret,
        })
    }

    pub async fn enable_2fa(&self, user_id: &str, code: &str) -> Result<UserView, IdentityError> {
        let user = self.require_user(user_id).await?;
        let Some(pending) = user.totp_pending else {
            return Err(IdentityError::Conflict {
                message: "start two-factor setup first".into(),
                context: None,
            });
        };
        if !totp::verify(&pending, code, time::now()) {
            return Err(unauthorized("invalid code"));
        }
        self.db
            .query("UPDATE user SET totp_secret = $secret, totp_pending = NONE, updated_at = $now WHERE uid = $uid")
            .bind(("secret", pending))
            .bind(("now", time::now()))
            .bind(("uid", user_id.to_owned()))
            .await?
            .check()?;
        info!(user = %user_id, "Two-factor enabled");
        self.me(user_id).await
    }

    pub async fn disable_2fa(&self, user_id: &str, code: &str) -> Result<UserView, IdentityError> {
        let user = self.require_user(user_id).await?;
        let Some(secret) = user.totp_secret else {
            return Err(IdentityError::Conflict {
                message: "two-factor authentication is not enabled".into(),
                context: None,
            });
        };
        if !totp::verify(&secret, code, time::now()) {
            return Err(unauthorized("invalid code"));
        }
        self.db
            .query("UPDATE user SET totp_secret = NONE, totp_pending = NONE, updated_at = $now WHERE uid = $uid")
            .bind(("now", time::now()))
            .bind(("uid", user_id.to_owned()))
            .await?
            .check()?;
        info!(user = %user_id, "Two-factor disabled");
        self.me(user_id).await
    }

    // --- Helpers ---

    async fn find_user(&self, field: &'static str, value: &str) -> Result<Option<UserRow>, IdentityError> {
        let rows: Vec<UserRow> = self
            .db
            .query(format!("SELECT {USER_FIELDS} FROM user WHERE {field} = $value LIMIT 1"))
            .bind(("value", value.to_owned()))
            .await?
            .take(0)?;
        Ok(rows.into_iter().next())
    }

    async fn require_user(&self, user_id: &str) -> Result<UserRow, IdentityError> {
        self.find_user("uid", user_id)
            .await?
            .ok_or_else(|| IdentityError::NotFound { message: "account not found".into(), context: None })
    }

    fn session(&self, user: &UserRow) -> Result<AuthResponse, IdentityError> {
        let issued = self.jwt.issue(&user.uid, user.role(), TokenPurpose::Access)?;
        Ok(AuthResponse {
            user: user.view(),
            access_token: Some(issued.token),
            expires_at: Some(issued.expires_at),
            mfa_required: false,
            mfa_token: None,
        })
    }

    async fn send_verification(&self, user: &UserRow) -> Result<(), IdentityError> {
        let token = self.issue_token(&user.uid, TokenKind::VerifyEmail).await?;
        let link = self.public.public_link(&format!("verify-email?token={token}"));
        self.mailer.notify(&Email::new(
            &user.email,
            "Verify your e-mail address",
            format!("Hi {},\n\nConfirm your e-mail address within 24 hours:\n{link}\n", user.display_name),
        ));
        Ok(())
    }

    /// Stores a new token, replacing any earlier one of the same kind, and returns it.
    async fn issue_token(&self, owner: &str, kind: TokenKind) -> Result<String, IdentityError> {
        let token = tokens::generate();
        let now = time::now();
        let row = TokenRow {
            token_hash: tokens::digest(&token),
            owner: owner.to_owned(),
            purpose: kind.as_str().to_owned(),
            expires_at: now + kind.ttl(),
            created_at: now,
        };
        self.db
            .query("DELETE user_token WHERE owner = $owner AND purpose = $purpose")
            .query("CREATE user_token CONTENT $row")
            .bind(("owner", owner.to_owned()))
            .bind(("purpose", kind.as_str().to_owned()))
            .bind(("row", row))
            .await?
            .check()?;
        Ok(token)
    }

    /// Deletes the token and returns its owner when it was valid for `kind`.
    async fn consume_token(&self, token: &str, kind: TokenKind) -> Result<String, IdentityError> {
        let hash = tokens::digest(token);
        let rows: Vec<TokenRow> = self
            .db
            .query("SELECT token_hash, owner, purpose, expires_at, created_at FROM user_token WHERE token_hash = $hash AND purpose = $purpose")
            .bind(("hash", hash.clone()))
            .bind(("purpose", kind.as_str().to_owned()))
            .await?
            .take(0)?;
        let Some(row) = rows.into_iter().next() else {
            return Err(unauthorized("invalid or expired token"));
        };

        self.db
            .query("DELETE user_token WHERE token_hash = $hash")
            .bind(("hash", hash))
            .await?
            .check()?;

        if row.expires_at <= time::now() {
            return Err(unauthorized("invalid or expired token"));
        }
        Ok(row.owner)
    }
}
