use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level API configuration shared across services.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfigInner {
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub billing: BillingConfig,
    pub experiments: ExperimentsConfig,
    pub logging: LoggingConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(flatten, default)]
    inner: Arc<ApiConfigInner>,
}

impl Deref for ApiConfig {
    type Target = ApiConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for ApiConfig {
    fn deref_mut(&mut self) -> &mut ApiConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    pub ssl: Option<SslConfig>,
    /// Externally visible base URL, used for redirects and links in e-mails.
    pub public_url: String,
    pub cors_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// `public_url` joined with `path`, without a doubled slash.
    #[must_use]
    pub fn public_link(&self, path: &str) -> String {
        format!("{}/{}", self.public_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

/// TLS certificate/key paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SslConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// `SurrealDB` connection configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub credentials: Option<DatabaseCredentials>,
}

/// `SurrealDB` root credentials (optional for unauthenticated engines like mem://).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub jwt: JwtConfig,
    pub login: LoginConfig,
    /// Accounts registered with these e-mails receive the admin role.
    pub admin_emails: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: Option<String>,
    pub ttl_seconds: u64,
    pub clock_skew_seconds: u64,
    /// Lifetime of the intermediate token issued while a second factor is pending.
    pub mfa_ttl_seconds: u64,
}

/// Brute-force protection for password logins.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    pub max_failures: u32,
    pub lockout_seconds: u64,
}

/// Stripe-compatible payment provider settings. Checkout is disabled until
/// `stripe_secret_key` is set.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    pub stripe_secret_key: Option<String>,
    pub webhook_secret: Option<String>,
    pub webhook_tolerance_seconds: u64,
    pub success_url: String,
    pub cancel_url: String,
    pub api_base: String,
    pub prices: PriceConfig,
    pub grace_days: u32,
}

/// Provider price identifiers per paid tier and interval.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PriceConfig {
    pub pro_monthly: Option<String>,
    pub pro_yearly: Option<String>,
    pub premium_monthly: Option<String>,
    pub premium_yearly: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExperimentsConfig {
    pub assignment_cache_capacity: u64,
    pub assignment_cache_ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub filter: Option<String>,
    /// Directory for rolling log files; console only when unset.
    pub path: Option<PathBuf>,
    pub json: bool,
}

// --- Default ---

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            ssl: None,
            public_url: "http://localhost:8080".to_owned(),
            cors_origins: Vec::new(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Default for SslConfig {
    fn default() -> Self {
        Self { cert: PathBuf::from("cert.pem"), key: PathBuf::from("key.pem") }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "mem://".to_owned(),
            namespace: "cardly".to_owned(),
            database: "main".to_owned(),
            credentials: None,
        }
    }
}

impl Default for DatabaseCredentials {
    fn default() -> Self {
        Self { username: "root".to_owned(), password: "root".to_owned() }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: PathBuf::from("data") }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "dev-only-change-me".to_owned(),
            issuer: "cardly".to_owned(),
            audience: None,
            ttl_seconds: 3600,
            clock_skew_seconds: 60,
            mfa_ttl_seconds: 300,
        }
    }
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self { max_failures: 5, lockout_seconds: 900 }
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            stripe_secret_key: None,
            webhook_secret: None,
            webhook_tolerance_seconds: 300,
            success_url: "http://localhost:8080/billing/success".to_owned(),
            cancel_url: "http://localhost:8080/billing/cancel".to_owned(),
            api_base: "https://api.stripe.com".to_owned(),
            prices: PriceConfig::default(),
            grace_days: 3,
        }
    }
}

impl Default for ExperimentsConfig {
    fn default() -> Self {
        Self { assignment_cache_capacity: 100_000, assignment_cache_ttl_seconds: 86_400 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), filter: None, path: None, json: false }
    }
}
