use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Custom error type for config loading.
#[cardly_derive::cardly_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Environment prefix; `CARDLY__DATABASE__URL` maps to `database.url`.
pub const ENV_PREFIX: &str = "CARDLY";

/// Loads a configuration that combines file-based settings with environment overrides.
///
/// 1. **Base file**: `server.toml` (or any format the `config` crate detects) unless
///    `path` is given. The file is optional; missing sections fall back to defaults.
/// 2. **Environment**: variables prefixed with `CARDLY__`, nested with `__`.
///
/// # Errors
/// The file exists but cannot be parsed, or the merged values do not match `T`.
///
/// # Example
/// ```rust
/// use cardly_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct AppConfig {
///     port: u16,
/// }
///
/// let cfg: AppConfig = load_config(Some("config/local")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> std::result::Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let effective_path = path.map_or_else(|| PathBuf::from("server"), |p| p.as_ref().to_path_buf());

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("server.cors_origins")
                .with_list_parse_key("security.admin_emails")
                .try_parsing(true),
        );

    info!("Loading config from {}", effective_path.display());

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}
