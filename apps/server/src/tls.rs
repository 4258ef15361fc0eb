use anyhow::{Context, Result, bail};
use axum_server::tls_rustls::RustlsConfig;
use cardly::domain::config::SslConfig;
use tracing::warn;

/// Fails early when the configured certificate or key is missing.
pub fn verify(ssl: &SslConfig) -> Result<()> {
    for (label, path) in [("certificate", &ssl.cert), ("key", &ssl.key)] {
        if !path.is_file() {
            bail!("SSL {label} not found at: {}", path.display());
        }
    }
    warn_if_readable_by_others(ssl)
}

#[cfg(unix)]
fn warn_if_readable_by_others(ssl: &SslConfig) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = ssl.key.metadata().context("Reading SSL key metadata")?.permissions().mode();
    if mode & 0o077 != 0 {
        warn!(key = %ssl.key.display(), mode = format_args!("{mode:o}"), "SSL key is group or world accessible");
    }
    Ok(())
}

#[cfg(not(unix))]
fn warn_if_readable_by_others(_: &SslConfig) -> Result<()> {
    Ok(())
}

pub async fn load(ssl: &SslConfig) -> Result<RustlsConfig> {
    RustlsConfig::from_pem_file(&ssl.cert, &ssl.key).await.context("Loading SSL certificates")
}
