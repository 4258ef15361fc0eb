use axum::Json;
use axum::http::header::{CACHE_CONTROL, PRAGMA};
use axum::response::IntoResponse;
use cardly_derive::{api_handler, api_model};
use cardly_domain::constants::SYSTEM_TAG;
use std::sync::OnceLock;
use std::time::Instant;

static STARTED: OnceLock<Instant> = OnceLock::new();

/// Liveness report served at `/health`.
#[api_model]
pub(super) struct HealthReport {
    status: String,
    version: String,
    /// Seconds since the router was built.
    uptime: u64,
}

#[api_handler(
    get,
    path = "/health",
    responses((status = OK, description = "Process is up", body = HealthReport)),
    tag = SYSTEM_TAG,
)]
pub(super) async fn health() -> impl IntoResponse {
    let report = HealthReport {
        status: "up".to_owned(),
        version: env!("CARGO_PKG_VERSION").to_owned(),
        uptime: started().elapsed().as_secs(),
    };
    ([(CACHE_CONTROL, "no-store, no-cache, must-revalidate"), (PRAGMA, "no-cache")], Json(report))
}

pub(super) fn started() -> Instant {
    *STARTED.get_or_init(Instant::now)
}
