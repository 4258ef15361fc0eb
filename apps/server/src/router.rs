use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use cardly::domain::config::ServerConfig;
use cardly::kernel::server::{ApiState, BEARER_AUTH};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable};

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            BEARER_AUTH,
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Cardly API", description = "Digital business cards with NFC taps, lead capture and analytics"),
    modifiers(&BearerAuth)
)]
struct ApiDoc;

fn cors(cfg: &ServerConfig) -> Option<CorsLayer> {
    if cfg.cors_origins.is_empty() {
        return None;
    }
    let origin = if cfg.cors_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = cfg
            .cors_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };
    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
    )
}

#[allow(unreachable_pub)]
pub fn init(state: ApiState) -> Router {
    let server = state.config.server.clone();

    // Separate the OpenAPI routes and the API documentation object
    let (routes, api_doc) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(cardly::router())
        .layer(DefaultBodyLimit::max(server.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD)))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .split_for_parts();

    let app = Router::new().merge(routes).merge(Scalar::with_url("/docs", api_doc));
    match cors(&server) {
        Some(layer) => app.layer(layer),
        None => app,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documentation_declares_bearer_scheme() {
        let api = ApiDoc::openapi();
        let schemes = api.components.map(|c| c.security_schemes).unwrap_or_default();
        assert!(schemes.contains_key(BEARER_AUTH));
        assert_eq!(api.info.title, "Cardly API");
    }

    #[test]
    fn cors_is_off_without_origins() {
        assert!(cors(&ServerConfig::default()).is_none());
        let cfg = ServerConfig { cors_origins: vec!["https://app.cardly.io".into()], ..ServerConfig::default() };
        assert!(cors(&cfg).is_some());
    }
}
