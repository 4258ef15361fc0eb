use super::health;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Routes owned by no feature slice. Building it also starts the uptime clock.
pub fn system_router<S>() -> OpenApiRouter<S>
where
    S: Send + Sync + Clone + 'static,
{
    health::started();
    OpenApiRouter::new().routes(routes!(health::health))
}
