use crate::Analytics;
use crate::model::{IngestRequest, IngestResponse, Summary, SummaryQuery};
use axum::Json;
use axum::extract::{Path, Query, State};
use cardly_derive::api_handler;
use cardly_domain::constants::{ANALYTICS_TAG, PUBLIC_TAG};
use cardly_kernel::server::{ApiJson, ApiResult, ApiState, CurrentUser, ErrorBody};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

pub(crate) fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new().routes(routes!(ingest)).routes(routes!(summary))
}

#[api_handler(
    post,
    path = "/api/public/events",
    request_body = IngestRequest,
    responses((status = OK, body = IngestResponse), (status = UNPROCESSABLE_ENTITY, body = ErrorBody)),
    tag = PUBLIC_TAG,
)]
async fn ingest(
    State(state): State<ApiState>,
    ApiJson(body): ApiJson<IngestRequest>,
) -> ApiResult<Json<IngestResponse>> {
    let analytics = state.try_get_slice::<Analytics>()?;
    Ok(Json(analytics.ingest(body.events).await?))
}

#[api_handler(
    get,
    path = "/api/analytics/cards/{id}",
    params(("id" = String, Path, description = "Card id"), SummaryQuery),
    responses((status = OK, body = Summary), (status = NOT_FOUND, body = ErrorBody)),
    security(("bearer" = [])),
    tag = ANALYTICS_TAG,
)]
async fn summary(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<SummaryQuery>,
) -> ApiResult<Json<Summary>> {
    let analytics = state.try_get_slice::<Analytics>()?;
    Ok(Json(analytics.summary(&user.id, &id, query.days).await?))
}
