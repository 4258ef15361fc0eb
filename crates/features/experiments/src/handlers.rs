use crate::Experiments;
use crate::model::{
    AssignRequest, Assignment, ConvertRequest, ConvertResponse, CreateExperimentRequest,
    Experiment, ExperimentResults, UpdateExperimentRequest,
};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use cardly_derive::api_handler;
use cardly_domain::constants::{EXPERIMENTS_TAG, PUBLIC_TAG};
use cardly_kernel::server::{AdminUser, ApiJson, ApiResult, ApiState, ErrorBody};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

pub(crate) fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(list_experiments, create_experiment))
        .routes(routes!(get_experiment, update_experiment))
        .routes(routes!(experiment_results))
        .routes(routes!(assign))
        .routes(routes!(convert))
}

// --- Admin ---

#[api_handler(
    get,
    path = "/api/admin/experiments",
    responses((status = OK, body = Vec<Experiment>), (status = FORBIDDEN, body = ErrorBody)),
    security(("bearer" = [])),
    tag = EXPERIMENTS_TAG,
)]
async fn list_experiments(State(state): State<ApiState>, _admin: AdminUser) -> ApiResult<Json<Vec<Experiment>>> {
    let experiments = state.try_get_slice::<Experiments>()?;
    Ok(Json(experiments.list().await?))
}

#[api_handler(
    post,
    path = "/api/admin/experiments",
    request_body = CreateExperimentRequest,
    responses(
        (status = CREATED, body = Experiment),
        (status = CONFLICT, body = ErrorBody),
        (status = UNPROCESSABLE_ENTITY, body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = EXPERIMENTS_TAG,
)]
async fn create_experiment(
    State(state): State<ApiState>,
    AdminUser(admin): AdminUser,
    ApiJson(body): ApiJson<CreateExperimentRequest>,
) -> ApiResult<(StatusCode, Json<Experiment>)> {
    let experiments = state.try_get_slice::<Experiments>()?;
    let experiment = experiments.create(body).await?;
    tracing::info!(admin = %admin.id, experiment = %experiment.key, "Admin created experiment");
    Ok((StatusCode::CREATED, Json(experiment)))
}

#[api_handler(
    get,
    path = "/api/admin/experiments/{key}",
    params(("key" = String, Path, description = "Experiment key")),
    responses((status = OK, body = Experiment), (status = NOT_FOUND, body = ErrorBody)),
    security(("bearer" = [])),
    tag = EXPERIMENTS_TAG,
)]
async fn get_experiment(
    State(state): State<ApiState>,
    _admin: AdminUser,
    Path(key): Path<String>,
) -> ApiResult<Json<Experiment>> {
    let experiments = state.try_get_slice::<Experiments>()?;
    Ok(Json(experiments.get(&key).await?))
}

#[api_handler(
    patch,
    path = "/api/admin/experiments/{key}",
    params(("key" = String, Path, description = "Experiment key")),
    request_body = UpdateExperimentRequest,
    responses(
        (status = OK, body = Experiment),
        (status = NOT_FOUND, body = ErrorBody),
        (status = CONFLICT, description = "Transition or edit not allowed", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = EXPERIMENTS_TAG,
)]
async fn update_experiment(
    State(state): State<ApiState>,
    _admin: AdminUser,
    Path(key): Path<String>,
    ApiJson(body): ApiJson<UpdateExperimentRequest>,
) -> ApiResult<Json<Experiment>> {
    let experiments = state.try_get_slice::<Experiments>()?;
    Ok(Json(experiments.update(&key, body).await?))
}

#[api_handler(
    get,
    path = "/api/admin/experiments/{key}/results",
    params(("key" = String, Path, description = "Experiment key")),
    responses((status = OK, body = ExperimentResults), (status = NOT_FOUND, body = ErrorBody)),
    security(("bearer" = [])),
    tag = EXPERIMENTS_TAG,
)]
async fn experiment_results(
    State(state): State<ApiState>,
    _admin: AdminUser,
    Path(key): Path<String>,
) -> ApiResult<Json<ExperimentResults>> {
    let experiments = state.try_get_slice::<Experiments>()?;
    Ok(Json(experiments.results(&key).await?))
}

// --- Public ---

#[api_handler(
    post,
    path = "/api/public/experiments/{key}/assign",
    params(("key" = String, Path, description = "Experiment key")),
    request_body = AssignRequest,
    responses((status = OK, body = Assignment), (status = NOT_FOUND, body = ErrorBody)),
    tag = PUBLIC_TAG,
)]
async fn assign(
    State(state): State<ApiState>,
    Path(key): Path<String>,
    ApiJson(body): ApiJson<AssignRequest>,
) -> ApiResult<Json<Assignment>> {
    let experiments = state.try_get_slice::<Experiments>()?;
    Ok(Json(experiments.assign(&key, &body.session).await?))
}

#[api_handler(
    post,
    path = "/api/public/experiments/{key}/convert",
    params(("key" = String, Path, description = "Experiment key")),
    request_body = ConvertRequest,
    responses(
        (status = OK, body = ConvertResponse),
        (status = NOT_FOUND, description = "Unknown experiment or unassigned session", body = ErrorBody),
    ),
    tag = PUBLIC_TAG,
)]
async fn convert(
    State(state): State<ApiState>,
    Path(key): Path<String>,
    ApiJson(body): ApiJson<ConvertRequest>,
) -> ApiResult<Json<ConvertResponse>> {
    let experiments = state.try_get_slice::<Experiments>()?;
    Ok(Json(experiments.convert(&key, &body.session, body.goal.as_deref()).await?))
}
