use crate::Settings;
use crate::model::{PutSettingRequest, Setting};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use cardly_derive::api_handler;
use cardly_domain::constants::{PUBLIC_TAG, SETTINGS_TAG};
use cardly_kernel::server::{AdminUser, ApiJson, ApiResult, ApiState, ErrorBody};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

pub(crate) fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(list_settings))
        .routes(routes!(put_setting, delete_setting))
        .routes(routes!(public_settings))
}

#[api_handler(
    get,
    path = "/api/admin/settings",
    responses((status = OK, body = Vec<Setting>), (status = FORBIDDEN, body = ErrorBody)),
    security(("bearer" = [])),
    tag = SETTINGS_TAG,
)]
async fn list_settings(
    State(state): State<ApiState>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<Setting>>> {
    let settings = state.try_get_slice::<Settings>()?;
    Ok(Json(settings.list().await?))
}

#[api_handler(
    put,
    path = "/api/admin/settings/{key}",
    params(("key" = String, Path, description = "Setting key, `[a-z0-9_.]{1,64}`")),
    request_body = PutSettingRequest,
    responses(
        (status = OK, body = Setting),
        (status = UNPROCESSABLE_ENTITY, body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = SETTINGS_TAG,
)]
async fn put_setting(
    State(state): State<ApiState>,
    AdminUser(admin): AdminUser,
    Path(key): Path<String>,
    ApiJson(body): ApiJson<PutSettingRequest>,
) -> ApiResult<Json<Setting>> {
    let settings = state.try_get_slice::<Settings>()?;
    let setting = settings.put(&key, body.value, body.public, Some(&admin.id)).await?;
    Ok(Json(setting))
}

#[api_handler(
    delete,
    path = "/api/admin/settings/{key}",
    params(("key" = String, Path, description = "Setting key")),
    responses((status = NO_CONTENT), (status = NOT_FOUND, body = ErrorBody)),
    security(("bearer" = [])),
    tag = SETTINGS_TAG,
)]
async fn delete_setting(
    State(state): State<ApiState>,
    _admin: AdminUser,
    Path(key): Path<String>,
) -> ApiResult<StatusCode> {
    let settings = state.try_get_slice::<Settings>()?;
    settings.delete(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[api_handler(
    get,
    path = "/api/public/settings",
    responses((status = OK, body = Vec<Setting>)),
    tag = PUBLIC_TAG,
)]
async fn public_settings(State(state): State<ApiState>) -> ApiResult<Json<Vec<Setting>>> {
    let settings = state.try_get_slice::<Settings>()?;
    Ok(Json(settings.public_settings().await?))
}
