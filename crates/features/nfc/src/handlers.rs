use crate::Nfc;
use crate::model::{NfcTag, RegisterTagRequest, UpdateTagRequest};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use cardly_derive::api_handler;
use cardly_domain::constants::{NFC_TAG_TAG, PUBLIC_TAG};
use cardly_kernel::server::{ApiJson, ApiResult, ApiState, CurrentUser, ErrorBody};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

pub(crate) fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(list_tags, register_tag))
        .routes(routes!(update_tag, remove_tag))
        .routes(routes!(tap))
}

#[api_handler(
    get,
    path = "/api/nfc",
    responses((status = OK, body = Vec<NfcTag>), (status = UNAUTHORIZED, body = ErrorBody)),
    security(("bearer" = [])),
    tag = NFC_TAG_TAG,
)]
async fn list_tags(State(state): State<ApiState>, user: CurrentUser) -> ApiResult<Json<Vec<NfcTag>>> {
    let nfc = state.try_get_slice::<Nfc>()?;
    Ok(Json(nfc.list(&user.id).await?))
}

#[api_handler(
    post,
    path = "/api/nfc",
    request_body = RegisterTagRequest,
    responses(
        (status = OK, body = NfcTag),
        (status = FORBIDDEN, description = "Tag limit reached", body = ErrorBody),
        (status = CONFLICT, description = "Tag owned by another account", body = ErrorBody),
        (status = UNPROCESSABLE_ENTITY, body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = NFC_TAG_TAG,
)]
async fn register_tag(
    State(state): State<ApiState>,
    user: CurrentUser,
    ApiJson(body): ApiJson<RegisterTagRequest>,
) -> ApiResult<Json<NfcTag>> {
    let nfc = state.try_get_slice::<Nfc>()?;
    Ok(Json(nfc.register(&user.id, body).await?))
}

#[api_handler(
    patch,
    path = "/api/nfc/{uid}",
    params(("uid" = String, Path, description = "Tag UID")),
    request_body = UpdateTagRequest,
    responses((status = OK, body = NfcTag), (status = NOT_FOUND, body = ErrorBody)),
    security(("bearer" = [])),
    tag = NFC_TAG_TAG,
)]
async fn update_tag(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path(uid): Path<String>,
    ApiJson(body): ApiJson<UpdateTagRequest>,
) -> ApiResult<Json<NfcTag>> {
    let nfc = state.try_get_slice::<Nfc>()?;
    Ok(Json(nfc.update(&user.id, &uid, body).await?))
}

#[api_handler(
    delete,
    path = "/api/nfc/{uid}",
    params(("uid" = String, Path, description = "Tag UID")),
    responses((status = NO_CONTENT), (status = NOT_FOUND, body = ErrorBody)),
    security(("bearer" = [])),
    tag = NFC_TAG_TAG,
)]
async fn remove_tag(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path(uid): Path<String>,
) -> ApiResult<StatusCode> {
    let nfc = state.try_get_slice::<Nfc>()?;
    nfc.remove(&user.id, &uid).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[api_handler(
    get,
    path = "/t/{uid}",
    params(("uid" = String, Path, description = "Tag UID as written on the tag")),
    responses(
        (status = TEMPORARY_REDIRECT, description = "Redirect to the card page"),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    tag = PUBLIC_TAG,
)]
async fn tap(State(state): State<ApiState>, Path(uid): Path<String>) -> ApiResult<Redirect> {
    let nfc = state.try_get_slice::<Nfc>()?;
    Ok(Redirect::temporary(&nfc.tap(&uid).await?))
}
