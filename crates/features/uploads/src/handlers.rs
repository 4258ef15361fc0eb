use crate::Uploads;
use crate::error::UploadsError;
use crate::model::{StorageUsage, Upload, UploadForm};
use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use cardly_derive::api_handler;
use cardly_domain::constants::{PUBLIC_TAG, UPLOADS_TAG};
use cardly_kernel::server::{ApiResult, ApiState, CurrentUser, ErrorBody};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

const IMMUTABLE: &str = "public, max-age=31536000, immutable";

pub(crate) fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(list_uploads, upload_file))
        .routes(routes!(storage_usage))
        .routes(routes!(delete_upload))
        .routes(routes!(serve_file))
}

/// Collects the `file` and `purpose` parts; other parts are skipped.
async fn read_form(mut multipart: Multipart) -> Result<UploadForm, UploadsError> {
    let mut form = UploadForm::default();
    let mut has_file = false;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                form.file_name = field.file_name().map(str::to_owned);
                form.file = field.bytes().await?.to_vec();
                has_file = true;
            }
            Some("purpose") => {
                let raw = field.text().await?;
                let purpose = raw
                    .trim()
                    .parse()
                    .map_err(|_| UploadsError::validation(format!("unknown purpose '{}'", raw.trim())))?;
                form.purpose = Some(purpose);
            }
            _ => {}
        }
    }
    if !has_file {
        return Err(UploadsError::validation("multipart field 'file' is required"));
    }
    Ok(form)
}

#[api_handler(
    get,
    path = "/api/uploads",
    responses((status = OK, body = Vec<Upload>), (status = UNAUTHORIZED, body = ErrorBody)),
    security(("bearer" = [])),
    tag = UPLOADS_TAG,
)]
async fn list_uploads(State(state): State<ApiState>, user: CurrentUser) -> ApiResult<Json<Vec<Upload>>> {
    let uploads = state.try_get_slice::<Uploads>()?;
    Ok(Json(uploads.list(&user.id).await?))
}

#[api_handler(
    post,
    path = "/api/uploads",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = CREATED, body = Upload),
        (status = FORBIDDEN, description = "Storage quota exceeded", body = ErrorBody),
        (status = PAYLOAD_TOO_LARGE, body = ErrorBody),
        (status = UNSUPPORTED_MEDIA_TYPE, body = ErrorBody),
        (status = UNPROCESSABLE_ENTITY, body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = UPLOADS_TAG,
)]
async fn upload_file(
    State(state): State<ApiState>,
    user: CurrentUser,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Upload>)> {
    let uploads = state.try_get_slice::<Uploads>()?;
    let form = read_form(multipart).await?;
    Ok((StatusCode::CREATED, Json(uploads.upload(&user.id, form).await?)))
}

#[api_handler(
    get,
    path = "/api/uploads/usage",
    responses((status = OK, body = StorageUsage), (status = UNAUTHORIZED, body = ErrorBody)),
    security(("bearer" = [])),
    tag = UPLOADS_TAG,
)]
async fn storage_usage(State(state): State<ApiState>, user: CurrentUser) -> ApiResult<Json<StorageUsage>> {
    let uploads = state.try_get_slice::<Uploads>()?;
    Ok(Json(uploads.usage(&user.id).await?))
}

#[api_handler(
    delete,
    path = "/api/uploads/{id}",
    params(("id" = String, Path, description = "Upload id")),
    responses((status = NO_CONTENT), (status = NOT_FOUND, body = ErrorBody)),
    security(("bearer" = [])),
    tag = UPLOADS_TAG,
)]
async fn delete_upload(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let uploads = state.try_get_slice::<Uploads>()?;
    uploads.delete(&user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[api_handler(
    get,
    path = "/files/{id}",
    params(("id" = String, Path, description = "Upload id")),
    responses(
        (status = OK, description = "Stored file bytes", content_type = "application/octet-stream", body = Vec<u8>),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    tag = PUBLIC_TAG,
)]
async fn serve_file(State(state): State<ApiState>, Path(id): Path<String>) -> ApiResult<Response> {
    let uploads = state.try_get_slice::<Uploads>()?;
    let (content_type, bytes) = uploads.serve(&id).await?;
    let headers = [
        (header::CONTENT_TYPE, content_type),
        (header::CACHE_CONTROL, IMMUTABLE),
        (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    ];
    Ok((headers, bytes).into_response())
}
