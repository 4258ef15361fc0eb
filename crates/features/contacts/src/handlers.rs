use crate::Contacts;
use crate::export::CSV_CONTENT_TYPE;
use crate::model::{CaptureRequest, Contact, ContactQuery, MarkReadRequest};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use cardly_derive::api_handler;
use cardly_domain::constants::{CONTACTS_TAG, PUBLIC_TAG};
use cardly_kernel::server::{ApiJson, ApiResult, ApiState, CurrentUser, ErrorBody};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

pub(crate) fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(capture))
        .routes(routes!(list_contacts))
        .routes(routes!(export_contacts))
        .routes(routes!(mark_read, delete_contact))
}

#[api_handler(
    post,
    path = "/api/public/cards/{slug}/contacts",
    params(("slug" = String, Path, description = "Card slug")),
    request_body = CaptureRequest,
    responses(
        (status = ACCEPTED, description = "Submission received"),
        (status = NOT_FOUND, body = ErrorBody),
        (status = CONFLICT, description = "The card has no form", body = ErrorBody),
        (status = UNPROCESSABLE_ENTITY, body = ErrorBody),
    ),
    tag = PUBLIC_TAG,
)]
async fn capture(
    State(state): State<ApiState>,
    Path(slug): Path<String>,
    ApiJson(body): ApiJson<CaptureRequest>,
) -> ApiResult<StatusCode> {
    let contacts = state.try_get_slice::<Contacts>()?;
    contacts.capture(&slug, body).await?;
    Ok(StatusCode::ACCEPTED)
}

#[api_handler(
    get,
    path = "/api/contacts",
    params(ContactQuery),
    responses((status = OK, body = Vec<Contact>), (status = UNAUTHORIZED, body = ErrorBody)),
    security(("bearer" = [])),
    tag = CONTACTS_TAG,
)]
async fn list_contacts(
    State(state): State<ApiState>,
    user: CurrentUser,
    Query(query): Query<ContactQuery>,
) -> ApiResult<Json<Vec<Contact>>> {
    let contacts = state.try_get_slice::<Contacts>()?;
    Ok(Json(contacts.list(&user.id, &query).await?))
}

#[api_handler(
    get,
    path = "/api/contacts/export",
    params(ContactQuery),
    responses((status = OK, description = "CSV export", content_type = "text/csv", body = String)),
    security(("bearer" = [])),
    tag = CONTACTS_TAG,
)]
async fn export_contacts(
    State(state): State<ApiState>,
    user: CurrentUser,
    Query(query): Query<ContactQuery>,
) -> ApiResult<Response> {
    let contacts = state.try_get_slice::<Contacts>()?;
    let csv = contacts.export_csv(&user.id, query.card).await?;
    let headers = [
        (header::CONTENT_TYPE, CSV_CONTENT_TYPE),
        (header::CONTENT_DISPOSITION, "attachment; filename=\"contacts.csv\""),
    ];
    Ok((headers, csv).into_response())
}

#[api_handler(
    patch,
    path = "/api/contacts/{id}",
    params(("id" = String, Path, description = "Contact id")),
    request_body = MarkReadRequest,
    responses((status = OK, body = Contact), (status = NOT_FOUND, body = ErrorBody)),
    security(("bearer" = [])),
    tag = CONTACTS_TAG,
)]
async fn mark_read(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<MarkReadRequest>,
) -> ApiResult<Json<Contact>> {
    let contacts = state.try_get_slice::<Contacts>()?;
    Ok(Json(contacts.mark_read(&user.id, &id, body.read).await?))
}

#[api_handler(
    delete,
    path = "/api/contacts/{id}",
    params(("id" = String, Path, description = "Contact id")),
    responses((status = NO_CONTENT), (status = NOT_FOUND, body = ErrorBody)),
    security(("bearer" = [])),
    tag = CONTACTS_TAG,
)]
async fn delete_contact(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let contacts = state.try_get_slice::<Contacts>()?;
    contacts.delete(&user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
