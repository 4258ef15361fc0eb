use crate::Cards;
use crate::error::CardsError;
use crate::model::{
    AddComponentRequest, Card, CardDetail, CatalogEntry, Component, CreateCardRequest,
    OutboundQuery, PublicCard, ReorderRequest, UpdateCardRequest, UpdateComponentRequest,
    VisitQuery,
};
use crate::vcard;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use cardly_derive::api_handler;
use cardly_domain::constants::{CARDS_TAG, PUBLIC_TAG};
use cardly_kernel::server::{ApiJson, ApiResult, ApiState, CurrentUser, ErrorBody};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

pub(crate) fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(list_cards, create_card))
        .routes(routes!(get_card, update_card, delete_card))
        .routes(routes!(publish_card))
        .routes(routes!(unpublish_card))
        .routes(routes!(add_component))
        .routes(routes!(update_component, remove_component))
        .routes(routes!(reorder_components))
        .routes(routes!(catalog))
        .routes(routes!(public_page))
        .routes(routes!(public_json))
        .routes(routes!(public_vcard))
        .routes(routes!(outbound))
}

// --- Owner API ---

#[api_handler(
    get,
    path = "/api/cards",
    responses((status = OK, body = Vec<Card>), (status = UNAUTHORIZED, body = ErrorBody)),
    security(("bearer" = [])),
    tag = CARDS_TAG,
)]
async fn list_cards(State(state): State<ApiState>, user: CurrentUser) -> ApiResult<Json<Vec<Card>>> {
    let cards = state.try_get_slice::<Cards>()?;
    Ok(Json(cards.list_cards(&user.id).await?))
}

#[api_handler(
    post,
    path = "/api/cards",
    request_body = CreateCardRequest,
    responses(
        (status = CREATED, body = CardDetail),
        (status = FORBIDDEN, body = ErrorBody),
        (status = CONFLICT, body = ErrorBody),
        (status = UNPROCESSABLE_ENTITY, body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = CARDS_TAG,
)]
async fn create_card(
    State(state): State<ApiState>,
    user: CurrentUser,
    ApiJson(body): ApiJson<CreateCardRequest>,
) -> ApiResult<(StatusCode, Json<CardDetail>)> {
    let cards = state.try_get_slice::<Cards>()?;
    Ok((StatusCode::CREATED, Json(cards.create_card(&user.id, body).await?)))
}

#[api_handler(
    get,
    path = "/api/cards/{id}",
    params(("id" = String, Path, description = "Card id")),
    responses((status = OK, body = CardDetail), (status = NOT_FOUND, body = ErrorBody)),
    security(("bearer" = [])),
    tag = CARDS_TAG,
)]
async fn get_card(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<CardDetail>> {
    let cards = state.try_get_slice::<Cards>()?;
    Ok(Json(cards.get_card(&user.id, &id).await?))
}

#[api_handler(
    patch,
    path = "/api/cards/{id}",
    params(("id" = String, Path, description = "Card id")),
    request_body = UpdateCardRequest,
    responses(
        (status = OK, body = Card),
        (status = NOT_FOUND, body = ErrorBody),
        (status = CONFLICT, body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = CARDS_TAG,
)]
async fn update_card(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateCardRequest>,
) -> ApiResult<Json<Card>> {
    let cards = state.try_get_slice::<Cards>()?;
    Ok(Json(cards.update_card(&user.id, &id, body).await?))
}

#[api_handler(
    delete,
    path = "/api/cards/{id}",
    params(("id" = String, Path, description = "Card id")),
    responses((status = NO_CONTENT), (status = NOT_FOUND, body = ErrorBody)),
    security(("bearer" = [])),
    tag = CARDS_TAG,
)]
async fn delete_card(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let cards = state.try_get_slice::<Cards>()?;
    cards.delete_card(&user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[api_handler(
    post,
    path = "/api/cards/{id}/publish",
    params(("id" = String, Path, description = "Card id")),
    responses((status = OK, body = Card), (status = NOT_FOUND, body = ErrorBody)),
    security(("bearer" = [])),
    tag = CARDS_TAG,
)]
async fn publish_card(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Card>> {
    let cards = state.try_get_slice::<Cards>()?;
    Ok(Json(cards.set_published(&user.id, &id, true).await?))
}

#[api_handler(
    post,
    path = "/api/cards/{id}/unpublish",
    params(("id" = String, Path, description = "Card id")),
    responses((status = OK, body = Card), (status = NOT_FOUND, body = ErrorBody)),
    security(("bearer" = [])),
    tag = CARDS_TAG,
)]
async fn unpublish_card(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Card>> {
    let cards = state.try_get_slice::<Cards>()?;
    Ok(Json(cards.set_published(&user.id, &id, false).await?))
}

#[api_handler(
    post,
    path = "/api/cards/{id}/components",
    params(("id" = String, Path, description = "Card id")),
    request_body = AddComponentRequest,
    responses(
        (status = CREATED, body = Component),
        (status = FORBIDDEN, body = ErrorBody),
        (status = UNPROCESSABLE_ENTITY, body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = CARDS_TAG,
)]
async fn add_component(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<AddComponentRequest>,
) -> ApiResult<(StatusCode, Json<Component>)> {
    let cards = state.try_get_slice::<Cards>()?;
    let component =
        cards.add_component(&user.id, &id, body.kind, body.title.as_deref(), body.content).await?;
    Ok((StatusCode::CREATED, Json(component)))
}

#[api_handler(
    patch,
    path = "/api/cards/{id}/components/{component}",
    params(
        ("id" = String, Path, description = "Card id"),
        ("component" = String, Path, description = "Component id"),
    ),
    request_body = UpdateComponentRequest,
    responses(
        (status = OK, body = Component),
        (status = FORBIDDEN, body = ErrorBody),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = CARDS_TAG,
)]
async fn update_component(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path((id, component)): Path<(String, String)>,
    ApiJson(body): ApiJson<UpdateComponentRequest>,
) -> ApiResult<Json<Component>> {
    let cards = state.try_get_slice::<Cards>()?;
    Ok(Json(cards.update_component(&user.id, &id, &component, body).await?))
}

#[api_handler(
    delete,
    path = "/api/cards/{id}/components/{component}",
    params(
        ("id" = String, Path, description = "Card id"),
        ("component" = String, Path, description = "Component id"),
    ),
    responses((status = NO_CONTENT), (status = NOT_FOUND, body = ErrorBody)),
    security(("bearer" = [])),
    tag = CARDS_TAG,
)]
async fn remove_component(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path((id, component)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let cards = state.try_get_slice::<Cards>()?;
    cards.remove_component(&user.id, &id, &component).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[api_handler(
    put,
    path = "/api/cards/{id}/components/order",
    params(("id" = String, Path, description = "Card id")),
    request_body = ReorderRequest,
    responses((status = OK, body = Vec<Component>), (status = UNPROCESSABLE_ENTITY, body = ErrorBody)),
    security(("bearer" = [])),
    tag = CARDS_TAG,
)]
async fn reorder_components(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ReorderRequest>,
) -> ApiResult<Json<Vec<Component>>> {
    let cards = state.try_get_slice::<Cards>()?;
    Ok(Json(cards.reorder_components(&user.id, &id, body.order).await?))
}

#[api_handler(
    get,
    path = "/api/components/catalog",
    responses((status = OK, body = Vec<CatalogEntry>)),
    security(("bearer" = [])),
    tag = CARDS_TAG,
)]
async fn catalog(State(state): State<ApiState>, user: CurrentUser) -> ApiResult<Json<Vec<CatalogEntry>>> {
    let cards = state.try_get_slice::<Cards>()?;
    Ok(Json(cards.catalog(&user.id).await?))
}

// --- Public pages ---

#[api_handler(
    get,
    path = "/c/{slug}",
    params(("slug" = String, Path, description = "Card slug"), VisitQuery),
    responses(
        (status = OK, description = "Rendered card page", content_type = "text/html", body = String),
        (status = NOT_FOUND, description = "Unknown or unpublished card", content_type = "text/html", body = String),
    ),
    tag = PUBLIC_TAG,
)]
async fn public_page(
    State(state): State<ApiState>,
    Path(slug): Path<String>,
    Query(query): Query<VisitQuery>,
) -> ApiResult<Response> {
    let cards = state.try_get_slice::<Cards>()?;
    match cards.view_page(&slug, query.session).await {
        Ok(html) => Ok(Html(html).into_response()),
        Err(CardsError::NotFound { .. }) => {
            Ok((StatusCode::NOT_FOUND, Html(cards.not_found_page().await?)).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

#[api_handler(
    get,
    path = "/api/public/cards/{slug}",
    params(("slug" = String, Path, description = "Card slug")),
    responses((status = OK, body = PublicCard), (status = NOT_FOUND, body = ErrorBody)),
    tag = PUBLIC_TAG,
)]
async fn public_json(State(state): State<ApiState>, Path(slug): Path<String>) -> ApiResult<Json<PublicCard>> {
    let cards = state.try_get_slice::<Cards>()?;
    let (_, card) = cards.public_card(&slug).await?;
    Ok(Json(card))
}

#[api_handler(
    get,
    path = "/c/{slug}/vcard",
    params(("slug" = String, Path, description = "Card slug")),
    responses(
        (status = OK, description = "vCard 3.0", content_type = "text/vcard", body = String),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    tag = PUBLIC_TAG,
)]
async fn public_vcard(State(state): State<ApiState>, Path(slug): Path<String>) -> ApiResult<Response> {
    let cards = state.try_get_slice::<Cards>()?;
    let body = cards.vcard(&slug).await?;
    let disposition = format!("attachment; filename=\"{slug}.vcf\"");
    let headers = [(header::CONTENT_TYPE, vcard::CONTENT_TYPE.to_owned()), (header::CONTENT_DISPOSITION, disposition)];
    Ok((headers, body).into_response())
}

#[api_handler(
    get,
    path = "/c/{slug}/out",
    params(("slug" = String, Path, description = "Card slug"), OutboundQuery),
    responses((status = TEMPORARY_REDIRECT), (status = NOT_FOUND, body = ErrorBody)),
    tag = PUBLIC_TAG,
)]
async fn outbound(
    State(state): State<ApiState>,
    Path(slug): Path<String>,
    Query(query): Query<OutboundQuery>,
) -> ApiResult<Redirect> {
    let cards = state.try_get_slice::<Cards>()?;
    let target = cards.follow_link(&slug, &query.url, query.session).await?;
    Ok(Redirect::temporary(&target))
}
