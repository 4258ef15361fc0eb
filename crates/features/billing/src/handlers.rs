use crate::Billing;
use crate::model::{
    CheckoutRequest, CheckoutResponse, GrantRequest, Payment, Plan, SubscriptionView, WebhookAck,
};
use crate::plans::plans;
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use cardly_derive::api_handler;
use cardly_domain::constants::BILLING_TAG;
use cardly_kernel::server::{AdminUser, ApiJson, ApiResult, ApiState, CurrentUser, ErrorBody};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

const SIGNATURE_HEADER: &str = "stripe-signature";

pub(crate) fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(list_plans))
        .routes(routes!(get_subscription))
        .routes(routes!(checkout))
        .routes(routes!(cancel))
        .routes(routes!(list_payments))
        .routes(routes!(stripe_webhook))
        .routes(routes!(grant))
}

#[api_handler(
    get,
    path = "/api/billing/plans",
    responses((status = OK, body = Vec<Plan>)),
    tag = BILLING_TAG,
)]
async fn list_plans() -> Json<Vec<Plan>> {
    Json(plans())
}

#[api_handler(
    get,
    path = "/api/billing/subscription",
    responses((status = OK, body = SubscriptionView), (status = UNAUTHORIZED, body = ErrorBody)),
    security(("bearer" = [])),
    tag = BILLING_TAG,
)]
async fn get_subscription(
    State(state): State<ApiState>,
    user: CurrentUser,
) -> ApiResult<Json<SubscriptionView>> {
    let billing = state.try_get_slice::<Billing>()?;
    Ok(Json(billing.subscription_view(&user.id).await?))
}

#[api_handler(
    post,
    path = "/api/billing/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = OK, body = CheckoutResponse),
        (status = UNPROCESSABLE_ENTITY, body = ErrorBody),
        (status = SERVICE_UNAVAILABLE, body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = BILLING_TAG,
)]
async fn checkout(
    State(state): State<ApiState>,
    user: CurrentUser,
    ApiJson(body): ApiJson<CheckoutRequest>,
) -> ApiResult<Json<CheckoutResponse>> {
    let billing = state.try_get_slice::<Billing>()?;
    Ok(Json(billing.checkout(&user.id, body.tier, body.interval).await?))
}

#[api_handler(
    post,
    path = "/api/billing/cancel",
    responses((status = OK, body = SubscriptionView), (status = NOT_FOUND, body = ErrorBody)),
    security(("bearer" = [])),
    tag = BILLING_TAG,
)]
async fn cancel(
    State(state): State<ApiState>,
    user: CurrentUser,
) -> ApiResult<Json<SubscriptionView>> {
    let billing = state.try_get_slice::<Billing>()?;
    Ok(Json(billing.cancel(&user.id).await?))
}

#[api_handler(
    get,
    path = "/api/billing/payments",
    responses((status = OK, body = Vec<Payment>)),
    security(("bearer" = [])),
    tag = BILLING_TAG,
)]
async fn list_payments(
    State(state): State<ApiState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<Payment>>> {
    let billing = state.try_get_slice::<Billing>()?;
    Ok(Json(billing.payments(&user.id).await?))
}

#[api_handler(
    post,
    path = "/api/billing/webhooks/stripe",
    request_body(content = String, description = "Raw provider event", content_type = "application/json"),
    responses((status = OK, body = WebhookAck), (status = BAD_REQUEST, body = ErrorBody)),
    tag = BILLING_TAG,
)]
async fn stripe_webhook(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookAck>> {
    let billing = state.try_get_slice::<Billing>()?;
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    let processed = billing.handle_webhook(&body, signature).await?;
    Ok(Json(WebhookAck { received: true, processed }))
}

#[api_handler(
    post,
    path = "/api/admin/billing/grants",
    request_body = GrantRequest,
    responses((status = OK, body = SubscriptionView), (status = FORBIDDEN, body = ErrorBody)),
    security(("bearer" = [])),
    tag = BILLING_TAG,
)]
async fn grant(
    State(state): State<ApiState>,
    AdminUser(admin): AdminUser,
    ApiJson(body): ApiJson<GrantRequest>,
) -> ApiResult<Json<SubscriptionView>> {
    let billing = state.try_get_slice::<Billing>()?;
    tracing::info!(admin = %admin.id, user = %body.user, tier = %body.tier, "Admin grant");
    Ok(Json(billing.grant(&body.user, body.tier, body.days).await?))
}
