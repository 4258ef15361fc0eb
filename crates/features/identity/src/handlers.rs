use crate::Identity;
use crate::model::{
    AuthResponse, ChangePasswordRequest, CodeRequest, ForgotPasswordRequest, LoginRequest,
    MfaRequest, RegisterRequest, ResetPasswordRequest, TokenRequest, TwoFactorSetupResponse,
    UpdateProfileRequest, UserView,
};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use cardly_derive::api_handler;
use cardly_domain::constants::AUTH_TAG;
use cardly_kernel::server::{ApiJson, ApiResult, ApiState, CurrentUser, ErrorBody};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

pub(crate) fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(register))
        .routes(routes!(login))
        .routes(routes!(verify_mfa))
        .routes(routes!(verify_email))
        .routes(routes!(resend_verification))
        .routes(routes!(forgot_password))
        .routes(routes!(reset_password))
        .routes(routes!(change_password))
        .routes(routes!(me, update_profile))
        .routes(routes!(setup_2fa))
        .routes(routes!(enable_2fa))
        .routes(routes!(disable_2fa))
}

#[api_handler(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = CREATED, body = AuthResponse),
        (status = FORBIDDEN, body = ErrorBody),
        (status = CONFLICT, body = ErrorBody),
        (status = UNPROCESSABLE_ENTITY, body = ErrorBody),
    ),
    tag = AUTH_TAG,
)]
async fn register(
    State(state): State<ApiState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let identity = state.try_get_slice::<Identity>()?;
    let response = identity.register(&body.email, &body.password, &body.display_name).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[api_handler(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = OK, body = AuthResponse),
        (status = UNAUTHORIZED, body = ErrorBody),
        (status = TOO_MANY_REQUESTS, body = ErrorBody),
    ),
    tag = AUTH_TAG,
)]
async fn login(
    State(state): State<ApiState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let identity = state.try_get_slice::<Identity>()?;
    Ok(Json(identity.login(&body.email, &body.password).await?))
}

#[api_handler(
    post,
    path = "/api/auth/mfa",
    request_body = MfaRequest,
    responses((status = OK, body = AuthResponse), (status = UNAUTHORIZED, body = ErrorBody)),
    tag = AUTH_TAG,
)]
async fn verify_mfa(
    State(state): State<ApiState>,
    ApiJson(body): ApiJson<MfaRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let identity = state.try_get_slice::<Identity>()?;
    Ok(Json(identity.verify_mfa(&body.mfa_token, &body.code).await?))
}

#[api_handler(
    post,
    path = "/api/auth/verify-email",
    request_body = TokenRequest,
    responses((status = OK, body = UserView), (status = UNAUTHORIZED, body = ErrorBody)),
    tag = AUTH_TAG,
)]
async fn verify_email(
    State(state): State<ApiState>,
    ApiJson(body): ApiJson<TokenRequest>,
) -> ApiResult<Json<UserView>> {
    let identity = state.try_get_slice::<Identity>()?;
    Ok(Json(identity.verify_email(&body.token).await?))
}

#[api_handler(
    post,
    path = "/api/auth/verify-email/resend",
    responses((status = ACCEPTED), (status = CONFLICT, body = ErrorBody)),
    security(("bearer" = [])),
    tag = AUTH_TAG,
)]
async fn resend_verification(
    State(state): State<ApiState>,
    user: CurrentUser,
) -> ApiResult<StatusCode> {
    let identity = state.try_get_slice::<Identity>()?;
    identity.resend_verification(&user.id).await?;
    Ok(StatusCode::ACCEPTED)
}

#[api_handler(
    post,
    path = "/api/auth/password/forgot",
    request_body = ForgotPasswordRequest,
    responses((status = ACCEPTED)),
    tag = AUTH_TAG,
)]
async fn forgot_password(
    State(state): State<ApiState>,
    ApiJson(body): ApiJson<ForgotPasswordRequest>,
) -> ApiResult<StatusCode> {
    let identity = state.try_get_slice::<Identity>()?;
    identity.forgot_password(&body.email).await?;
    Ok(StatusCode::ACCEPTED)
}

#[api_handler(
    post,
    path = "/api/auth/password/reset",
    request_body = ResetPasswordRequest,
    responses(
        (status = NO_CONTENT),
        (status = UNAUTHORIZED, body = ErrorBody),
        (status = UNPROCESSABLE_ENTITY, body = ErrorBody),
    ),
    tag = AUTH_TAG,
)]
async fn reset_password(
    State(state): State<ApiState>,
    ApiJson(body): ApiJson<ResetPasswordRequest>,
) -> ApiResult<StatusCode> {
    let identity = state.try_get_slice::<Identity>()?;
    identity.reset_password(&body.token, &body.new_password).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[api_handler(
    post,
    path = "/api/auth/password/change",
    request_body = ChangePasswordRequest,
    responses(
        (status = NO_CONTENT),
        (status = UNAUTHORIZED, body = ErrorBody),
        (status = UNPROCESSABLE_ENTITY, body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = AUTH_TAG,
)]
async fn change_password(
    State(state): State<ApiState>,
    user: CurrentUser,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    let identity = state.try_get_slice::<Identity>()?;
    identity.change_password(&user.id, &body.current_password, &body.new_password).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[api_handler(
    get,
    path = "/api/auth/me",
    responses((status = OK, body = UserView), (status = UNAUTHORIZED, body = ErrorBody)),
    security(("bearer" = [])),
    tag = AUTH_TAG,
)]
async fn me(State(state): State<ApiState>, user: CurrentUser) -> ApiResult<Json<UserView>> {
    let identity = state.try_get_slice::<Identity>()?;
    Ok(Json(identity.me(&user.id).await?))
}

#[api_handler(
    patch,
    path = "/api/auth/me",
    request_body = UpdateProfileRequest,
    responses((status = OK, body = UserView), (status = UNPROCESSABLE_ENTITY, body = ErrorBody)),
    security(("bearer" = [])),
    tag = AUTH_TAG,
)]
async fn update_profile(
    State(state): State<ApiState>,
    user: CurrentUser,
    ApiJson(body): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<UserView>> {
    let identity = state.try_get_slice::<Identity>()?;
    Ok(Json(identity.update_profile(&user.id, &body.display_name).await?))
}

#[api_handler(
    post,
    path = "/api/auth/2fa/setup",
    responses((status = OK, body = TwoFactorSetupResponse), (status = CONFLICT, body = ErrorBody)),
    security(("bearer" = [])),
    tag = AUTH_TAG,
)]
async fn setup_2fa(
    State(state): State<ApiState>,
    user: CurrentUser,
) -> ApiResult<Json<TwoFactorSetupResponse>> {
    let identity = state.try_get_slice::<Identity>()?;
    Ok(Json(identity.setup_2fa(&user.id).await?))
}

#[api_handler(
    post,
    path = "/api/auth/2fa/enable",
    request_body = CodeRequest,
    responses((status = OK, body = UserView), (status = UNAUTHORIZED, body = ErrorBody)),
    security(("bearer" = [])),
    tag = AUTH_TAG,
)]
async fn enable_2fa(
    State(state): State<ApiState>,
    user: CurrentUser,
    ApiJson(body): ApiJson<CodeRequest>,
) -> ApiResult<Json<UserView>> {
    let identity = state.try_get_slice::<Identity>()?;
    Ok(Json(identity.enable_2fa(&user.id, &body.code).await?))
}

#[api_handler(
    post,
    path = "/api/auth/2fa/disable",
    request_body = CodeRequest,
    responses((status = OK, body = UserView), (status = UNAUTHORIZED, body = ErrorBody)),
    security(("bearer" = [])),
    tag = AUTH_TAG,
)]
async fn disable_2fa(
    State(state): State<ApiState>,
    user: CurrentUser,
    ApiJson(body): ApiJson<CodeRequest>,
) -> ApiResult<Json<UserView>> {
    let identity = state.try_get_slice::<Identity>()?;
    Ok(Json(identity.disable_2fa(&user.id, &body.code).await?))
}
