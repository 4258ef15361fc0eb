use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::routing::get;
use cardly_database::Database;
use cardly_kernel::domain::config::ApiConfig;
use cardly_kernel::domain::role::Role;
use cardly_kernel::security::TokenPurpose;
use cardly_kernel::server::{AdminUser, ApiState, CurrentUser};
use tower::ServiceExt;

async fn state() -> ApiState {
    let db = Database::builder().url("mem://").session("kernel", "auth").init().await.unwrap();
    ApiState::builder().config(ApiConfig::default()).db(db).build().unwrap()
}

fn app(state: ApiState) -> Router {
    Router::new()
        .route("/me", get(|user: CurrentUser| async move { user.id }))
        .route("/admin", get(|AdminUser(user): AdminUser| async move { user.id }))
        .with_state(state)
}

fn request(path: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn access_token_resolves_the_caller() {
    let state = state().await;
    let token = state.jwt.issue("u1", Role::User, TokenPurpose::Access).unwrap().token;

    let response = app(state).oneshot(request("/me", Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"u1");
}

#[tokio::test]
async fn missing_or_wrong_purpose_tokens_are_unauthorized() {
    let state = state().await;
    let mfa = state.jwt.issue("u1", Role::User, TokenPurpose::Mfa).unwrap().token;
    let app = app(state);

    let response = app.clone().oneshot(request("/me", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.oneshot(request("/me", Some(&mfa))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value =
        serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap())
            .unwrap();
    assert_eq!(body["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn admin_routes_require_the_admin_role() {
    let state = state().await;
    let user = state.jwt.issue("u1", Role::User, TokenPurpose::Access).unwrap().token;
    let admin = state.jwt.issue("a1", Role::Admin, TokenPurpose::Access).unwrap().token;
    let app = app(state);

    let response = app.clone().oneshot(request("/admin", Some(&user))).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.oneshot(request("/admin", Some(&admin))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
