mod common;

use axum::http::StatusCode;
use common::{PASSWORD, call, create_user, send, setup_app};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::PgPool;

async fn login(app: &axum::Router, email: &str, password: &str) -> (StatusCode, Value) {
    let response = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_success(pool: PgPool) {
    let user = create_user(&pool, "00000001R", "bombero").await;
    let app = setup_app(pool);

    let (status, body) = login(&app, &user.email, PASSWORD).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["email"], user.email);
    assert_eq!(body["user"]["role"], "bombero");
    assert!(body["user"].get("password").is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_is_case_insensitive_on_email(pool: PgPool) {
    let user = create_user(&pool, "00000001R", "mando").await;
    let app = setup_app(pool);

    let (status, _) = login(&app, &user.email.to_uppercase(), PASSWORD).await;

    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_invalid_credentials(pool: PgPool) {
    let user = create_user(&pool, "00000001R", "bombero").await;
    let app = setup_app(pool);

    let (status, _) = login(&app, &user.email, "wrong-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = login(&app, "nadie@bomberos.es", PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_invalid_email_format(pool: PgPool) {
    let app = setup_app(pool);

    let (status, _) = login(&app, "not-an-email", PASSWORD).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_missing_password(pool: PgPool) {
    let app = setup_app(pool);

    let response = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "ana@bomberos.es" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_refresh_issues_new_pair(pool: PgPool) {
    let user = create_user(&pool, "00000001R", "mando").await;
    let app = setup_app(pool);
    let (_, body) = login(&app, &user.email, PASSWORD).await;

    let response = send(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({ "refresh_token": body["refresh_token"] })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // An access token is not a refresh token.
    let response = send(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({ "refresh_token": body["access_token"] })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_get_me(pool: PgPool) {
    let user = create_user(&pool, "00000001R", "empleado").await;
    let app = setup_app(pool);

    let (status, body) = call(&app, "GET", "/api/auth/me", &user.token, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user.id.to_string());
    assert_eq!(body["dni"], "00000001R");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_protected_route_requires_token(pool: PgPool) {
    let app = setup_app(pool);

    let response = send(&app, "GET", "/api/auth/me", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, "GET", "/api/auth/me", "garbage", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_change_password(pool: PgPool) {
    let user = create_user(&pool, "00000001R", "bombero").await;
    let app = setup_app(pool);

    let (status, _) = call(
        &app,
        "PUT",
        "/api/auth/password",
        &user.token,
        Some(json!({ "current_password": "nope", "new_password": "nueva-clave-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(
        &app,
        "PUT",
        "/api/auth/password",
        &user.token,
        Some(json!({ "current_password": PASSWORD, "new_password": "nueva-clave-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = login(&app, &user.email, PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = login(&app, &user.email, "nueva-clave-1").await;
    assert_eq!(status, StatusCode::OK);
}
