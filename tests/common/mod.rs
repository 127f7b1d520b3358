#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use brigada::brigada_auth::create_access_token;
use brigada::brigada_config::{CorsConfig, JwtConfig, RateLimitConfig};
use brigada::brigada_core::{hash_password, permissions};
use brigada::router::init_router;
use brigada::state::AppState;
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "guardia-2024";

/// Valid DNIs for fixtures; the letter is the number mod 23.
pub const DNIS: [&str; 8] = [
    "00000001R",
    "00000002W",
    "00000003A",
    "00000004G",
    "00000005M",
    "00000006Y",
    "00000007F",
    "00000008P",
];

pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "integration-test-secret".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 604800,
    }
}

pub fn test_state(pool: PgPool, rate_limit_config: RateLimitConfig) -> AppState {
    AppState {
        db: pool,
        jwt_config: jwt_config(),
        cors_config: CorsConfig::from_list("http://localhost:3000"),
        rate_limit_config,
    }
}

pub fn setup_app(pool: PgPool) -> Router {
    init_router(test_state(pool, RateLimitConfig::disabled()))
}

pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub role: &'static str,
    pub token: String,
}

/// Inserts a user and mints an access token carrying the role's permissions.
pub async fn create_user(pool: &PgPool, dni: &str, role: &'static str) -> TestUser {
    create_user_with(pool, dni, role, false).await
}

pub async fn create_user_with(
    pool: &PgPool,
    dni: &str,
    role: &'static str,
    mando_especial: bool,
) -> TestUser {
    let email = format!("{}@bomberos.es", dni.to_lowercase());
    let hashed = hash_password(PASSWORD).unwrap();

    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (first_name, last_name, dni, email, password, role, mando_especial) \
         VALUES ('Test', $1, $2, $3, $4, $5::user_role, $6) RETURNING id",
    )
    .bind(role)
    .bind(dni)
    .bind(&email)
    .bind(hashed)
    .bind(role)
    .bind(mando_especial)
    .fetch_one(pool)
    .await
    .unwrap();

    let token = create_access_token(
        id,
        &email,
        role,
        mando_especial,
        permissions::for_role(role, mando_especial),
        &jwt_config(),
    )
    .unwrap();

    TestUser {
        id,
        email,
        role,
        token,
    }
}

pub async fn create_park(pool: &PgPool, name: &str) -> Uuid {
    sqlx::query_scalar::<_, Uuid>("INSERT INTO parks (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn create_brigade(pool: &PgPool, park_id: Uuid, name: &str) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO brigades (name, park_id) VALUES ($1, $2) RETURNING id",
    )
    .bind(name)
    .bind(park_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Places a user in a brigade from `start_date` onwards.
pub async fn assign(pool: &PgPool, user_id: Uuid, brigade_id: Uuid, start_date: NaiveDate) {
    sqlx::query(
        "INSERT INTO firefighter_assignments (user_id, brigade_destination_id, start_date) \
         VALUES ($1, $2, $3)",
    )
    .bind(user_id)
    .bind(brigade_id)
    .bind(start_date)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn create_guard(pool: &PgPool, brigade_id: Uuid, date: NaiveDate) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO guards (brigade_id, date) VALUES ($1, $2) RETURNING id",
    )
    .bind(brigade_id)
    .bind(date)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

/// A date far enough ahead that "not in the past" checks always pass.
pub fn future(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2099, 3, day).unwrap()
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    app.clone()
        .oneshot(request(method, uri, token, body))
        .await
        .unwrap()
}

/// Sends a request and returns the status with the JSON body (`Null` when empty).
pub async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = send(app, method, uri, Some(token), body).await;
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
