//! Token creation and verification.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use brigada_config::JwtConfig;
use brigada_core::AppError;

use crate::claims::{Claims, RefreshTokenClaims};

/// Returns `(iat, exp)` for a token living `lifetime_secs` from now.
fn issued_and_expiry(lifetime_secs: i64) -> (usize, usize) {
    let now = Utc::now().timestamp();
    (now as usize, (now + lifetime_secs).max(0) as usize)
}

/// Creates a short-lived access token.
///
/// # Errors
///
/// Fails only if encoding fails, which indicates a broken secret.
pub fn create_access_token(
    user_id: Uuid,
    email: &str,
    role: &str,
    mando_especial: bool,
    permissions: Vec<String>,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let (iat, exp) = issued_and_expiry(jwt_config.access_token_expiry);
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        mando_especial,
        permissions,
        exp,
        iat,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create token: {}", e)))
}

/// Verifies signature and expiry of an access token.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired token"))
}

pub fn create_refresh_token(user_id: Uuid, jwt_config: &JwtConfig) -> Result<String, AppError> {
    let (iat, exp) = issued_and_expiry(jwt_config.refresh_token_expiry);
    let claims = RefreshTokenClaims {
        sub: user_id.to_string(),
        exp,
        iat,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create refresh token: {}", e)))
}

pub fn verify_refresh_token(
    token: &str,
    jwt_config: &JwtConfig,
) -> Result<RefreshTokenClaims, AppError> {
    decode::<RefreshTokenClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired refresh token"))
}
