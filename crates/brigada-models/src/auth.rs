//! Login, token refresh and password change DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::users::User;

pub use brigada_auth::{Claims, RefreshTokenClaims};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    #[schema(example = "jefe@parque.es")]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordDto {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 8))]
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_requires_email_shape() {
        let req = LoginRequest {
            email: "not-an-email".into(),
            password: "x".into(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn new_password_minimum() {
        let dto = ChangePasswordDto {
            current_password: "old-secret".into(),
            new_password: "short".into(),
        };
        assert!(dto.validate().is_err());
    }
}
