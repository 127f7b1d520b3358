use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use brigada_auth::{Claims, verify_token};
use brigada_core::{AppError, permissions};
use brigada_models::{UserId, UserRole};

use crate::state::AppState;

/// Extractor that validates the bearer token and exposes its claims.
/// The claims carry the role, the `mando_especial` flag and the resolved
/// permission list, so checks here never hit the database.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Check if the user has a specific permission
    pub fn has_permission(&self, permission: &str) -> bool {
        self.0.permissions.iter().any(|p| p == permission)
    }

    /// Check if the user has any of the specified permissions
    pub fn has_any_permission(&self, permissions: &[&str]) -> bool {
        permissions.iter().any(|p| self.has_permission(p))
    }

    pub fn has_all_permissions(&self, permissions: &[&str]) -> bool {
        permissions.iter().all(|p| self.has_permission(p))
    }

    /// Role slug from the token; `None` if it no longer maps to a known role.
    pub fn role(&self) -> Option<UserRole> {
        self.0.role.parse().ok()
    }

    pub fn is_mando_especial(&self) -> bool {
        self.0.mando_especial
    }

    /// May see and act on every leave request, not only their own.
    pub fn can_review_requests(&self) -> bool {
        self.has_permission(permissions::REQUESTS_REVIEW)
    }

    pub fn can_review_shift_changes(&self) -> bool {
        self.has_permission(permissions::SHIFT_CHANGES_REVIEW)
    }

    /// Get the user ID from the `sub` claim
    pub fn user_id(&self) -> Result<UserId, AppError> {
        self.0
            .sub
            .parse::<UserId>()
            .map_err(|_| AppError::unauthorized("Invalid user ID in token"))
    }

    pub fn email(&self) -> &str {
        &self.0.email
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("Invalid authorization header format"))?;

        let claims = verify_token(token, &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}

/// Declares an extractor that authenticates the caller and requires one
/// permission, rejecting with 403 otherwise.
#[macro_export]
macro_rules! require_permission {
    ($name:ident, $permission:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = brigada_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user = <$crate::middleware::auth::AuthUser as axum::extract::FromRequestParts<
                    $crate::state::AppState,
                >>::from_request_parts(parts, state)
                .await?;

                if !auth_user.has_permission($permission) {
                    return Err(brigada_core::AppError::forbidden(format!(
                        "Access denied. Missing required permission: {}",
                        $permission
                    )));
                }

                Ok($name(auth_user))
            }
        }
    };
}

// Users
require_permission!(RequireUsersCreate, permissions::USERS_CREATE);
require_permission!(RequireUsersRead, permissions::USERS_READ);
require_permission!(RequireUsersUpdate, permissions::USERS_UPDATE);
require_permission!(RequireUsersDelete, permissions::USERS_DELETE);
require_permission!(RequireUsersBalances, permissions::USERS_BALANCES);

// Parks, brigades, guards
require_permission!(RequireParksRead, permissions::PARKS_READ);
require_permission!(RequireParksManage, permissions::PARKS_MANAGE);
require_permission!(RequireBrigadesRead, permissions::BRIGADES_READ);
require_permission!(RequireBrigadesManage, permissions::BRIGADES_MANAGE);
require_permission!(RequireGuardsRead, permissions::GUARDS_READ);
require_permission!(RequireGuardsManage, permissions::GUARDS_MANAGE);
require_permission!(RequireAssignmentsRead, permissions::ASSIGNMENTS_READ);
require_permission!(RequireAssignmentsManage, permissions::ASSIGNMENTS_MANAGE);
require_permission!(RequireRequirementsManage, permissions::REQUIREMENTS_MANAGE);

// Requests and shift changes
require_permission!(RequireRequestsCreate, permissions::REQUESTS_CREATE);
require_permission!(RequireRequestsReview, permissions::REQUESTS_REVIEW);
require_permission!(RequireShiftChangesCreate, permissions::SHIFT_CHANGES_CREATE);
require_permission!(RequireShiftChangesReview, permissions::SHIFT_CHANGES_REVIEW);

// Fleet, incidents, messaging
require_permission!(RequireVehiclesRead, permissions::VEHICLES_READ);
require_permission!(RequireVehiclesManage, permissions::VEHICLES_MANAGE);
require_permission!(RequireIncidentsRead, permissions::INCIDENTS_READ);
require_permission!(RequireIncidentsCreate, permissions::INCIDENTS_CREATE);
require_permission!(RequireIncidentsResolve, permissions::INCIDENTS_RESOLVE);
require_permission!(RequireMessagesSend, permissions::MESSAGES_SEND);

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn claims_for(role: UserRole, mando_especial: bool) -> Claims {
        Claims {
            sub: Uuid::from_u128(42).to_string(),
            email: "cabo@parque.es".to_string(),
            role: role.as_str().to_string(),
            mando_especial,
            permissions: role.permissions(mando_especial),
            exp: 9999999999,
            iat: 1234567890,
        }
    }

    #[test]
    fn test_has_permission() {
        let auth_user = AuthUser(claims_for(UserRole::Mando, false));

        assert!(auth_user.has_permission(permissions::GUARDS_MANAGE));
        assert!(auth_user.has_permission(permissions::REQUESTS_CREATE));
        assert!(!auth_user.has_permission(permissions::USERS_CREATE));
    }

    #[test]
    fn test_has_any_and_all_permissions() {
        let auth_user = AuthUser(claims_for(UserRole::Bombero, false));

        assert!(auth_user.has_any_permission(&[permissions::USERS_READ, permissions::GUARDS_READ]));
        assert!(!auth_user.has_any_permission(&[permissions::USERS_READ, permissions::GUARDS_MANAGE]));
        assert!(auth_user.has_all_permissions(&[permissions::GUARDS_READ, permissions::MESSAGES_SEND]));
        assert!(!auth_user.has_all_permissions(&[permissions::GUARDS_READ, permissions::USERS_READ]));
    }

    #[test]
    fn test_mando_especial_reviews() {
        let plain = AuthUser(claims_for(UserRole::Empleado, false));
        let special = AuthUser(claims_for(UserRole::Empleado, true));

        assert!(!plain.can_review_requests());
        assert!(special.can_review_requests());
        assert!(special.can_review_shift_changes());
        assert!(special.is_mando_especial());
        assert_eq!(special.role(), Some(UserRole::Empleado));
    }

    #[test]
    fn test_user_id() {
        let auth_user = AuthUser(claims_for(UserRole::Jefe, false));
        assert_eq!(auth_user.user_id().unwrap(), UserId::from_u128(42));
        assert_eq!(auth_user.email(), "cabo@parque.es");
    }

    #[test]
    fn test_invalid_user_id() {
        let mut claims = claims_for(UserRole::Jefe, false);
        claims.sub = "not-a-uuid".to_string();
        let err = AuthUser(claims).user_id().unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);
    }
}
