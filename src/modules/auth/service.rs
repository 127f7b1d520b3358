use brigada_auth::{create_access_token, create_refresh_token, verify_refresh_token};
use brigada_config::JwtConfig;
use brigada_core::{AppError, hash_password, verify_password};
use brigada_models::users::{User, UserCredentials};
use brigada_models::{Email, UserId};
use sqlx::PgPool;
use tracing::instrument;

use super::model::{ChangePasswordDto, LoginRequest, LoginResponse};
use crate::modules::users::service::UserService;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub struct AuthService;

impl AuthService {
    #[instrument(skip(db, dto, jwt_config), fields(email = %dto.email))]
    pub async fn login_user(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        // Unknown and malformed addresses get the same answer as a wrong password.
        let Ok(email) = dto.email.parse::<Email>() else {
            brigada_observability::track_login(false);
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        };

        let credentials = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, email, password, role, mando_especial FROM users WHERE email = $1",
        )
        .bind(&email)
        .fetch_optional(db)
        .await?;

        let Some(credentials) = credentials else {
            brigada_observability::track_login(false);
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        };

        if !verify_password(&dto.password, &credentials.password)? {
            brigada_observability::track_login(false);
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }

        brigada_observability::track_login(true);
        let user = UserService::get_user(db, credentials.id).await?;
        Self::issue_tokens(user, jwt_config)
    }

    /// Exchanges a refresh token for a new pair. Role and permissions are
    /// read again from the user row so demotions apply immediately.
    #[instrument(skip(db, refresh_token, jwt_config))]
    pub async fn refresh(
        db: &PgPool,
        refresh_token: &str,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        let claims = verify_refresh_token(refresh_token, jwt_config)?;
        let user_id: UserId = claims
            .sub
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid refresh token"))?;

        let user = UserService::find_user(db, user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("User no longer exists"))?;

        Self::issue_tokens(user, jwt_config)
    }

    #[instrument(skip(db, dto))]
    pub async fn change_password(
        db: &PgPool,
        user_id: UserId,
        dto: ChangePasswordDto,
    ) -> Result<(), AppError> {
        let current_hash =
            sqlx::query_scalar::<_, String>("SELECT password FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(db)
                .await?
                .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))?;

        if !verify_password(&dto.current_password, &current_hash)? {
            return Err(AppError::unauthorized("Current password is incorrect"));
        }

        let new_hash = hash_password(&dto.new_password)?;
        sqlx::query("UPDATE users SET password = $1, updated_at = NOW() WHERE id = $2")
            .bind(&new_hash)
            .bind(user_id)
            .execute(db)
            .await?;

        tracing::info!(%user_id, "password changed");
        Ok(())
    }

    fn issue_tokens(user: User, jwt_config: &JwtConfig) -> Result<LoginResponse, AppError> {
        let access_token = create_access_token(
            user.id.into_inner(),
            user.email.as_str(),
            user.role.as_str(),
            user.mando_especial,
            user.permissions(),
            jwt_config,
        )?;
        let refresh_token = create_refresh_token(user.id.into_inner(), jwt_config)?;

        Ok(LoginResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: jwt_config.access_token_expiry,
            user,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brigada_auth::verify_token;

    fn jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "auth-service-test".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604800,
        }
    }

    async fn insert_user(pool: &PgPool, email: &str, role: &str) -> UserId {
        let hash = hash_password("guardia-2024").unwrap();
        sqlx::query_scalar::<_, UserId>(
            "INSERT INTO users (first_name, last_name, dni, email, password, role) \
             VALUES ('Ana', 'García', '00000001R', $1, $2, $3::user_role) RETURNING id",
        )
        .bind(email)
        .bind(hash)
        .bind(role)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_login_issues_tokens_with_permissions(pool: PgPool) {
        insert_user(&pool, "ana@bomberos.es", "mando").await;
        let config = jwt_config();

        let response = AuthService::login_user(&pool, login("ANA@bomberos.es", "guardia-2024"), &config)
            .await
            .unwrap();

        assert_eq!(response.token_type, "Bearer");
        let claims = verify_token(&response.access_token, &config).unwrap();
        assert_eq!(claims.role, "mando");
        assert!(!claims.permissions.is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_login_failures_are_indistinguishable(pool: PgPool) {
        insert_user(&pool, "ana@bomberos.es", "bombero").await;
        let config = jwt_config();

        let wrong_password = AuthService::login_user(&pool, login("ana@bomberos.es", "otra-clave"), &config)
            .await
            .unwrap_err();
        let unknown = AuthService::login_user(&pool, login("nadie@bomberos.es", "guardia-2024"), &config)
            .await
            .unwrap_err();

        assert_eq!(wrong_password.status, axum::http::StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password.status, unknown.status);
        assert_eq!(wrong_password.error.to_string(), unknown.error.to_string());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_refresh_reads_current_role(pool: PgPool) {
        let id = insert_user(&pool, "ana@bomberos.es", "bombero").await;
        let config = jwt_config();
        let first = AuthService::login_user(&pool, login("ana@bomberos.es", "guardia-2024"), &config)
            .await
            .unwrap();

        sqlx::query("UPDATE users SET role = 'mando' WHERE id = $1")
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();

        let refreshed = AuthService::refresh(&pool, &first.refresh_token, &config).await.unwrap();
        let claims = verify_token(&refreshed.access_token, &config).unwrap();
        assert_eq!(claims.role, "mando");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_change_password_requires_current(pool: PgPool) {
        let id = insert_user(&pool, "ana@bomberos.es", "bombero").await;

        let err = AuthService::change_password(
            &pool,
            id,
            ChangePasswordDto {
                current_password: "incorrecta".to_string(),
                new_password: "nueva-clave-1".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);

        AuthService::change_password(
            &pool,
            id,
            ChangePasswordDto {
                current_password: "guardia-2024".to_string(),
                new_password: "nueva-clave-1".to_string(),
            },
        )
        .await
        .unwrap();

        let config = jwt_config();
        assert!(
            AuthService::login_user(&pool, login("ana@bomberos.es", "nueva-clave-1"), &config)
                .await
                .is_ok()
        );
    }
}
