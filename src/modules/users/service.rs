use anyhow::Context;
use brigada_core::{AppError, PaginationMeta, hash_password};
use brigada_models::users::USER_COLUMNS;
use brigada_models::UserId;
use chrono::{NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, instrument};

use super::model::{
    CreateUserDto, PaginatedUsersResponse, UpdateBalancesDto, UpdateUserDto, User,
    UserBrigadeResponse, UserFilterParams,
};
use crate::modules::assignments::service::{AssignmentService, push_effective_brigades};

const DUPLICATE_USER: &str = "A user with this email or DNI already exists";

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &UserFilterParams, today: NaiveDate) {
    if filters.brigade_id.is_some() {
        qb.push(" JOIN ");
        push_effective_brigades(qb, today);
        qb.push(" eb ON eb.user_id = users.id");
    }

    qb.push(" WHERE 1=1");

    if let Some(name) = filters.name.as_deref().filter(|n| !n.trim().is_empty()) {
        let pattern = format!("%{}%", name.trim());
        qb.push(" AND (first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR last_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR (first_name || ' ' || last_name) ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(dni) = filters.dni.as_deref().filter(|d| !d.trim().is_empty()) {
        qb.push(" AND dni ILIKE ")
            .push_bind(format!("%{}%", dni.trim()));
    }
    if let Some(role) = filters.role {
        qb.push(" AND role = ").push_bind(role);
    }
    if let Some(brigade_id) = filters.brigade_id {
        qb.push(" AND eb.brigade_id = ").push_bind(brigade_id);
    }
}

pub struct UserService;

impl UserService {
    #[instrument(skip(db, dto), fields(email = %dto.email, role = %dto.role))]
    pub async fn create_user(db: &PgPool, dto: CreateUserDto) -> Result<User, AppError> {
        let hashed_password = hash_password(&dto.password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (first_name, last_name, dni, email, password, phone, position, \
             role, mando_especial, vacation_days, personal_days, compensation_hours) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, \
             COALESCE($10, 22), COALESCE($11, 6), COALESCE($12, 0)) \
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&dto.first_name)
        .bind(&dto.last_name)
        .bind(&dto.dni)
        .bind(&dto.email)
        .bind(&hashed_password)
        .bind(&dto.phone)
        .bind(&dto.position)
        .bind(dto.role)
        .bind(dto.mando_especial)
        .bind(dto.vacation_days)
        .bind(dto.personal_days)
        .bind(dto.compensation_hours)
        .fetch_one(db)
        .await
        .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_USER))?;

        tracing::info!(user.id = %user.id, "user created");
        Ok(user)
    }

    #[instrument(skip(db))]
    pub async fn get_users(
        db: &PgPool,
        filters: UserFilterParams,
    ) -> Result<PaginatedUsersResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();
        let today = Utc::now().date_naive();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_filters(&mut count, &filters, today);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(db)
            .await
            .context("Failed to count users")
            .map_err(AppError::database)?;

        let columns = USER_COLUMNS
            .split(", ")
            .map(|c| format!("users.{}", c.trim()))
            .collect::<Vec<_>>()
            .join(", ");
        let mut data = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM users", columns));
        push_filters(&mut data, &filters, today);
        data.push(" ORDER BY last_name, first_name LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let users = data
            .build_query_as::<User>()
            .fetch_all(db)
            .await
            .context("Failed to fetch users")
            .map_err(AppError::database)?;

        debug!(total, returned = users.len(), "users fetched");

        Ok(PaginatedUsersResponse {
            data: users,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    pub async fn find_user(db: &PgPool, id: UserId) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch user")
        .map_err(AppError::database)?;

        Ok(user)
    }

    #[instrument(skip(db))]
    pub async fn get_user(db: &PgPool, id: UserId) -> Result<User, AppError> {
        Self::find_user(db, id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_user(
        db: &PgPool,
        id: UserId,
        dto: UpdateUserDto,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET \
             first_name = COALESCE($1, first_name), \
             last_name = COALESCE($2, last_name), \
             email = COALESCE($3, email), \
             phone = COALESCE($4, phone), \
             position = COALESCE($5, position), \
             role = COALESCE($6, role), \
             mando_especial = COALESCE($7, mando_especial), \
             updated_at = NOW() \
             WHERE id = $8 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&dto.first_name)
        .bind(&dto.last_name)
        .bind(&dto.email)
        .bind(&dto.phone)
        .bind(&dto.position)
        .bind(dto.role)
        .bind(dto.mando_especial)
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_USER))?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))?;

        Ok(user)
    }

    #[instrument(skip(db))]
    pub async fn delete_user(db: &PgPool, id: UserId, requested_by: UserId) -> Result<(), AppError> {
        if id == requested_by {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "You cannot delete your own account"
            )));
        }

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete user")
            .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("User not found")));
        }

        tracing::info!(user.id = %id, "user deleted");
        Ok(())
    }

    /// Overwrites whichever balances are present in `dto`.
    #[instrument(skip(db))]
    pub async fn update_balances(
        db: &PgPool,
        id: UserId,
        dto: UpdateBalancesDto,
    ) -> Result<User, AppError> {
        if dto.is_empty() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Provide at least one of vacation_days, personal_days or compensation_hours"
            )));
        }

        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET \
             vacation_days = COALESCE($1, vacation_days), \
             personal_days = COALESCE($2, personal_days), \
             compensation_hours = COALESCE($3, compensation_hours), \
             updated_at = NOW() \
             WHERE id = $4 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(dto.vacation_days)
        .bind(dto.personal_days)
        .bind(dto.compensation_hours)
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to update balances")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }

    /// Records the hours a firefighter is willing to cover; `offered_at`
    /// becomes today and orders ties on the requirement list.
    #[instrument(skip(db))]
    pub async fn offer_hours(db: &PgPool, id: UserId, hours: i32) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET offered_hours = $1, offered_at = CURRENT_DATE, updated_at = NOW() \
             WHERE id = $2 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(hours)
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to record offered hours")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }

    #[instrument(skip(db))]
    pub async fn get_user_brigade(
        db: &PgPool,
        id: UserId,
        date: NaiveDate,
    ) -> Result<UserBrigadeResponse, AppError> {
        Self::get_user(db, id).await?;

        let brigade_id = AssignmentService::brigade_on(db, id, date)
            .await?
            .ok_or_else(|| {
                AppError::not_found(anyhow::anyhow!("User has no brigade on {}", date))
            })?;

        let brigade_name =
            sqlx::query_scalar::<_, String>("SELECT name FROM brigades WHERE id = $1")
                .bind(brigade_id)
                .fetch_one(db)
                .await
                .context("Failed to fetch brigade name")
                .map_err(AppError::database)?;

        Ok(UserBrigadeResponse {
            user_id: id,
            date,
            brigade_id,
            brigade_name,
        })
    }

    pub async fn exists(db: &PgPool, id: UserId) -> Result<bool, AppError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(id)
                .fetch_one(db)
                .await?;
        Ok(exists)
    }
}
