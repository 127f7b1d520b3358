use anyhow::Context;
use brigada_core::{AppError, PaginationMeta};
use brigada_models::users::USER_COLUMNS;
use brigada_models::{LeaveRequestId, User, UserId};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use super::model::{
    CreateLeaveRequestDto, LeaveAction, LeaveFilterParams, LeaveRequest, LeaveRuleError,
    LeaveStatus, PaginatedLeaveRequestsResponse, balance_cost, check_balance, check_shape,
};

const REQUEST_COLUMNS: &str = "id, user_id, kind, start_date, end_date, hours, reason, status, \
     reviewed_by, reviewed_at, created_at, updated_at";

fn rule_error(err: LeaveRuleError) -> AppError {
    match err {
        LeaveRuleError::InsufficientBalance { .. } => AppError::unprocessable(err),
        LeaveRuleError::IllegalTransition { .. } => AppError::conflict(err),
        LeaveRuleError::EndBeforeStart
        | LeaveRuleError::HoursRequired(_)
        | LeaveRuleError::SingleDayOnly(_) => AppError::bad_request(err),
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &LeaveFilterParams) {
    qb.push(" WHERE 1=1");
    if let Some(user_id) = filters.user_id {
        qb.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(status) = filters.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(kind) = filters.kind {
        qb.push(" AND kind = ").push_bind(kind);
    }
    if let Some(from) = filters.from {
        qb.push(" AND end_date >= ").push_bind(from);
    }
    if let Some(to) = filters.to {
        qb.push(" AND start_date <= ").push_bind(to);
    }
}

/// Who is acting on a request and whether they hold `requests:review`.
#[derive(Debug, Clone, Copy)]
pub struct Requester {
    pub user_id: UserId,
    pub is_reviewer: bool,
}

pub struct LeaveRequestService;

impl LeaveRequestService {
    async fn lock_user(conn: &mut PgConnection, user_id: UserId) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1 FOR UPDATE",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(conn)
        .await
        .context("Failed to lock user")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }

    async fn lock_request(
        conn: &mut PgConnection,
        id: LeaveRequestId,
    ) -> Result<LeaveRequest, AppError> {
        sqlx::query_as::<_, LeaveRequest>(&format!(
            "SELECT {} FROM leave_requests WHERE id = $1 FOR UPDATE",
            REQUEST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(conn)
        .await
        .context("Failed to lock leave request")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Leave request not found")))
    }

    async fn set_status(
        conn: &mut PgConnection,
        id: LeaveRequestId,
        status: LeaveStatus,
        reviewed_by: UserId,
    ) -> Result<LeaveRequest, AppError> {
        let request = sqlx::query_as::<_, LeaveRequest>(&format!(
            "UPDATE leave_requests SET status = $1, reviewed_by = $2, reviewed_at = NOW(), \
             updated_at = NOW() WHERE id = $3 RETURNING {}",
            REQUEST_COLUMNS
        ))
        .bind(status)
        .bind(reviewed_by)
        .bind(id)
        .fetch_one(conn)
        .await
        .context("Failed to update leave request")
        .map_err(AppError::database)?;

        brigada_observability::track_leave_request(request.kind.as_str(), status.as_str());
        Ok(request)
    }

    /// Moves the request's cost in or out of its balance; `sign` is -1 to
    /// deduct and 1 to refund.
    async fn adjust_balance(
        conn: &mut PgConnection,
        request: &LeaveRequest,
        sign: i32,
    ) -> Result<(), AppError> {
        let Some((balance, amount)) = balance_cost(
            request.kind,
            request.start_date,
            request.end_date,
            request.hours,
        ) else {
            return Ok(());
        };

        let column = balance.column();
        sqlx::query(&format!(
            "UPDATE users SET {column} = {column} + $1, updated_at = NOW() WHERE id = $2"
        ))
        .bind(sign * amount)
        .bind(request.user_id)
        .execute(conn)
        .await
        .context("Failed to adjust balance")
        .map_err(AppError::database)?;

        tracing::debug!(user.id = %request.user_id, balance = column, delta = sign * amount, "balance adjusted");
        Ok(())
    }

    #[instrument(skip(db, dto), fields(user.id = %user_id, kind = dto.kind.as_str()))]
    pub async fn create_request(
        db: &PgPool,
        user_id: UserId,
        dto: CreateLeaveRequestDto,
    ) -> Result<LeaveRequest, AppError> {
        check_shape(dto.kind, dto.start_date, dto.end_date, dto.hours).map_err(rule_error)?;
        // Day-based kinds never carry hours.
        let hours = if dto.kind.is_hourly() { dto.hours } else { None };

        let mut tx = db.begin().await?;

        let user = Self::lock_user(&mut tx, user_id).await?;

        let overlapping = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM leave_requests WHERE user_id = $1 \
             AND status IN ('pendiente', 'confirmada') \
             AND start_date <= $3 AND end_date >= $2)",
        )
        .bind(user_id)
        .bind(dto.start_date)
        .bind(dto.end_date)
        .fetch_one(&mut *tx)
        .await?;

        if overlapping {
            return Err(AppError::conflict(anyhow::anyhow!(
                "You already have an active request overlapping these dates"
            )));
        }

        check_balance(&user, dto.kind, dto.start_date, dto.end_date, hours).map_err(rule_error)?;

        let request = sqlx::query_as::<_, LeaveRequest>(&format!(
            "INSERT INTO leave_requests (user_id, kind, start_date, end_date, hours, reason) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            REQUEST_COLUMNS
        ))
        .bind(user_id)
        .bind(dto.kind)
        .bind(dto.start_date)
        .bind(dto.end_date)
        .bind(hours)
        .bind(&dto.reason)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to create leave request")
        .map_err(AppError::database)?;

        tx.commit().await?;

        brigada_observability::track_leave_request(request.kind.as_str(), request.status.as_str());
        tracing::info!(request.id = %request.id, "leave request created");
        Ok(request)
    }

    /// Lists requests. Without `read_all` only the caller's own are visible.
    #[instrument(skip(db))]
    pub async fn get_requests(
        db: &PgPool,
        user_id: UserId,
        read_all: bool,
        mut filters: LeaveFilterParams,
    ) -> Result<PaginatedLeaveRequestsResponse, AppError> {
        if !read_all {
            filters.user_id = Some(user_id.into_inner());
        }

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM leave_requests");
        push_filters(&mut count, &filters);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(db)
            .await
            .context("Failed to count leave requests")
            .map_err(AppError::database)?;

        let mut data = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM leave_requests",
            REQUEST_COLUMNS
        ));
        push_filters(&mut data, &filters);
        data.push(" ORDER BY start_date DESC, created_at DESC LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let requests = data
            .build_query_as::<LeaveRequest>()
            .fetch_all(db)
            .await
            .context("Failed to fetch leave requests")
            .map_err(AppError::database)?;

        Ok(PaginatedLeaveRequestsResponse {
            data: requests,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_request(
        db: &PgPool,
        id: LeaveRequestId,
        requester: Requester,
    ) -> Result<LeaveRequest, AppError> {
        let request = sqlx::query_as::<_, LeaveRequest>(&format!(
            "SELECT {} FROM leave_requests WHERE id = $1",
            REQUEST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch leave request")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Leave request not found")))?;

        if request.user_id != requester.user_id && !requester.is_reviewer {
            return Err(AppError::forbidden("You can only view your own requests"));
        }

        Ok(request)
    }

    /// Confirms a pending request, re-checking and deducting the balance in
    /// the same transaction.
    #[instrument(skip(db))]
    pub async fn confirm_request(
        db: &PgPool,
        id: LeaveRequestId,
        reviewer: UserId,
    ) -> Result<LeaveRequest, AppError> {
        let mut tx = db.begin().await?;

        let request = Self::lock_request(&mut tx, id).await?;
        let next = request
            .status
            .apply(LeaveAction::Confirm)
            .map_err(rule_error)?;

        let user = Self::lock_user(&mut tx, request.user_id).await?;
        check_balance(
            &user,
            request.kind,
            request.start_date,
            request.end_date,
            request.hours,
        )
        .map_err(rule_error)?;

        Self::adjust_balance(&mut tx, &request, -1).await?;
        let confirmed = Self::set_status(&mut tx, id, next, reviewer).await?;

        tx.commit().await?;
        tracing::info!(request.id = %id, reviewer = %reviewer, "leave request confirmed");
        Ok(confirmed)
    }

    #[instrument(skip(db))]
    pub async fn deny_request(
        db: &PgPool,
        id: LeaveRequestId,
        reviewer: UserId,
    ) -> Result<LeaveRequest, AppError> {
        let mut tx = db.begin().await?;

        let request = Self::lock_request(&mut tx, id).await?;
        let next = request.status.apply(LeaveAction::Deny).map_err(rule_error)?;
        let denied = Self::set_status(&mut tx, id, next, reviewer).await?;

        tx.commit().await?;
        Ok(denied)
    }

    /// Cancels a pending or confirmed request. Confirmed requests give their
    /// balance back.
    #[instrument(skip(db))]
    pub async fn cancel_request(
        db: &PgPool,
        id: LeaveRequestId,
        requester: Requester,
    ) -> Result<LeaveRequest, AppError> {
        let mut tx = db.begin().await?;

        let request = Self::lock_request(&mut tx, id).await?;
        if request.user_id != requester.user_id && !requester.is_reviewer {
            return Err(AppError::forbidden("You can only cancel your own requests"));
        }

        let next = request.status.apply(LeaveAction::Cancel).map_err(rule_error)?;
        if request.status == LeaveStatus::Confirmada {
            Self::lock_user(&mut tx, request.user_id).await?;
            Self::adjust_balance(&mut tx, &request, 1).await?;
        }
        let cancelled = Self::set_status(&mut tx, id, next, requester.user_id).await?;

        tx.commit().await?;
        Ok(cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brigada_models::requests::LeaveKind;
    use chrono::NaiveDate;

    async fn seed_user(pool: &PgPool, vacation_days: i32) -> UserId {
        sqlx::query_scalar::<_, UserId>(
            "INSERT INTO users (first_name, last_name, dni, email, password, vacation_days, \
             compensation_hours) VALUES ('Marta', 'Gil', '00000003A', 'marta@parque.es', 'x', $1, 10) \
             RETURNING id",
        )
        .bind(vacation_days)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, d).unwrap()
    }

    fn vacation(from: u32, to: u32) -> CreateLeaveRequestDto {
        CreateLeaveRequestDto {
            kind: LeaveKind::Vacaciones,
            start_date: day(from),
            end_date: day(to),
            hours: None,
            reason: None,
        }
    }

    async fn vacation_days(pool: &PgPool, user_id: UserId) -> i32 {
        sqlx::query_scalar::<_, i32>("SELECT vacation_days FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_confirm_deducts_and_cancel_refunds(pool: PgPool) {
        let user = seed_user(&pool, 10).await;
        let request = LeaveRequestService::create_request(&pool, user, vacation(1, 5))
            .await
            .unwrap();
        assert_eq!(request.status, LeaveStatus::Pendiente);
        assert_eq!(vacation_days(&pool, user).await, 10);

        let confirmed = LeaveRequestService::confirm_request(&pool, request.id, user)
            .await
            .unwrap();
        assert_eq!(confirmed.status, LeaveStatus::Confirmada);
        assert_eq!(confirmed.reviewed_by, Some(user));
        assert_eq!(vacation_days(&pool, user).await, 5);

        let requester = Requester {
            user_id: user,
            is_reviewer: false,
        };
        let cancelled = LeaveRequestService::cancel_request(&pool, request.id, requester)
            .await
            .unwrap();
        assert_eq!(cancelled.status, LeaveStatus::Cancelada);
        assert_eq!(vacation_days(&pool, user).await, 10);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_overlap_conflicts(pool: PgPool) {
        let user = seed_user(&pool, 30).await;
        LeaveRequestService::create_request(&pool, user, vacation(1, 5))
            .await
            .unwrap();
        let err = LeaveRequestService::create_request(&pool, user, vacation(5, 8))
            .await
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::CONFLICT);

        LeaveRequestService::create_request(&pool, user, vacation(6, 8))
            .await
            .unwrap();
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_insufficient_balance(pool: PgPool) {
        let user = seed_user(&pool, 3).await;
        let err = LeaveRequestService::create_request(&pool, user, vacation(1, 4))
            .await
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_confirm_rechecks_balance(pool: PgPool) {
        let user = seed_user(&pool, 5).await;
        let request = LeaveRequestService::create_request(&pool, user, vacation(1, 5))
            .await
            .unwrap();
        sqlx::query("UPDATE users SET vacation_days = 2 WHERE id = $1")
            .bind(user)
            .execute(&pool)
            .await
            .unwrap();

        let err = LeaveRequestService::confirm_request(&pool, request.id, user)
            .await
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(vacation_days(&pool, user).await, 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_deny_twice_conflicts(pool: PgPool) {
        let user = seed_user(&pool, 10).await;
        let request = LeaveRequestService::create_request(&pool, user, vacation(1, 2))
            .await
            .unwrap();
        LeaveRequestService::deny_request(&pool, request.id, user)
            .await
            .unwrap();
        let err = LeaveRequestService::deny_request(&pool, request.id, user)
            .await
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::CONFLICT);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_list_scoped_to_caller(pool: PgPool) {
        let user = seed_user(&pool, 10).await;
        let other = sqlx::query_scalar::<_, UserId>(
            "INSERT INTO users (first_name, last_name, dni, email, password) \
             VALUES ('Iker', 'Sanz', '00000004G', 'iker@parque.es', 'x') RETURNING id",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        LeaveRequestService::create_request(&pool, user, vacation(1, 2))
            .await
            .unwrap();
        LeaveRequestService::create_request(&pool, other, vacation(1, 2))
            .await
            .unwrap();

        let own = LeaveRequestService::get_requests(&pool, other, false, LeaveFilterParams::default())
            .await
            .unwrap();
        assert_eq!(own.meta.total, 1);
        assert_eq!(own.data[0].user_id, other);

        let all = LeaveRequestService::get_requests(&pool, other, true, LeaveFilterParams::default())
            .await
            .unwrap();
        assert_eq!(all.meta.total, 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_hourly_request_shape(pool: PgPool) {
        let user = seed_user(&pool, 10).await;
        let dto = CreateLeaveRequestDto {
            kind: LeaveKind::CompensacionHoras,
            start_date: day(1),
            end_date: day(2),
            hours: Some(4),
            reason: None,
        };
        let err = LeaveRequestService::create_request(&pool, user, dto.clone())
            .await
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);

        let single_day = CreateLeaveRequestDto {
            end_date: day(1),
            ..dto
        };
        let request = LeaveRequestService::create_request(&pool, user, single_day)
            .await
            .unwrap();
        assert_eq!(request.hours, Some(4));
    }
}
