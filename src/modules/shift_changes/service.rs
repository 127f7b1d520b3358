use anyhow::Context;
use brigada_core::{AppError, PaginationMeta};
use brigada_models::assignments::AssignmentReason;
use brigada_models::{ShiftChangeId, UserId};
use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use super::model::{
    Actor, CreateShiftChangeDto, PaginatedShiftChangesResponse, ShiftChangeAction,
    ShiftChangeError, ShiftChangeFilterParams, ShiftChangeRequest, transition,
};
use crate::modules::assignments::service::AssignmentService;
use crate::modules::users::service::UserService;

const SHIFT_CHANGE_COLUMNS: &str = "id, requester_id, counterpart_id, requester_brigade_id, \
     counterpart_brigade_id, date, mirror_date, reason, status, decided_by, created_at, updated_at";

fn transition_error(err: ShiftChangeError) -> AppError {
    match err {
        ShiftChangeError::NotAllowed(_) => AppError::forbidden(err.to_string()),
        ShiftChangeError::IllegalTransition { .. } => AppError::conflict(err),
    }
}

/// `None` lists every request; otherwise only those `user_id` takes part in.
fn push_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    involved: Option<UserId>,
    filters: &ShiftChangeFilterParams,
) {
    qb.push(" WHERE 1=1");
    if let Some(user_id) = involved {
        qb.push(" AND (requester_id = ")
            .push_bind(user_id)
            .push(" OR counterpart_id = ")
            .push_bind(user_id)
            .push(")");
    }
    if let Some(status) = filters.status {
        qb.push(" AND status = ").push_bind(status);
    }
}

pub struct ShiftChangeService;

impl ShiftChangeService {
    /// Files a swap between the caller and `dto.counterpart_id`. Both
    /// brigades are taken from the roster: the requester's on `date`, the
    /// counterpart's on `mirror_date` (or `date` for a simple swap).
    #[instrument(skip(db, dto), fields(requester = %requester_id, counterpart = %dto.counterpart_id))]
    pub async fn create_shift_change(
        db: &PgPool,
        requester_id: UserId,
        dto: CreateShiftChangeDto,
        today: NaiveDate,
    ) -> Result<ShiftChangeRequest, AppError> {
        if dto.counterpart_id == requester_id {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "You cannot swap a guard with yourself"
            )));
        }
        if dto.date < today {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Cannot request a shift change for a past date"
            )));
        }
        if dto.mirror_date.is_some_and(|mirror| mirror < today) {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Cannot request a shift change for a past mirror_date"
            )));
        }
        if dto.mirror_date == Some(dto.date) {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "mirror_date must differ from date"
            )));
        }
        if !UserService::exists(db, dto.counterpart_id).await? {
            return Err(AppError::not_found(anyhow::anyhow!("Counterpart not found")));
        }

        let counterpart_day = dto.mirror_date.unwrap_or(dto.date);
        let requester_brigade = AssignmentService::brigade_on(db, requester_id, dto.date).await?;
        let counterpart_brigade =
            AssignmentService::brigade_on(db, dto.counterpart_id, counterpart_day).await?;

        let (Some(requester_brigade), Some(counterpart_brigade)) =
            (requester_brigade, counterpart_brigade)
        else {
            return Err(AppError::unprocessable(anyhow::anyhow!(
                "Both firefighters must be assigned to a brigade on the swap dates"
            )));
        };

        if requester_brigade == counterpart_brigade {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Both firefighters serve in the same brigade"
            )));
        }

        let request = sqlx::query_as::<_, ShiftChangeRequest>(&format!(
            "INSERT INTO shift_change_requests (requester_id, counterpart_id, requester_brigade_id, \
             counterpart_brigade_id, date, mirror_date, reason) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            SHIFT_CHANGE_COLUMNS
        ))
        .bind(requester_id)
        .bind(dto.counterpart_id)
        .bind(requester_brigade)
        .bind(counterpart_brigade)
        .bind(dto.date)
        .bind(dto.mirror_date)
        .bind(&dto.reason)
        .fetch_one(db)
        .await
        .context("Failed to create shift change")
        .map_err(AppError::database)?;

        brigada_observability::track_shift_change(request.status.as_str());
        tracing::info!(shift_change.id = %request.id, "shift change requested");
        Ok(request)
    }

    #[instrument(skip(db))]
    pub async fn get_shift_changes(
        db: &PgPool,
        user_id: UserId,
        is_reviewer: bool,
        filters: ShiftChangeFilterParams,
    ) -> Result<PaginatedShiftChangesResponse, AppError> {
        let involved = (!is_reviewer).then_some(user_id);

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM shift_change_requests");
        push_filters(&mut count, involved, &filters);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(db)
            .await
            .context("Failed to count shift changes")
            .map_err(AppError::database)?;

        let mut data = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM shift_change_requests",
            SHIFT_CHANGE_COLUMNS
        ));
        push_filters(&mut data, involved, &filters);
        data.push(" ORDER BY date DESC, created_at DESC LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let requests = data
            .build_query_as::<ShiftChangeRequest>()
            .fetch_all(db)
            .await
            .context("Failed to fetch shift changes")
            .map_err(AppError::database)?;

        Ok(PaginatedShiftChangesResponse {
            data: requests,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_shift_change(
        db: &PgPool,
        id: ShiftChangeId,
        user_id: UserId,
        is_reviewer: bool,
    ) -> Result<ShiftChangeRequest, AppError> {
        let request = sqlx::query_as::<_, ShiftChangeRequest>(&format!(
            "SELECT {} FROM shift_change_requests WHERE id = $1",
            SHIFT_CHANGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch shift change")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Shift change not found")))?;

        if !Self::actor(&request, user_id, is_reviewer).is_involved() {
            return Err(AppError::forbidden("You are not involved in this shift change"));
        }
        Ok(request)
    }

    fn actor(request: &ShiftChangeRequest, user_id: UserId, is_reviewer: bool) -> Actor {
        Actor {
            is_requester: request.requester_id == user_id,
            is_counterpart: request.counterpart_id == user_id,
            is_reviewer,
        }
    }

    async fn lock(
        conn: &mut PgConnection,
        id: ShiftChangeId,
    ) -> Result<ShiftChangeRequest, AppError> {
        sqlx::query_as::<_, ShiftChangeRequest>(&format!(
            "SELECT {} FROM shift_change_requests WHERE id = $1 FOR UPDATE",
            SHIFT_CHANGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(conn)
        .await
        .context("Failed to lock shift change")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Shift change not found")))
    }

    /// Applies `action` by `user_id`. Approval also writes the swap into the
    /// assignment history in the same transaction.
    #[instrument(skip(db))]
    pub async fn decide(
        db: &PgPool,
        id: ShiftChangeId,
        action: ShiftChangeAction,
        user_id: UserId,
        is_reviewer: bool,
    ) -> Result<ShiftChangeRequest, AppError> {
        let mut tx = db.begin().await?;

        let request = Self::lock(&mut tx, id).await?;
        let actor = Self::actor(&request, user_id, is_reviewer);
        if !actor.is_involved() {
            return Err(AppError::forbidden("You are not involved in this shift change"));
        }

        let next = transition(request.status, action, actor).map_err(transition_error)?;
        // Accepting is the counterpart agreeing, not a decision.
        let decided_by = (action != ShiftChangeAction::Accept).then_some(user_id);

        let updated = sqlx::query_as::<_, ShiftChangeRequest>(&format!(
            "UPDATE shift_change_requests SET status = $1, \
             decided_by = COALESCE($2, decided_by), updated_at = NOW() \
             WHERE id = $3 RETURNING {}",
            SHIFT_CHANGE_COLUMNS
        ))
        .bind(next)
        .bind(decided_by)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to update shift change")
        .map_err(AppError::database)?;

        if action == ShiftChangeAction::Approve {
            AssignmentService::record_moves(
                &mut tx,
                &updated.swap_moves(),
                AssignmentReason::CambioGuardia,
                Some(user_id),
            )
            .await?;
        }

        tx.commit().await?;

        brigada_observability::track_shift_change(next.as_str());
        tracing::info!(shift_change.id = %id, %action, status = %next, "shift change updated");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::shift_changes::model::ShiftChangeStatus;
    use brigada_models::BrigadeId;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    async fn seed_user(pool: &PgPool, dni: &str) -> UserId {
        sqlx::query_scalar::<_, UserId>(
            "INSERT INTO users (first_name, last_name, dni, email, password, role) \
             VALUES ('Test', $1, $1, $1 || '@parque.es', 'x', 'bombero') RETURNING id",
        )
        .bind(dni)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn seed_brigade(pool: &PgPool, park: &str) -> BrigadeId {
        sqlx::query_scalar::<_, BrigadeId>(
            "WITH p AS (INSERT INTO parks (name) VALUES ($1) RETURNING id) \
             INSERT INTO brigades (name, park_id) SELECT 'Brigada A', id FROM p RETURNING id",
        )
        .bind(park)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn assign(pool: &PgPool, user: UserId, brigade: BrigadeId) {
        sqlx::query(
            "INSERT INTO firefighter_assignments (user_id, brigade_destination_id, start_date, reason) \
             VALUES ($1, $2, $3, 'traslado')",
        )
        .bind(user)
        .bind(brigade)
        .bind(day(1))
        .execute(pool)
        .await
        .unwrap();
    }

    struct Fixture {
        requester: UserId,
        counterpart: UserId,
        a: BrigadeId,
        b: BrigadeId,
    }

    async fn fixture(pool: &PgPool) -> Fixture {
        let requester = seed_user(pool, "00000001R").await;
        let counterpart = seed_user(pool, "00000002W").await;
        let a = seed_brigade(pool, "Parque Norte").await;
        let b = seed_brigade(pool, "Parque Sur").await;
        assign(pool, requester, a).await;
        assign(pool, counterpart, b).await;
        Fixture {
            requester,
            counterpart,
            a,
            b,
        }
    }

    fn swap(counterpart: UserId, mirror_date: Option<NaiveDate>) -> CreateShiftChangeDto {
        CreateShiftChangeDto {
            counterpart_id: counterpart,
            date: day(10),
            mirror_date,
            reason: None,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_simple_swap_flow(pool: PgPool) {
        let f = fixture(&pool).await;
        let request = ShiftChangeService::create_shift_change(
            &pool,
            f.requester,
            swap(f.counterpart, None),
            day(2),
        )
        .await
        .unwrap();
        assert_eq!(request.status, ShiftChangeStatus::EnTramite);
        assert_eq!(request.requester_brigade_id, f.a);
        assert_eq!(request.counterpart_brigade_id, f.b);

        let accepted = ShiftChangeService::decide(
            &pool,
            request.id,
            ShiftChangeAction::Accept,
            f.counterpart,
            false,
        )
        .await
        .unwrap();
        assert_eq!(accepted.status, ShiftChangeStatus::AceptadoPorEmpleados);
        assert_eq!(accepted.decided_by, None);

        let reviewer = seed_user(&pool, "00000003A").await;
        let approved =
            ShiftChangeService::decide(&pool, request.id, ShiftChangeAction::Approve, reviewer, true)
                .await
                .unwrap();
        assert_eq!(approved.status, ShiftChangeStatus::Aceptado);
        assert_eq!(approved.decided_by, Some(reviewer));

        let on = |user| AssignmentService::brigade_on(&pool, user, day(10));
        assert_eq!(on(f.requester).await.unwrap(), Some(f.b));
        assert_eq!(on(f.counterpart).await.unwrap(), Some(f.a));

        let after = |user| AssignmentService::brigade_on(&pool, user, day(11));
        assert_eq!(after(f.requester).await.unwrap(), Some(f.a));
        assert_eq!(after(f.counterpart).await.unwrap(), Some(f.b));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_validations(pool: PgPool) {
        let f = fixture(&pool).await;
        let status = |r: Result<ShiftChangeRequest, AppError>| r.unwrap_err().status;

        let own = ShiftChangeService::create_shift_change(&pool, f.requester, swap(f.requester, None), day(2)).await;
        assert_eq!(status(own), axum::http::StatusCode::BAD_REQUEST);

        let past = ShiftChangeService::create_shift_change(&pool, f.requester, swap(f.counterpart, None), day(11)).await;
        assert_eq!(status(past), axum::http::StatusCode::BAD_REQUEST);

        let same_day = ShiftChangeService::create_shift_change(
            &pool,
            f.requester,
            swap(f.counterpart, Some(day(10))),
            day(2),
        )
        .await;
        assert_eq!(status(same_day), axum::http::StatusCode::BAD_REQUEST);

        let unassigned = seed_user(&pool, "00000004G").await;
        let missing = ShiftChangeService::create_shift_change(&pool, f.requester, swap(unassigned, None), day(2)).await;
        assert_eq!(status(missing), axum::http::StatusCode::UNPROCESSABLE_ENTITY);

        let teammate = seed_user(&pool, "00000005M").await;
        assign(&pool, teammate, f.a).await;
        let same_brigade = ShiftChangeService::create_shift_change(&pool, f.requester, swap(teammate, None), day(2)).await;
        assert_eq!(status(same_brigade), axum::http::StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_strangers_and_illegal_transitions(pool: PgPool) {
        let f = fixture(&pool).await;
        let request = ShiftChangeService::create_shift_change(
            &pool,
            f.requester,
            swap(f.counterpart, None),
            day(2),
        )
        .await
        .unwrap();

        let stranger = seed_user(&pool, "00000003A").await;
        let err = ShiftChangeService::decide(&pool, request.id, ShiftChangeAction::Accept, stranger, false)
            .await
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::FORBIDDEN);

        let err = ShiftChangeService::decide(&pool, request.id, ShiftChangeAction::Approve, stranger, true)
            .await
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::CONFLICT);

        let listed = ShiftChangeService::get_shift_changes(
            &pool,
            stranger,
            false,
            ShiftChangeFilterParams::default(),
        )
        .await
        .unwrap();
        assert_eq!(listed.meta.total, 0);

        let listed = ShiftChangeService::get_shift_changes(
            &pool,
            f.counterpart,
            false,
            ShiftChangeFilterParams::default(),
        )
        .await
        .unwrap();
        assert_eq!(listed.meta.total, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_past_mirror_date_is_rejected(pool: PgPool) {
        let f = fixture(&pool).await;

        let err = ShiftChangeService::create_shift_change(
            &pool,
            f.requester,
            swap(f.counterpart, Some(day(3))),
            day(5),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);

        let filed = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM shift_change_requests")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(filed, 0);
    }
}
