use anyhow::Context;
use brigada_core::{AppError, PaginationMeta};
use brigada_models::users::UserSummary;
use brigada_models::{AssignmentId, BrigadeId, UserId};
use chrono::NaiveDate;
use sqlx::{PgConnection, PgExecutor, PgPool, Postgres, QueryBuilder};
use tracing::{debug, instrument};

use super::model::{
    AssignmentFilterParams, AssignmentReason, CreateAssignmentDto, FirefighterAssignment,
    PaginatedAssignmentsResponse, PlannedMove,
};

const ASSIGNMENT_COLUMNS: &str = "id, user_id, brigade_origin_id, brigade_destination_id, \
     start_date, reason, created_by, created_at";

/// Pushes a derived table `(user_id, brigade_id)` holding every user's
/// effective brigade on `date`: the destination of their latest assignment
/// by `(start_date, created_at)` with `start_date <= date`.
pub fn push_effective_brigades(qb: &mut QueryBuilder<'_, Postgres>, date: NaiveDate) {
    qb.push(
        "(SELECT DISTINCT ON (fa.user_id) fa.user_id, fa.brigade_destination_id AS brigade_id \
         FROM firefighter_assignments fa WHERE fa.start_date <= ",
    );
    qb.push_bind(date);
    qb.push(" ORDER BY fa.user_id, fa.start_date DESC, fa.created_at DESC)");
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &AssignmentFilterParams) {
    qb.push(" WHERE 1=1");
    if let Some(user_id) = filters.user_id {
        qb.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(brigade_id) = filters.brigade_id {
        qb.push(" AND (brigade_destination_id = ")
            .push_bind(brigade_id)
            .push(" OR brigade_origin_id = ")
            .push_bind(brigade_id)
            .push(")");
    }
    if let Some(from) = filters.from {
        qb.push(" AND start_date >= ").push_bind(from);
    }
    if let Some(to) = filters.to {
        qb.push(" AND start_date <= ").push_bind(to);
    }
}

pub struct AssignmentService;

impl AssignmentService {
    /// The brigade `user_id` serves in on `date`, if they were ever assigned
    /// on or before it.
    #[instrument(skip(db))]
    pub async fn brigade_on<'e, E>(
        db: E,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Option<BrigadeId>, AppError>
    where
        E: PgExecutor<'e>,
    {
        let brigade = sqlx::query_scalar::<_, BrigadeId>(
            "SELECT brigade_destination_id FROM firefighter_assignments \
             WHERE user_id = $1 AND start_date <= $2 \
             ORDER BY start_date DESC, created_at DESC LIMIT 1",
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(db)
        .await
        .context("Failed to resolve effective brigade")
        .map_err(AppError::database)?;

        Ok(brigade)
    }

    /// Everyone whose effective brigade on `date` is `brigade_id`.
    #[instrument(skip(db))]
    pub async fn roster<'e, E>(
        db: E,
        brigade_id: BrigadeId,
        date: NaiveDate,
    ) -> Result<Vec<UserSummary>, AppError>
    where
        E: PgExecutor<'e>,
    {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT u.id, u.first_name, u.last_name, u.dni, u.role FROM ",
        );
        push_effective_brigades(&mut qb, date);
        qb.push(" eb JOIN users u ON u.id = eb.user_id WHERE eb.brigade_id = ")
            .push_bind(brigade_id)
            .push(" ORDER BY u.last_name, u.first_name, u.dni");

        let roster = qb
            .build_query_as::<UserSummary>()
            .fetch_all(db)
            .await
            .context("Failed to fetch brigade roster")
            .map_err(AppError::database)?;

        Ok(roster)
    }

    /// Inserts one assignment row per planned move.
    pub async fn record_moves(
        conn: &mut PgConnection,
        moves: &[PlannedMove],
        reason: AssignmentReason,
        created_by: Option<UserId>,
    ) -> Result<u64, AppError> {
        if moves.is_empty() {
            return Ok(0);
        }

        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO firefighter_assignments \
             (user_id, brigade_origin_id, brigade_destination_id, start_date, reason, created_by) ",
        );
        qb.push_values(moves, |mut row, m| {
            row.push_bind(m.user_id)
                .push_bind(m.origin)
                .push_bind(m.destination)
                .push_bind(m.start_date)
                .push_bind(reason)
                .push_bind(created_by);
        });

        let result = qb
            .build()
            .execute(conn)
            .await
            .context("Failed to record assignments")
            .map_err(AppError::database)?;

        debug!(rows = result.rows_affected(), ?reason, "assignments recorded");
        Ok(result.rows_affected())
    }

    #[instrument(skip(db, dto), fields(user.id = %dto.user_id, brigade.id = %dto.brigade_destination_id))]
    pub async fn create_assignment(
        db: &PgPool,
        dto: CreateAssignmentDto,
        created_by: UserId,
    ) -> Result<FirefighterAssignment, AppError> {
        let user_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(dto.user_id)
                .fetch_one(db)
                .await?;
        if !user_exists {
            return Err(AppError::not_found(anyhow::anyhow!("User not found")));
        }

        let brigade_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM brigades WHERE id = $1)")
                .bind(dto.brigade_destination_id)
                .fetch_one(db)
                .await?;
        if !brigade_exists {
            return Err(AppError::not_found(anyhow::anyhow!("Brigade not found")));
        }

        let origin = Self::brigade_on(db, dto.user_id, dto.start_date).await?;
        if origin == Some(dto.brigade_destination_id) {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "The firefighter is already in that brigade on {}",
                dto.start_date
            )));
        }

        let assignment = sqlx::query_as::<_, FirefighterAssignment>(&format!(
            "INSERT INTO firefighter_assignments \
             (user_id, brigade_origin_id, brigade_destination_id, start_date, reason, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            ASSIGNMENT_COLUMNS
        ))
        .bind(dto.user_id)
        .bind(origin)
        .bind(dto.brigade_destination_id)
        .bind(dto.start_date)
        .bind(dto.reason)
        .bind(created_by)
        .fetch_one(db)
        .await
        .context("Failed to create assignment")
        .map_err(AppError::database)?;

        tracing::info!(assignment.id = %assignment.id, origin = ?origin, "firefighter assigned");
        Ok(assignment)
    }

    #[instrument(skip(db))]
    pub async fn get_assignments(
        db: &PgPool,
        filters: AssignmentFilterParams,
    ) -> Result<PaginatedAssignmentsResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM firefighter_assignments");
        push_filters(&mut count, &filters);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(db)
            .await
            .context("Failed to count assignments")
            .map_err(AppError::database)?;

        let mut data = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM firefighter_assignments",
            ASSIGNMENT_COLUMNS
        ));
        push_filters(&mut data, &filters);
        data.push(" ORDER BY start_date DESC, created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let assignments = data
            .build_query_as::<FirefighterAssignment>()
            .fetch_all(db)
            .await
            .context("Failed to fetch assignments")
            .map_err(AppError::database)?;

        Ok(PaginatedAssignmentsResponse {
            data: assignments,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn delete_assignment(db: &PgPool, id: AssignmentId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM firefighter_assignments WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete assignment")
            .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Assignment not found")));
        }

        Ok(())
    }
}
