use anyhow::Context;
use brigada_core::{AppError, PaginationMeta};
use brigada_models::assignments::{AssignmentReason, PlannedMove};
use brigada_models::dates::next_day;
use brigada_models::{RequirementId, UserId};
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

use super::model::{
    AvailableParams, CreateRequirementDto, PaginatedRequirementsResponse, Requirement,
    RequirementCandidate, RequirementFilterParams, rank_candidates,
};
use crate::modules::assignments::service::{AssignmentService, push_effective_brigades};

const REQUIREMENT_COLUMNS: &str = "id, user_id, brigade_id, date, hours, created_by, created_at";

/// Pushes the candidate select for `date`: every user with their effective
/// brigade and the three facts that rule them out. Callers append `AND`
/// conditions.
fn push_candidates(qb: &mut QueryBuilder<'_, Postgres>, date: NaiveDate) {
    qb.push(
        "SELECT u.id, u.first_name, u.last_name, u.dni, u.role, u.offered_hours, u.offered_at, \
         eb.brigade_id, \
         EXISTS(SELECT 1 FROM guards g WHERE g.brigade_id = eb.brigade_id AND g.date = ",
    );
    qb.push_bind(date);
    qb.push(
        ") AS on_duty, \
         EXISTS(SELECT 1 FROM leave_requests lr WHERE lr.user_id = u.id \
         AND lr.status IN ('pendiente', 'confirmada') AND lr.start_date <= ",
    );
    qb.push_bind(date);
    qb.push(" AND lr.end_date >= ");
    qb.push_bind(date);
    qb.push(
        ") AS on_leave, \
         EXISTS(SELECT 1 FROM requirements r WHERE r.user_id = u.id AND r.date = ",
    );
    qb.push_bind(date);
    qb.push(") AS already_required FROM users u LEFT JOIN ");
    push_effective_brigades(qb, date);
    qb.push(" eb ON eb.user_id = u.id LEFT JOIN brigades b ON b.id = eb.brigade_id WHERE 1=1");
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &RequirementFilterParams) {
    qb.push(" WHERE 1=1");
    if let Some(from) = filters.from {
        qb.push(" AND date >= ").push_bind(from);
    }
    if let Some(to) = filters.to {
        qb.push(" AND date <= ").push_bind(to);
    }
    if let Some(user_id) = filters.user_id {
        qb.push(" AND user_id = ").push_bind(user_id);
    }
}

pub struct RequirementService;

impl RequirementService {
    /// The recall list for `params.date`: operational firefighters who
    /// offered hours and are off duty, not on leave and not already
    /// recalled that day, best candidate first.
    #[instrument(skip(db))]
    pub async fn get_available(
        db: &PgPool,
        params: AvailableParams,
    ) -> Result<Vec<RequirementCandidate>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("");
        push_candidates(&mut qb, params.date);
        qb.push(" AND u.role IN ('bombero', 'mando') AND u.offered_hours > 0");
        if let Some(park_id) = params.park_id {
            qb.push(" AND b.park_id = ").push_bind(park_id);
        }

        let candidates = qb
            .build_query_as::<RequirementCandidate>()
            .fetch_all(db)
            .await
            .context("Failed to fetch requirement candidates")
            .map_err(AppError::database)?;

        let ranked = rank_candidates(candidates);
        tracing::debug!(date = %params.date, available = ranked.len(), "recall list built");
        Ok(ranked)
    }

    /// Recalls a firefighter to a brigade on guard. The firefighter moves to
    /// that brigade for the day and returns to wherever the roster had them
    /// the day after.
    #[instrument(skip(db, dto), fields(user.id = %dto.user_id, brigade.id = %dto.brigade_id, date = %dto.date))]
    pub async fn create_requirement(
        db: &PgPool,
        dto: CreateRequirementDto,
        created_by: UserId,
    ) -> Result<Requirement, AppError> {
        let mut tx = db.begin().await?;

        let has_guard = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM guards WHERE brigade_id = $1 AND date = $2)",
        )
        .bind(dto.brigade_id)
        .bind(dto.date)
        .fetch_one(&mut *tx)
        .await?;

        if !has_guard {
            return Err(AppError::unprocessable(anyhow::anyhow!(
                "The brigade has no guard on {}",
                dto.date
            )));
        }

        // Serializes concurrent recalls of the same firefighter.
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(dto.user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))?;

        let mut qb = QueryBuilder::<Postgres>::new("");
        push_candidates(&mut qb, dto.date);
        qb.push(" AND u.id = ").push_bind(dto.user_id);
        let candidate = qb
            .build_query_as::<RequirementCandidate>()
            .fetch_one(&mut *tx)
            .await
            .context("Failed to check availability")
            .map_err(AppError::database)?;

        if !candidate.is_available() {
            return Err(AppError::conflict(anyhow::anyhow!(
                "The firefighter is not available on {}",
                dto.date
            )));
        }

        let return_day = next_day(dto.date);
        let return_to = AssignmentService::brigade_on(&mut *tx, dto.user_id, return_day).await?;

        let requirement = sqlx::query_as::<_, Requirement>(&format!(
            "INSERT INTO requirements (user_id, brigade_id, date, hours, created_by) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            REQUIREMENT_COLUMNS
        ))
        .bind(dto.user_id)
        .bind(dto.brigade_id)
        .bind(dto.date)
        .bind(dto.hours)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(e, "The firefighter already has a requirement that day")
        })?;

        let mut moves = vec![PlannedMove {
            user_id: dto.user_id,
            origin: candidate.brigade_id,
            destination: dto.brigade_id,
            start_date: dto.date,
        }];
        if let Some(home) = return_to {
            moves.push(PlannedMove {
                user_id: dto.user_id,
                origin: Some(dto.brigade_id),
                destination: home,
                start_date: return_day,
            });
        }
        AssignmentService::record_moves(
            &mut tx,
            &moves,
            AssignmentReason::Requerimiento,
            Some(created_by),
        )
        .await?;

        sqlx::query(
            "UPDATE users SET offered_hours = GREATEST(offered_hours - $1, 0), updated_at = NOW() \
             WHERE id = $2",
        )
        .bind(dto.hours)
        .bind(dto.user_id)
        .execute(&mut *tx)
        .await
        .context("Failed to update offered hours")
        .map_err(AppError::database)?;

        tx.commit().await?;

        brigada_observability::track_requirement_created();
        tracing::info!(requirement.id = %requirement.id, "requirement created");
        Ok(requirement)
    }

    #[instrument(skip(db))]
    pub async fn get_requirements(
        db: &PgPool,
        filters: RequirementFilterParams,
    ) -> Result<PaginatedRequirementsResponse, AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM requirements");
        push_filters(&mut count, &filters);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(db)
            .await
            .context("Failed to count requirements")
            .map_err(AppError::database)?;

        let mut data = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM requirements",
            REQUIREMENT_COLUMNS
        ));
        push_filters(&mut data, &filters);
        data.push(" ORDER BY date DESC, created_at DESC LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let requirements = data
            .build_query_as::<Requirement>()
            .fetch_all(db)
            .await
            .context("Failed to fetch requirements")
            .map_err(AppError::database)?;

        Ok(PaginatedRequirementsResponse {
            data: requirements,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    /// Removes the requirement record. Assignment rows it produced stay in
    /// the history.
    #[instrument(skip(db))]
    pub async fn delete_requirement(db: &PgPool, id: RequirementId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM requirements WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete requirement")
            .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Requirement not found")));
        }
        Ok(())
    }
}
