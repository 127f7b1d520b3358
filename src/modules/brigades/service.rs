use anyhow::Context;
use brigada_core::{AppError, PaginationMeta};
use brigada_models::{BrigadeId, ParkId};
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use super::model::{
    Brigade, BrigadeFilterParams, BrigadeRoster, BrigadeWithPark, CreateBrigadeDto,
    PaginatedBrigadesResponse, UpdateBrigadeDto,
};
use crate::modules::assignments::service::AssignmentService;

const BRIGADE_COLUMNS: &str = "id, name, park_id, created_at, updated_at";
const DUPLICATE_BRIGADE: &str = "The park already has a brigade with this name";

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &BrigadeFilterParams) {
    qb.push(" WHERE 1=1");
    if let Some(park_id) = filters.park_id {
        qb.push(" AND b.park_id = ").push_bind(park_id);
    }
    if let Some(name) = filters.name.as_deref().filter(|n| !n.trim().is_empty()) {
        qb.push(" AND b.name ILIKE ")
            .push_bind(format!("%{}%", name.trim()));
    }
}

pub struct BrigadeService;

impl BrigadeService {
    async fn ensure_park(db: &PgPool, park_id: ParkId) -> Result<(), AppError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM parks WHERE id = $1)")
                .bind(park_id)
                .fetch_one(db)
                .await?;
        if !exists {
            return Err(AppError::not_found(anyhow::anyhow!("Park not found")));
        }
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn create_brigade(db: &PgPool, dto: CreateBrigadeDto) -> Result<Brigade, AppError> {
        Self::ensure_park(db, dto.park_id).await?;

        let brigade = sqlx::query_as::<_, Brigade>(&format!(
            "INSERT INTO brigades (name, park_id) VALUES ($1, $2) RETURNING {}",
            BRIGADE_COLUMNS
        ))
        .bind(dto.name.trim())
        .bind(dto.park_id)
        .fetch_one(db)
        .await
        .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_BRIGADE))?;

        tracing::info!(brigade.id = %brigade.id, park.id = %brigade.park_id, "brigade created");
        Ok(brigade)
    }

    #[instrument(skip(db))]
    pub async fn get_brigades(
        db: &PgPool,
        filters: BrigadeFilterParams,
    ) -> Result<PaginatedBrigadesResponse, AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM brigades b");
        push_filters(&mut count, &filters);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(db)
            .await
            .context("Failed to count brigades")
            .map_err(AppError::database)?;

        let mut data = QueryBuilder::<Postgres>::new(
            "SELECT b.id, b.name, b.park_id, p.name AS park_name, b.created_at, b.updated_at \
             FROM brigades b JOIN parks p ON p.id = b.park_id",
        );
        push_filters(&mut data, &filters);
        data.push(" ORDER BY p.name, b.name LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let brigades = data
            .build_query_as::<BrigadeWithPark>()
            .fetch_all(db)
            .await
            .context("Failed to fetch brigades")
            .map_err(AppError::database)?;

        Ok(PaginatedBrigadesResponse {
            data: brigades,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_brigade(db: &PgPool, id: BrigadeId) -> Result<BrigadeWithPark, AppError> {
        sqlx::query_as::<_, BrigadeWithPark>(
            "SELECT b.id, b.name, b.park_id, p.name AS park_name, b.created_at, b.updated_at \
             FROM brigades b JOIN parks p ON p.id = b.park_id WHERE b.id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch brigade")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Brigade not found")))
    }

    #[instrument(skip(db))]
    pub async fn update_brigade(
        db: &PgPool,
        id: BrigadeId,
        dto: UpdateBrigadeDto,
    ) -> Result<Brigade, AppError> {
        if let Some(park_id) = dto.park_id {
            Self::ensure_park(db, park_id).await?;
        }

        sqlx::query_as::<_, Brigade>(&format!(
            "UPDATE brigades SET name = COALESCE($1, name), park_id = COALESCE($2, park_id), \
             updated_at = NOW() WHERE id = $3 RETURNING {}",
            BRIGADE_COLUMNS
        ))
        .bind(dto.name.as_deref().map(str::trim))
        .bind(dto.park_id)
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_BRIGADE))?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Brigade not found")))
    }

    /// A brigade that any roster data points at cannot be removed, since
    /// dropping its assignments would move members back to older brigades.
    #[instrument(skip(db))]
    pub async fn delete_brigade(db: &PgPool, id: BrigadeId) -> Result<(), AppError> {
        let (assignments, guards, shift_changes, requirements) =
            sqlx::query_as::<_, (i64, i64, i64, i64)>(
                "SELECT \
                 (SELECT COUNT(*) FROM firefighter_assignments \
                  WHERE brigade_destination_id = $1 OR brigade_origin_id = $1), \
                 (SELECT COUNT(*) FROM guards WHERE brigade_id = $1), \
                 (SELECT COUNT(*) FROM shift_change_requests \
                  WHERE requester_brigade_id = $1 OR counterpart_brigade_id = $1), \
                 (SELECT COUNT(*) FROM requirements WHERE brigade_id = $1)",
            )
            .bind(id)
            .fetch_one(db)
            .await
            .context("Failed to count brigade dependencies")
            .map_err(AppError::database)?;

        if assignments > 0 || guards > 0 || shift_changes > 0 || requirements > 0 {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Brigade still has {} assignment(s), {} guard(s), {} shift change(s) and {} requirement(s)",
                assignments,
                guards,
                shift_changes,
                requirements
            )));
        }

        let result = sqlx::query("DELETE FROM brigades WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete brigade")
            .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Brigade not found")));
        }

        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn get_roster(
        db: &PgPool,
        id: BrigadeId,
        date: NaiveDate,
    ) -> Result<BrigadeRoster, AppError> {
        Self::get_brigade(db, id).await?;
        let firefighters = AssignmentService::roster(db, id, date).await?;

        Ok(BrigadeRoster {
            brigade_id: id,
            date,
            firefighters,
        })
    }
}
