use anyhow::Context;
use brigada_core::AppError;
use brigada_models::{BrigadeId, DateRange, GuardId, UserId};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::model::{
    CreateGuardDto, GenerateGuardsDto, GenerateGuardsResponse, Guard, GuardFilterParams,
    GuardWithBrigade, UpdateGuardDto, rotation_plan,
};

const GUARD_COLUMNS: &str = "id, brigade_id, date, shift, notes, created_at, updated_at";
const GUARD_VIEW_COLUMNS: &str =
    "g.id, g.brigade_id, b.name AS brigade_name, b.park_id, g.date, g.shift, g.notes";
const DUPLICATE_GUARD: &str = "The brigade already has a guard for that date and shift";

pub struct GuardService;

impl GuardService {
    async fn ensure_brigades(db: &PgPool, ids: &[BrigadeId]) -> Result<(), AppError> {
        let mut unique: Vec<Uuid> = ids.iter().map(|id| id.into_inner()).collect();
        unique.sort();
        unique.dedup();

        let found = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM brigades WHERE id = ANY($1)")
            .bind(&unique)
            .fetch_one(db)
            .await?;

        if found != unique.len() as i64 {
            return Err(AppError::not_found(anyhow::anyhow!("Brigade not found")));
        }
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn create_guard(db: &PgPool, dto: CreateGuardDto) -> Result<Guard, AppError> {
        Self::ensure_brigades(db, &[dto.brigade_id]).await?;

        let guard = sqlx::query_as::<_, Guard>(&format!(
            "INSERT INTO guards (brigade_id, date, shift, notes) VALUES ($1, $2, $3, $4) \
             RETURNING {}",
            GUARD_COLUMNS
        ))
        .bind(dto.brigade_id)
        .bind(dto.date)
        .bind(dto.shift)
        .bind(&dto.notes)
        .fetch_one(db)
        .await
        .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_GUARD))?;

        Ok(guard)
    }

    /// Guards inside `range`, ordered by date then shift.
    #[instrument(skip(db))]
    pub async fn get_guards(
        db: &PgPool,
        filters: &GuardFilterParams,
        range: DateRange,
    ) -> Result<Vec<GuardWithBrigade>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM guards g JOIN brigades b ON b.id = g.brigade_id WHERE g.date >= ",
            GUARD_VIEW_COLUMNS
        ));
        qb.push_bind(range.from)
            .push(" AND g.date <= ")
            .push_bind(range.to);

        if let Some(brigade_id) = filters.brigade_id {
            qb.push(" AND g.brigade_id = ").push_bind(brigade_id);
        }
        if let Some(park_id) = filters.park_id {
            qb.push(" AND b.park_id = ").push_bind(park_id);
        }
        qb.push(" ORDER BY g.date, g.shift, b.name");

        let guards = qb
            .build_query_as::<GuardWithBrigade>()
            .fetch_all(db)
            .await
            .context("Failed to fetch guards")
            .map_err(AppError::database)?;

        debug!(from = %range.from, to = %range.to, count = guards.len(), "guards fetched");
        Ok(guards)
    }

    /// Guards whose brigade is the caller's effective brigade on the guard date.
    #[instrument(skip(db))]
    pub async fn get_user_guards(
        db: &PgPool,
        user_id: UserId,
        range: DateRange,
    ) -> Result<Vec<GuardWithBrigade>, AppError> {
        let guards = sqlx::query_as::<_, GuardWithBrigade>(&format!(
            "SELECT {} FROM guards g JOIN brigades b ON b.id = g.brigade_id \
             WHERE g.date BETWEEN $2 AND $3 \
             AND g.brigade_id = ( \
                 SELECT fa.brigade_destination_id FROM firefighter_assignments fa \
                 WHERE fa.user_id = $1 AND fa.start_date <= g.date \
                 ORDER BY fa.start_date DESC, fa.created_at DESC LIMIT 1) \
             ORDER BY g.date, g.shift",
            GUARD_VIEW_COLUMNS
        ))
        .bind(user_id)
        .bind(range.from)
        .bind(range.to)
        .fetch_all(db)
        .await
        .context("Failed to fetch user guards")
        .map_err(AppError::database)?;

        Ok(guards)
    }

    #[instrument(skip(db))]
    pub async fn get_guard(db: &PgPool, id: GuardId) -> Result<Guard, AppError> {
        sqlx::query_as::<_, Guard>(&format!("SELECT {} FROM guards WHERE id = $1", GUARD_COLUMNS))
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch guard")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Guard not found")))
    }

    #[instrument(skip(db))]
    pub async fn update_guard(
        db: &PgPool,
        id: GuardId,
        dto: UpdateGuardDto,
    ) -> Result<Guard, AppError> {
        if let Some(brigade_id) = dto.brigade_id {
            Self::ensure_brigades(db, &[brigade_id]).await?;
        }

        sqlx::query_as::<_, Guard>(&format!(
            "UPDATE guards SET brigade_id = COALESCE($1, brigade_id), date = COALESCE($2, date), \
             shift = COALESCE($3, shift), notes = COALESCE($4, notes), updated_at = NOW() \
             WHERE id = $5 RETURNING {}",
            GUARD_COLUMNS
        ))
        .bind(dto.brigade_id)
        .bind(dto.date)
        .bind(dto.shift)
        .bind(&dto.notes)
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_GUARD))?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Guard not found")))
    }

    #[instrument(skip(db))]
    pub async fn delete_guard(db: &PgPool, id: GuardId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM guards WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete guard")
            .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Guard not found")));
        }
        Ok(())
    }

    /// Creates one guard per day cycling through `brigade_ids` in order.
    /// Days that already have a guard for that brigade and shift are skipped.
    #[instrument(skip(db), fields(brigades = dto.brigade_ids.len()))]
    pub async fn generate_guards(
        db: &PgPool,
        dto: GenerateGuardsDto,
    ) -> Result<GenerateGuardsResponse, AppError> {
        let range = DateRange::new(dto.start_date, dto.end_date).map_err(AppError::bad_request)?;
        Self::ensure_brigades(db, &dto.brigade_ids).await?;

        let plan = rotation_plan(&dto.brigade_ids, range);
        let planned = plan.len() as u64;
        if plan.is_empty() {
            return Ok(GenerateGuardsResponse {
                created: 0,
                skipped: 0,
            });
        }

        let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO guards (brigade_id, date, shift) ");
        qb.push_values(&plan, |mut row, guard| {
            row.push_bind(guard.brigade_id)
                .push_bind(guard.date)
                .push_bind(dto.shift);
        });
        qb.push(" ON CONFLICT (brigade_id, date, shift) DO NOTHING");

        let created = qb
            .build()
            .execute(db)
            .await
            .context("Failed to insert generated guards")
            .map_err(AppError::database)?
            .rows_affected();

        tracing::info!(created, skipped = planned - created, "guard rotation generated");

        Ok(GenerateGuardsResponse {
            created,
            skipped: planned - created,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brigada_models::guards::GuardShift;
    use chrono::NaiveDate;

    async fn seed_brigades(pool: &PgPool, names: &[&str]) -> Vec<BrigadeId> {
        let park_id = sqlx::query_scalar::<_, uuid::Uuid>(
            "INSERT INTO parks (name) VALUES ('Parque Centro') RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap();

        let mut ids = Vec::new();
        for name in names {
            ids.push(
                sqlx::query_scalar::<_, BrigadeId>(
                    "INSERT INTO brigades (name, park_id) VALUES ($1, $2) RETURNING id",
                )
                .bind(name)
                .bind(park_id)
                .fetch_one(pool)
                .await
                .unwrap(),
            );
        }
        ids
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    fn generate_dto(brigade_ids: Vec<BrigadeId>, from: u32, to: u32) -> GenerateGuardsDto {
        GenerateGuardsDto {
            brigade_ids,
            start_date: day(from),
            end_date: day(to),
            shift: GuardShift::DiaCompleto,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_generate_cycles_brigades(pool: PgPool) {
        let ids = seed_brigades(&pool, &["A", "B", "C"]).await;

        let response = GuardService::generate_guards(&pool, generate_dto(ids.clone(), 1, 7))
            .await
            .unwrap();
        assert_eq!(response, GenerateGuardsResponse { created: 7, skipped: 0 });

        let range = DateRange::new(day(1), day(7)).unwrap();
        let guards = GuardService::get_guards(&pool, &GuardFilterParams::default(), range)
            .await
            .unwrap();
        let order: Vec<BrigadeId> = guards.iter().map(|g| g.brigade_id).collect();
        assert_eq!(order, vec![ids[0], ids[1], ids[2], ids[0], ids[1], ids[2], ids[0]]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_generate_skips_existing(pool: PgPool) {
        let ids = seed_brigades(&pool, &["A", "B"]).await;

        GuardService::generate_guards(&pool, generate_dto(ids.clone(), 1, 4))
            .await
            .unwrap();
        let response = GuardService::generate_guards(&pool, generate_dto(ids, 3, 6))
            .await
            .unwrap();
        assert_eq!(response.created, 2);
        assert_eq!(response.skipped, 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_generate_rejects_inverted_range(pool: PgPool) {
        let ids = seed_brigades(&pool, &["A"]).await;
        let err = GuardService::generate_guards(&pool, generate_dto(ids, 5, 1))
            .await
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_filter_by_brigade_and_range(pool: PgPool) {
        let ids = seed_brigades(&pool, &["A", "B"]).await;
        GuardService::generate_guards(&pool, generate_dto(ids.clone(), 1, 10))
            .await
            .unwrap();

        let filters = GuardFilterParams {
            brigade_id: Some(ids[1].into_inner()),
            ..Default::default()
        };
        let range = DateRange::new(day(3), day(8)).unwrap();
        let guards = GuardService::get_guards(&pool, &filters, range).await.unwrap();
        let dates: Vec<NaiveDate> = guards.iter().map(|g| g.date).collect();
        assert_eq!(dates, vec![day(4), day(6), day(8)]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_duplicate_guard_conflicts(pool: PgPool) {
        let ids = seed_brigades(&pool, &["A"]).await;
        let dto = CreateGuardDto {
            brigade_id: ids[0],
            date: day(1),
            shift: GuardShift::Noche,
            notes: None,
        };
        GuardService::create_guard(&pool, dto.clone()).await.unwrap();
        let err = GuardService::create_guard(&pool, dto).await.unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::CONFLICT);
    }
}
