use anyhow::Context;
use brigada_core::{AppError, PaginationMeta};
use brigada_models::ParkId;
use brigada_models::brigades::Brigade;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, instrument};

use super::model::{
    CreateParkDto, PaginatedParksResponse, Park, ParkFilterParams, ParkWithStats, UpdateParkDto,
};

const PARK_COLUMNS: &str = "id, name, address, phone, created_at, updated_at";
const DUPLICATE_PARK: &str = "A park with this name already exists";

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &ParkFilterParams) {
    qb.push(" WHERE 1=1");
    if let Some(name) = filters.name.as_deref().filter(|n| !n.trim().is_empty()) {
        qb.push(" AND p.name ILIKE ")
            .push_bind(format!("%{}%", name.trim()));
    }
}

pub struct ParkService;

impl ParkService {
    #[instrument(skip(db), fields(db.operation = "INSERT", db.table = "parks"))]
    pub async fn create_park(db: &PgPool, dto: CreateParkDto) -> Result<Park, AppError> {
        let park = sqlx::query_as::<_, Park>(&format!(
            "INSERT INTO parks (name, address, phone) VALUES ($1, $2, $3) RETURNING {}",
            PARK_COLUMNS
        ))
        .bind(dto.name.trim())
        .bind(&dto.address)
        .bind(&dto.phone)
        .fetch_one(db)
        .await
        .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_PARK))?;

        tracing::info!(park.id = %park.id, park.name = %park.name, "park created");
        Ok(park)
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "parks"))]
    pub async fn get_parks(
        db: &PgPool,
        filters: ParkFilterParams,
    ) -> Result<PaginatedParksResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM parks p");
        push_filters(&mut count, &filters);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(db)
            .await
            .context("Failed to count parks")
            .map_err(AppError::database)?;

        let mut data = QueryBuilder::<Postgres>::new(
            "SELECT p.id, p.name, p.address, p.phone, \
             (SELECT COUNT(*) FROM brigades b WHERE b.park_id = p.id) AS brigade_count, \
             (SELECT COUNT(*) FROM vehicles v WHERE v.park_id = p.id) AS vehicle_count, \
             p.created_at, p.updated_at FROM parks p",
        );
        push_filters(&mut data, &filters);
        data.push(" ORDER BY p.name LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let parks = data
            .build_query_as::<ParkWithStats>()
            .fetch_all(db)
            .await
            .context("Failed to fetch parks")
            .map_err(AppError::database)?;

        debug!(total, returned = parks.len(), "parks fetched");

        Ok(PaginatedParksResponse {
            data: parks,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_park(db: &PgPool, id: ParkId) -> Result<Park, AppError> {
        sqlx::query_as::<_, Park>(&format!("SELECT {} FROM parks WHERE id = $1", PARK_COLUMNS))
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch park")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Park not found")))
    }

    #[instrument(skip(db))]
    pub async fn update_park(db: &PgPool, id: ParkId, dto: UpdateParkDto) -> Result<Park, AppError> {
        sqlx::query_as::<_, Park>(&format!(
            "UPDATE parks SET name = COALESCE($1, name), address = COALESCE($2, address), \
             phone = COALESCE($3, phone), updated_at = NOW() WHERE id = $4 RETURNING {}",
            PARK_COLUMNS
        ))
        .bind(dto.name.as_deref().map(str::trim))
        .bind(&dto.address)
        .bind(&dto.phone)
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_PARK))?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Park not found")))
    }

    /// Parks still holding brigades or vehicles cannot be removed.
    #[instrument(skip(db))]
    pub async fn delete_park(db: &PgPool, id: ParkId) -> Result<(), AppError> {
        let (brigades, vehicles) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT (SELECT COUNT(*) FROM brigades WHERE park_id = $1), \
                    (SELECT COUNT(*) FROM vehicles WHERE park_id = $1)",
        )
        .bind(id)
        .fetch_one(db)
        .await
        .context("Failed to count park dependencies")
        .map_err(AppError::database)?;

        if brigades > 0 || vehicles > 0 {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Park still has {} brigade(s) and {} vehicle(s)",
                brigades,
                vehicles
            )));
        }

        let result = sqlx::query("DELETE FROM parks WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete park")
            .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Park not found")));
        }

        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn get_park_brigades(db: &PgPool, id: ParkId) -> Result<Vec<Brigade>, AppError> {
        Self::get_park(db, id).await?;

        let brigades = sqlx::query_as::<_, Brigade>(
            "SELECT id, name, park_id, created_at, updated_at FROM brigades \
             WHERE park_id = $1 ORDER BY name",
        )
        .bind(id)
        .fetch_all(db)
        .await
        .context("Failed to fetch park brigades")
        .map_err(AppError::database)?;

        Ok(brigades)
    }
}
