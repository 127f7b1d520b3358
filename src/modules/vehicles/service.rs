use anyhow::Context;
use brigada_core::{AppError, PaginationMeta};
use brigada_models::{ParkId, VehicleId};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use super::model::{
    CreateVehicleDto, PaginatedVehiclesResponse, UpdateVehicleDto, Vehicle, VehicleFilterParams,
};

const VEHICLE_COLUMNS: &str =
    "id, plate, name, kind, park_id, in_service, notes, created_at, updated_at";
const DUPLICATE_PLATE: &str = "A vehicle with this plate already exists";

/// Plates are stored upper-case without surrounding spaces.
fn normalize_plate(plate: &str) -> String {
    plate.trim().to_uppercase()
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &VehicleFilterParams) {
    qb.push(" WHERE 1=1");
    if let Some(park_id) = filters.park_id {
        qb.push(" AND park_id = ").push_bind(park_id);
    }
    if let Some(in_service) = filters.in_service {
        qb.push(" AND in_service = ").push_bind(in_service);
    }
}

pub struct VehicleService;

impl VehicleService {
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

    #[instrument(skip(db, dto), fields(plate = %dto.plate))]
    pub async fn create_vehicle(db: &PgPool, dto: CreateVehicleDto) -> Result<Vehicle, AppError> {
        Self::ensure_park(db, dto.park_id).await?;

        let vehicle = sqlx::query_as::<_, Vehicle>(&format!(
            "INSERT INTO vehicles (plate, name, kind, park_id, in_service, notes) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            VEHICLE_COLUMNS
        ))
        .bind(normalize_plate(&dto.plate))
        .bind(dto.name.trim())
        .bind(dto.kind.trim())
        .bind(dto.park_id)
        .bind(dto.in_service)
        .bind(&dto.notes)
        .fetch_one(db)
        .await
        .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_PLATE))?;

        tracing::info!(vehicle.id = %vehicle.id, "vehicle created");
        Ok(vehicle)
    }

    #[instrument(skip(db))]
    pub async fn get_vehicles(
        db: &PgPool,
        filters: VehicleFilterParams,
    ) -> Result<PaginatedVehiclesResponse, AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM vehicles");
        push_filters(&mut count, &filters);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(db)
            .await
            .context("Failed to count vehicles")
            .map_err(AppError::database)?;

        let mut data =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM vehicles", VEHICLE_COLUMNS));
        push_filters(&mut data, &filters);
        data.push(" ORDER BY plate LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let vehicles = data
            .build_query_as::<Vehicle>()
            .fetch_all(db)
            .await
            .context("Failed to fetch vehicles")
            .map_err(AppError::database)?;

        Ok(PaginatedVehiclesResponse {
            data: vehicles,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_vehicle(db: &PgPool, id: VehicleId) -> Result<Vehicle, AppError> {
        sqlx::query_as::<_, Vehicle>(&format!(
            "SELECT {} FROM vehicles WHERE id = $1",
            VEHICLE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch vehicle")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Vehicle not found")))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_vehicle(
        db: &PgPool,
        id: VehicleId,
        dto: UpdateVehicleDto,
    ) -> Result<Vehicle, AppError> {
        if let Some(park_id) = dto.park_id {
            Self::ensure_park(db, park_id).await?;
        }

        sqlx::query_as::<_, Vehicle>(&format!(
            "UPDATE vehicles SET \
             plate = COALESCE($1, plate), \
             name = COALESCE($2, name), \
             kind = COALESCE($3, kind), \
             park_id = COALESCE($4, park_id), \
             in_service = COALESCE($5, in_service), \
             notes = COALESCE($6, notes), \
             updated_at = NOW() \
             WHERE id = $7 RETURNING {}",
            VEHICLE_COLUMNS
        ))
        .bind(dto.plate.as_deref().map(normalize_plate))
        .bind(dto.name.as_deref().map(str::trim))
        .bind(dto.kind.as_deref().map(str::trim))
        .bind(dto.park_id)
        .bind(dto.in_service)
        .bind(&dto.notes)
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_PLATE))?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Vehicle not found")))
    }

    #[instrument(skip(db))]
    pub async fn delete_vehicle(db: &PgPool, id: VehicleId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete vehicle")
            .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Vehicle not found")));
        }

        tracing::info!(vehicle.id = %id, "vehicle deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brigada_core::PaginationParams;

    async fn seed_park(pool: &PgPool) -> ParkId {
        sqlx::query_scalar::<_, ParkId>("INSERT INTO parks (name) VALUES ('Parque Oeste') RETURNING id")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    fn create_dto(plate: &str, park_id: ParkId, in_service: bool) -> CreateVehicleDto {
        CreateVehicleDto {
            plate: plate.to_string(),
            name: "BUL 1".to_string(),
            kind: "autobomba".to_string(),
            park_id,
            in_service,
            notes: None,
        }
    }

    #[test]
    fn test_normalize_plate() {
        assert_eq!(normalize_plate(" 1234-bcd "), "1234-BCD");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_duplicate_plate_conflicts(pool: PgPool) {
        let park = seed_park(&pool).await;
        VehicleService::create_vehicle(&pool, create_dto("1234-BCD", park, true))
            .await
            .unwrap();
        let err = VehicleService::create_vehicle(&pool, create_dto("1234-bcd", park, true))
            .await
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::CONFLICT);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_filter_and_update(pool: PgPool) {
        let park = seed_park(&pool).await;
        let bul = VehicleService::create_vehicle(&pool, create_dto("1111-AAA", park, true))
            .await
            .unwrap();
        VehicleService::create_vehicle(&pool, create_dto("2222-BBB", park, false))
            .await
            .unwrap();

        let filters = VehicleFilterParams {
            park_id: Some(park.into_inner()),
            in_service: Some(true),
            pagination: PaginationParams::default(),
        };
        let response = VehicleService::get_vehicles(&pool, filters).await.unwrap();
        assert_eq!(response.meta.total, 1);
        assert_eq!(response.data[0].plate, "1111-AAA");

        let dto = UpdateVehicleDto {
            in_service: Some(false),
            notes: Some("En taller".to_string()),
            ..Default::default()
        };
        let updated = VehicleService::update_vehicle(&pool, bul.id, dto).await.unwrap();
        assert!(!updated.in_service);
        assert_eq!(updated.plate, "1111-AAA");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_unknown_park_is_not_found(pool: PgPool) {
        let err = VehicleService::create_vehicle(&pool, create_dto("1234-BCD", ParkId::new(), true))
            .await
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::NOT_FOUND);
    }
}
