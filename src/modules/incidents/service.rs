use anyhow::Context;
use brigada_core::{AppError, PaginationMeta};
use brigada_models::{IncidentId, ParkId, UserId};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use super::model::{
    CreateIncidentDto, Incident, IncidentFilterParams, IncidentStatus, PaginatedIncidentsResponse,
    ResolveIncidentDto,
};

const INCIDENT_COLUMNS: &str = "id, title, description, kind, status, park_id, vehicle_id, \
     reported_by, resolved_by, resolution, resolved_at, created_at, updated_at";

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &IncidentFilterParams) {
    qb.push(" WHERE 1=1");
    if let Some(status) = filters.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(kind) = filters.kind {
        qb.push(" AND kind = ").push_bind(kind);
    }
    if let Some(park_id) = filters.park_id {
        qb.push(" AND park_id = ").push_bind(park_id);
    }
}

pub struct IncidentService;

impl IncidentService {
    #[instrument(skip(db, dto), fields(kind = ?dto.kind, park.id = %dto.park_id))]
    pub async fn create_incident(
        db: &PgPool,
        dto: CreateIncidentDto,
        reported_by: UserId,
    ) -> Result<Incident, AppError> {
        let park_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM parks WHERE id = $1)")
                .bind(dto.park_id)
                .fetch_one(db)
                .await?;
        if !park_exists {
            return Err(AppError::not_found(anyhow::anyhow!("Park not found")));
        }

        if let Some(vehicle_id) = dto.vehicle_id {
            let vehicle_park =
                sqlx::query_scalar::<_, ParkId>("SELECT park_id FROM vehicles WHERE id = $1")
                    .bind(vehicle_id)
                    .fetch_optional(db)
                    .await
                    .context("Failed to fetch vehicle")
                    .map_err(AppError::database)?
                    .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Vehicle not found")))?;

            if vehicle_park != dto.park_id {
                return Err(AppError::unprocessable(anyhow::anyhow!(
                    "The vehicle is based at another park"
                )));
            }
        }

        let incident = sqlx::query_as::<_, Incident>(&format!(
            "INSERT INTO incidents (title, description, kind, park_id, vehicle_id, reported_by) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            INCIDENT_COLUMNS
        ))
        .bind(dto.title.trim())
        .bind(&dto.description)
        .bind(dto.kind)
        .bind(dto.park_id)
        .bind(dto.vehicle_id)
        .bind(reported_by)
        .fetch_one(db)
        .await
        .context("Failed to create incident")
        .map_err(AppError::database)?;

        tracing::info!(incident.id = %incident.id, "incident reported");
        Ok(incident)
    }

    #[instrument(skip(db))]
    pub async fn get_incidents(
        db: &PgPool,
        filters: IncidentFilterParams,
    ) -> Result<PaginatedIncidentsResponse, AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM incidents");
        push_filters(&mut count, &filters);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(db)
            .await
            .context("Failed to count incidents")
            .map_err(AppError::database)?;

        let mut data =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM incidents", INCIDENT_COLUMNS));
        push_filters(&mut data, &filters);
        // Open incidents first, newest first within each status
        data.push(" ORDER BY status, created_at DESC LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let incidents = data
            .build_query_as::<Incident>()
            .fetch_all(db)
            .await
            .context("Failed to fetch incidents")
            .map_err(AppError::database)?;

        Ok(PaginatedIncidentsResponse {
            data: incidents,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_incident(db: &PgPool, id: IncidentId) -> Result<Incident, AppError> {
        sqlx::query_as::<_, Incident>(&format!(
            "SELECT {} FROM incidents WHERE id = $1",
            INCIDENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch incident")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Incident not found")))
    }

    #[instrument(skip(db, dto))]
    pub async fn resolve_incident(
        db: &PgPool,
        id: IncidentId,
        dto: ResolveIncidentDto,
        resolved_by: UserId,
    ) -> Result<Incident, AppError> {
        let resolved = sqlx::query_as::<_, Incident>(&format!(
            "UPDATE incidents SET status = $1, resolution = $2, resolved_by = $3, \
             resolved_at = NOW(), updated_at = NOW() \
             WHERE id = $4 AND status = $5 RETURNING {}",
            INCIDENT_COLUMNS
        ))
        .bind(IncidentStatus::Resuelta)
        .bind(dto.resolution.trim())
        .bind(resolved_by)
        .bind(id)
        .bind(IncidentStatus::Pendiente)
        .fetch_optional(db)
        .await
        .context("Failed to resolve incident")
        .map_err(AppError::database)?;

        match resolved {
            Some(incident) => {
                tracing::info!(incident.id = %id, "incident resolved");
                Ok(incident)
            }
            // Distinguish a missing incident from one already closed.
            None => {
                Self::get_incident(db, id).await?;
                Err(AppError::conflict(anyhow::anyhow!(
                    "Incident is already resolved"
                )))
            }
        }
    }

    #[instrument(skip(db))]
    pub async fn delete_incident(db: &PgPool, id: IncidentId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM incidents WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete incident")
            .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Incident not found")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::incidents::model::IncidentKind;
    use brigada_core::PaginationParams;
    use brigada_models::VehicleId;

    async fn seed(pool: &PgPool) -> (ParkId, VehicleId, UserId) {
        let park = sqlx::query_scalar::<_, ParkId>(
            "INSERT INTO parks (name) VALUES ('Parque Este') RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap();
        let vehicle = sqlx::query_scalar::<_, VehicleId>(
            "INSERT INTO vehicles (plate, name, kind, park_id) \
             VALUES ('9999-ZZZ', 'BUL 2', 'autobomba', $1) RETURNING id",
        )
        .bind(park)
        .fetch_one(pool)
        .await
        .unwrap();
        let user = sqlx::query_scalar::<_, UserId>(
            "INSERT INTO users (first_name, last_name, dni, email, password) \
             VALUES ('Rosa', 'Diaz', '00000001R', 'rosa@parque.es', 'x') RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap();
        (park, vehicle, user)
    }

    fn dto(park_id: ParkId, vehicle_id: Option<VehicleId>) -> CreateIncidentDto {
        CreateIncidentDto {
            title: "Rueda pinchada".to_string(),
            description: "Rueda trasera izquierda".to_string(),
            kind: IncidentKind::Vehiculo,
            park_id,
            vehicle_id,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_resolve_once(pool: PgPool) {
        let (park, vehicle, user) = seed(&pool).await;
        let incident = IncidentService::create_incident(&pool, dto(park, Some(vehicle)), user)
            .await
            .unwrap();
        assert_eq!(incident.status, IncidentStatus::Pendiente);
        assert_eq!(incident.reported_by, Some(user));

        let resolution = ResolveIncidentDto {
            resolution: "Cambiada".to_string(),
        };
        let resolved = IncidentService::resolve_incident(&pool, incident.id, resolution.clone(), user)
            .await
            .unwrap();
        assert_eq!(resolved.status, IncidentStatus::Resuelta);
        assert_eq!(resolved.resolved_by, Some(user));
        assert!(resolved.resolved_at.is_some());

        let err = IncidentService::resolve_incident(&pool, incident.id, resolution, user)
            .await
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::CONFLICT);

        let open = IncidentFilterParams {
            status: Some(IncidentStatus::Pendiente),
            kind: None,
            park_id: None,
            pagination: PaginationParams::default(),
        };
        let response = IncidentService::get_incidents(&pool, open).await.unwrap();
        assert_eq!(response.meta.total, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_unknown_vehicle_is_not_found(pool: PgPool) {
        let (park, _, user) = seed(&pool).await;
        let err = IncidentService::create_incident(&pool, dto(park, Some(VehicleId::new())), user)
            .await
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_resolve_missing_is_not_found(pool: PgPool) {
        let (_, _, user) = seed(&pool).await;
        let resolution = ResolveIncidentDto {
            resolution: "n/a".to_string(),
        };
        let err = IncidentService::resolve_incident(&pool, IncidentId::new(), resolution, user)
            .await
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::NOT_FOUND);
    }
}
