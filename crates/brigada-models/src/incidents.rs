//! Incidents reported against parks, vehicles and equipment.

use crate::ids::{IncidentId, ParkId, UserId, VehicleId};
use brigada_core::serde::deserialize_optional_uuid;
use brigada_core::{PaginationMeta, PaginationParams};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "incident_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IncidentKind {
    Vehiculo,
    Personal,
    Instalacion,
    Equipo,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "incident_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Pendiente,
    Resuelta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Incident {
    pub id: IncidentId,
    pub title: String,
    pub description: String,
    pub kind: IncidentKind,
    pub status: IncidentStatus,
    pub park_id: ParkId,
    pub vehicle_id: Option<VehicleId>,
    pub reported_by: Option<UserId>,
    pub resolved_by: Option<UserId>,
    pub resolution: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "vehicle_matches_kind"))]
pub struct CreateIncidentDto {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
    pub kind: IncidentKind,
    pub park_id: ParkId,
    /// Required when `kind` is `vehiculo`
    pub vehicle_id: Option<VehicleId>,
}

fn vehicle_matches_kind(dto: &CreateIncidentDto) -> Result<(), ValidationError> {
    if dto.kind == IncidentKind::Vehiculo && dto.vehicle_id.is_none() {
        let mut err = ValidationError::new("vehicle_required");
        err.message = Some("vehicle_id is required for vehicle incidents".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ResolveIncidentDto {
    #[validate(length(min = 1, max = 5000))]
    pub resolution: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IncidentFilterParams {
    pub status: Option<IncidentStatus>,
    pub kind: Option<IncidentKind>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub park_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedIncidentsResponse {
    pub data: Vec<Incident>,
    pub meta: PaginationMeta,
}
