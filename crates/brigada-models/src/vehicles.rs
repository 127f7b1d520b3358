//! Fleet vehicles, each based at a park.

use crate::ids::{ParkId, VehicleId};
use brigada_core::serde::{deserialize_optional_bool, deserialize_optional_uuid};
use brigada_core::{PaginationMeta, PaginationParams};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Vehicle {
    pub id: VehicleId,
    #[schema(example = "1234-BCD")]
    pub plate: String,
    pub name: String,
    /// Free-form type, e.g. "autobomba" or "escala"
    pub kind: String,
    pub park_id: ParkId,
    pub in_service: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_in_service() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateVehicleDto {
    #[validate(length(min = 1, max = 15))]
    pub plate: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 50))]
    pub kind: String,
    pub park_id: ParkId,
    #[serde(default = "default_in_service")]
    pub in_service: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateVehicleDto {
    #[validate(length(min = 1, max = 15))]
    pub plate: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub kind: Option<String>,
    pub park_id: Option<ParkId>,
    pub in_service: Option<bool>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VehicleFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub park_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub in_service: Option<bool>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedVehiclesResponse {
    pub data: Vec<Vehicle>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_vehicles_default_to_in_service() {
        let dto: CreateVehicleDto = serde_json::from_str(
            r#"{"plate":"1234-BCD","name":"BUL 1","kind":"autobomba",
                "park_id":"00000000-0000-0000-0000-000000000001"}"#,
        )
        .unwrap();
        assert!(dto.in_service);
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn plate_length() {
        let dto = UpdateVehicleDto {
            plate: Some("X".repeat(16)),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }
}
