//! Brigades: the crews that take turns on guard at a park.

use crate::ids::{BrigadeId, ParkId};
use crate::users::UserSummary;
use brigada_core::serde::deserialize_optional_uuid;
use brigada_core::{PaginationMeta, PaginationParams};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Brigade {
    pub id: BrigadeId,
    pub name: String,
    pub park_id: ParkId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BrigadeWithPark {
    pub id: BrigadeId,
    pub name: String,
    pub park_id: ParkId,
    pub park_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBrigadeDto {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub park_id: ParkId,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBrigadeDto {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub park_id: Option<ParkId>,
}

#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BrigadeFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub park_id: Option<Uuid>,
    pub name: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedBrigadesResponse {
    pub data: Vec<BrigadeWithPark>,
    pub meta: PaginationMeta,
}

/// Firefighters whose effective brigade on `date` is `brigade_id`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BrigadeRoster {
    pub brigade_id: BrigadeId,
    pub date: NaiveDate,
    pub firefighters: Vec<UserSummary>,
}
