//! Fire stations ("parques").

use crate::ids::ParkId;
use brigada_core::{PaginationMeta, PaginationParams};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Park {
    pub id: ParkId,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Park with the size of its crew and fleet.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ParkWithStats {
    pub id: ParkId,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub brigade_count: i64,
    pub vehicle_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateParkDto {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateParkDto {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ParkFilterParams {
    pub name: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedParksResponse {
    pub data: Vec<ParkWithStats>,
    pub meta: PaginationMeta,
}
