//! Guard shifts and the rotation generator.

use crate::dates::DateRange;
use crate::ids::{BrigadeId, GuardId, ParkId};
use brigada_core::serde::{deserialize_optional_date, deserialize_optional_uuid};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    sqlx::Type,
    ToSchema,
)]
#[sqlx(type_name = "guard_shift", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GuardShift {
    Manana,
    Tarde,
    Noche,
    /// 24 hour guard
    #[default]
    DiaCompleto,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Guard {
    pub id: GuardId,
    pub brigade_id: BrigadeId,
    pub date: NaiveDate,
    pub shift: GuardShift,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Guard joined with its brigade and park, as listed on the roster.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct GuardWithBrigade {
    pub id: GuardId,
    pub brigade_id: BrigadeId,
    pub brigade_name: String,
    pub park_id: ParkId,
    pub date: NaiveDate,
    pub shift: GuardShift,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateGuardDto {
    pub brigade_id: BrigadeId,
    pub date: NaiveDate,
    #[serde(default)]
    pub shift: GuardShift,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateGuardDto {
    pub brigade_id: Option<BrigadeId>,
    pub date: Option<NaiveDate>,
    pub shift: Option<GuardShift>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GuardFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub brigade_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub park_id: Option<Uuid>,
    /// Defaults to today
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub from: Option<NaiveDate>,
    /// Defaults to `from` + 30 days
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateRangeParams {
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct GenerateGuardsDto {
    /// Rotation order; day `i` goes to `brigade_ids[i % len]`
    #[validate(length(min = 1, max = 50))]
    pub brigade_ids: Vec<BrigadeId>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub shift: GuardShift,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GenerateGuardsResponse {
    pub created: u64,
    pub skipped: u64,
}

/// One planned guard of a rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedGuard {
    pub date: NaiveDate,
    pub brigade_id: BrigadeId,
}

/// Cycles through `brigades` one day at a time across `range`.
///
/// Empty when `brigades` is empty.
pub fn rotation_plan(brigades: &[BrigadeId], range: DateRange) -> Vec<PlannedGuard> {
    if brigades.is_empty() {
        return Vec::new();
    }
    range
        .iter()
        .enumerate()
        .map(|(day_index, date)| PlannedGuard {
            date,
            brigade_id: brigades[day_index % brigades.len()],
        })
        .collect()
}
