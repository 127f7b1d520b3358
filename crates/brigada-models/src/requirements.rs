//! Requirements: recalling an off-duty firefighter to cover a guard.

use crate::ids::{BrigadeId, RequirementId, UserId};
use crate::users::UserRole;
use crate::value_types::Dni;
use brigada_core::serde::{deserialize_optional_date, deserialize_optional_uuid};
use brigada_core::{PaginationMeta, PaginationParams};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::cmp::Ordering;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Requirement {
    pub id: RequirementId,
    pub user_id: UserId,
    pub brigade_id: BrigadeId,
    pub date: NaiveDate,
    pub hours: i32,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateRequirementDto {
    pub user_id: UserId,
    /// Brigade on guard that needs the extra firefighter
    pub brigade_id: BrigadeId,
    pub date: NaiveDate,
    #[validate(range(min = 1, max = 24))]
    pub hours: i32,
}

#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AvailableParams {
    pub date: NaiveDate,
    /// Only firefighters whose brigade belongs to this park
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub park_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RequirementFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub to: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub user_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedRequirementsResponse {
    pub data: Vec<Requirement>,
    pub meta: PaginationMeta,
}

/// A firefighter considered for a requirement on some date, with the
/// facts that decide availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RequirementCandidate {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub dni: Dni,
    pub role: UserRole,
    pub offered_hours: i32,
    pub offered_at: Option<NaiveDate>,
    pub brigade_id: Option<BrigadeId>,
    #[serde(skip)]
    pub on_duty: bool,
    #[serde(skip)]
    pub on_leave: bool,
    #[serde(skip)]
    pub already_required: bool,
}

impl RequirementCandidate {
    pub fn is_available(&self) -> bool {
        self.role.is_operational()
            && self.offered_hours > 0
            && !self.on_duty
            && !self.on_leave
            && !self.already_required
    }
}

/// Offered hours descending, then earliest offer (no date last), then DNI.
pub fn candidate_order(a: &RequirementCandidate, b: &RequirementCandidate) -> Ordering {
    b.offered_hours
        .cmp(&a.offered_hours)
        .then_with(|| match (a.offered_at, b.offered_at) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.dni.cmp(&b.dni))
}

/// Drops unavailable candidates and sorts the rest by [`candidate_order`].
pub fn rank_candidates(candidates: Vec<RequirementCandidate>) -> Vec<RequirementCandidate> {
    let mut available: Vec<_> = candidates.into_iter().filter(|c| c.is_available()).collect();
    available.sort_by(candidate_order);
    available
}
