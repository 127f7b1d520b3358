//! Firefighter assignments (transfers) and roster resolution.
//!
//! Assignments are append-only history. Where a firefighter serves on a day
//! is derived from that history by [`brigade_on`].

use crate::ids::{AssignmentId, BrigadeId, UserId};
use brigada_core::serde::{deserialize_optional_date, deserialize_optional_uuid};
use brigada_core::{PaginationMeta, PaginationParams};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "assignment_reason", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssignmentReason {
    #[default]
    Traslado,
    CambioGuardia,
    Requerimiento,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FirefighterAssignment {
    pub id: AssignmentId,
    pub user_id: UserId,
    pub brigade_origin_id: Option<BrigadeId>,
    pub brigade_destination_id: BrigadeId,
    pub start_date: NaiveDate,
    pub reason: AssignmentReason,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAssignmentDto {
    pub user_id: UserId,
    pub brigade_destination_id: BrigadeId,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub reason: AssignmentReason,
}

#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AssignmentFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub user_id: Option<Uuid>,
    /// Matches origin or destination
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub brigade_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub to: Option<NaiveDate>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedAssignmentsResponse {
    pub data: Vec<FirefighterAssignment>,
    pub meta: PaginationMeta,
}

/// A brigade move to be written as an assignment row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedMove {
    pub user_id: UserId,
    pub origin: Option<BrigadeId>,
    pub destination: BrigadeId,
    pub start_date: NaiveDate,
}

/// Effective brigade on `date`: the destination of the assignment with the
/// greatest `(start_date, created_at)` among those starting on or before
/// `date`. The slice may hold any user's history in any order; callers
/// pass one user's rows.
pub fn brigade_on(assignments: &[FirefighterAssignment], date: NaiveDate) -> Option<BrigadeId> {
    assignments
        .iter()
        .filter(|a| a.start_date <= date)
        .max_by_key(|a| (a.start_date, a.created_at))
        .map(|a| a.brigade_destination_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn assignment(dest: u128, start: NaiveDate, created_secs: i64) -> FirefighterAssignment {
        FirefighterAssignment {
            id: AssignmentId::new(),
            user_id: UserId::from_u128(1),
            brigade_origin_id: None,
            brigade_destination_id: BrigadeId::from_u128(dest),
            start_date: start,
            reason: AssignmentReason::Traslado,
            created_by: None,
            created_at: Utc.timestamp_opt(1_700_000_000 + created_secs, 0).unwrap(),
        }
    }

    #[test]
    fn never_assigned() {
        assert_eq!(brigade_on(&[], d(2024, 1, 1)), None);
    }

    #[test]
    fn future_assignments_are_ignored() {
        let history = [assignment(1, d(2024, 5, 1), 0)];
        assert_eq!(brigade_on(&history, d(2024, 4, 30)), None);
        assert_eq!(
            brigade_on(&history, d(2024, 5, 1)),
            Some(BrigadeId::from_u128(1))
        );
    }

    #[test]
    fn latest_start_date_wins() {
        let history = [
            assignment(2, d(2024, 3, 1), 10),
            assignment(1, d(2024, 1, 1), 20),
        ];
        assert_eq!(
            brigade_on(&history, d(2024, 6, 1)),
            Some(BrigadeId::from_u128(2))
        );
        assert_eq!(
            brigade_on(&history, d(2024, 2, 1)),
            Some(BrigadeId::from_u128(1))
        );
    }

    #[test]
    fn same_day_ties_break_on_creation_time() {
        let history = [
            assignment(3, d(2024, 3, 1), 5),
            assignment(4, d(2024, 3, 1), 1),
        ];
        assert_eq!(
            brigade_on(&history, d(2024, 3, 1)),
            Some(BrigadeId::from_u128(3))
        );
    }

    #[test]
    fn temporary_swap_returns_next_day() {
        let history = [
            assignment(1, d(2024, 1, 1), 0),
            assignment(2, d(2024, 4, 10), 1),
            assignment(1, d(2024, 4, 11), 2),
        ];
        assert_eq!(
            brigade_on(&history, d(2024, 4, 10)),
            Some(BrigadeId::from_u128(2))
        );
        assert_eq!(
            brigade_on(&history, d(2024, 4, 11)),
            Some(BrigadeId::from_u128(1))
        );
    }

    #[test]
    fn reason_defaults_to_transfer() {
        let dto: CreateAssignmentDto = serde_json::from_str(
            r#"{"user_id":"00000000-0000-0000-0000-000000000001",
                "brigade_destination_id":"00000000-0000-0000-0000-000000000002",
                "start_date":"2024-01-01"}"#,
        )
        .unwrap();
        assert_eq!(dto.reason, AssignmentReason::Traslado);
    }
}
