//! Peer shift-change swaps ("cambios de guardia").
//!
//! ```text
//! en_tramite ──accept (counterpart)──▶ aceptado_por_empleados ──approve──▶ aceptado
//!     │                                        │
//!     └──reject (counterpart | reviewer)──▶ rechazado ◀──reject (reviewer)
//! ```

use crate::assignments::PlannedMove;
use crate::dates::next_day;
use crate::ids::{BrigadeId, ShiftChangeId, UserId};
use brigada_core::{PaginationMeta, PaginationParams};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "shift_change_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ShiftChangeStatus {
    EnTramite,
    AceptadoPorEmpleados,
    Rechazado,
    Aceptado,
}

impl ShiftChangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnTramite => "en_tramite",
            Self::AceptadoPorEmpleados => "aceptado_por_empleados",
            Self::Rechazado => "rechazado",
            Self::Aceptado => "aceptado",
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::Rechazado | Self::Aceptado)
    }
}

impl fmt::Display for ShiftChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftChangeAction {
    Accept,
    Reject,
    Approve,
}

impl fmt::Display for ShiftChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::Approve => "approve",
        })
    }
}

/// How the caller relates to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub is_requester: bool,
    pub is_counterpart: bool,
    /// Holds `shift_changes:review`
    pub is_reviewer: bool,
}

impl Actor {
    pub fn is_involved(&self) -> bool {
        self.is_requester || self.is_counterpart || self.is_reviewer
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShiftChangeError {
    /// The caller may not perform `action` at all.
    NotAllowed(ShiftChangeAction),
    /// The action is not valid from the current status.
    IllegalTransition {
        from: ShiftChangeStatus,
        action: ShiftChangeAction,
    },
}

impl std::error::Error for ShiftChangeError {}

impl fmt::Display for ShiftChangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAllowed(action) => {
                write!(f, "You are not allowed to {} this shift change", action)
            }
            Self::IllegalTransition { from, action } => {
                write!(f, "Cannot {} a shift change that is {}", action, from)
            }
        }
    }
}

/// Next status for `action` by `actor`, or why it is refused.
///
/// Permission is checked before the status so a stranger always gets
/// [`ShiftChangeError::NotAllowed`].
pub fn transition(
    from: ShiftChangeStatus,
    action: ShiftChangeAction,
    actor: Actor,
) -> Result<ShiftChangeStatus, ShiftChangeError> {
    use ShiftChangeStatus::*;

    let allowed = match action {
        ShiftChangeAction::Accept => actor.is_counterpart,
        ShiftChangeAction::Reject => actor.is_counterpart || actor.is_reviewer,
        ShiftChangeAction::Approve => actor.is_reviewer,
    };
    if !allowed {
        return Err(ShiftChangeError::NotAllowed(action));
    }

    let illegal = ShiftChangeError::IllegalTransition { from, action };
    match (from, action) {
        (EnTramite, ShiftChangeAction::Accept) => Ok(AceptadoPorEmpleados),
        (AceptadoPorEmpleados, ShiftChangeAction::Approve) => Ok(Aceptado),
        (EnTramite, ShiftChangeAction::Reject) => Ok(Rechazado),
        // Once both employees agreed only a reviewer can back out.
        (AceptadoPorEmpleados, ShiftChangeAction::Reject) if actor.is_reviewer => Ok(Rechazado),
        _ => Err(illegal),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ShiftChangeRequest {
    pub id: ShiftChangeId,
    pub requester_id: UserId,
    pub counterpart_id: UserId,
    pub requester_brigade_id: BrigadeId,
    pub counterpart_brigade_id: BrigadeId,
    pub date: NaiveDate,
    /// Return date for mirror swaps
    pub mirror_date: Option<NaiveDate>,
    pub reason: Option<String>,
    pub status: ShiftChangeStatus,
    pub decided_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShiftChangeRequest {
    /// Assignment rows that carry out an approved swap.
    ///
    /// A simple swap exchanges both firefighters on `date`. A mirror swap
    /// has the counterpart cover the requester's brigade on `date` and the
    /// requester cover the counterpart's brigade on `mirror_date`. Everyone
    /// returns to their own brigade the day after.
    pub fn swap_moves(&self) -> Vec<PlannedMove> {
        let cover = |user_id, from: BrigadeId, to: BrigadeId, day: NaiveDate| {
            [
                PlannedMove {
                    user_id,
                    origin: Some(from),
                    destination: to,
                    start_date: day,
                },
                PlannedMove {
                    user_id,
                    origin: Some(to),
                    destination: from,
                    start_date: next_day(day),
                },
            ]
        };

        let requester_day = self.mirror_date.unwrap_or(self.date);
        let mut moves = Vec::with_capacity(4);
        moves.extend(cover(
            self.requester_id,
            self.requester_brigade_id,
            self.counterpart_brigade_id,
            requester_day,
        ));
        moves.extend(cover(
            self.counterpart_id,
            self.counterpart_brigade_id,
            self.requester_brigade_id,
            self.date,
        ));
        moves
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateShiftChangeDto {
    pub counterpart_id: UserId,
    pub date: NaiveDate,
    pub mirror_date: Option<NaiveDate>,
    #[validate(length(max = 1000))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ShiftChangeFilterParams {
    pub status: Option<ShiftChangeStatus>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedShiftChangesResponse {
    pub data: Vec<ShiftChangeRequest>,
    pub meta: PaginationMeta,
}
