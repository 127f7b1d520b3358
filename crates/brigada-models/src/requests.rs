//! Leave and permission requests, and the balances they draw from.

use crate::dates::inclusive_days;
use crate::ids::{LeaveRequestId, UserId};
use crate::users::User;
use brigada_core::serde::{deserialize_optional_date, deserialize_optional_uuid};
use brigada_core::{PaginationMeta, PaginationParams};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "leave_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeaveKind {
    Vacaciones,
    /// Personal days
    AsuntosPropios,
    /// Time off paid with accumulated overtime hours
    CompensacionHoras,
    /// Leaving the guard for a few hours
    SalidaPersonal,
    Licencia,
    /// Sick leave
    Baja,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "leave_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    Pendiente,
    Confirmada,
    Cancelada,
    Denegada,
}

/// A user balance a leave kind draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Balance {
    VacationDays,
    PersonalDays,
    CompensationHours,
}

impl Balance {
    /// Column on `users` holding this balance.
    pub fn column(&self) -> &'static str {
        match self {
            Self::VacationDays => "vacation_days",
            Self::PersonalDays => "personal_days",
            Self::CompensationHours => "compensation_hours",
        }
    }

    pub fn available(&self, user: &User) -> i32 {
        match self {
            Self::VacationDays => user.vacation_days,
            Self::PersonalDays => user.personal_days,
            Self::CompensationHours => user.compensation_hours,
        }
    }
}

impl LeaveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vacaciones => "vacaciones",
            Self::AsuntosPropios => "asuntos_propios",
            Self::CompensacionHoras => "compensacion_horas",
            Self::SalidaPersonal => "salida_personal",
            Self::Licencia => "licencia",
            Self::Baja => "baja",
        }
    }

    /// Hour-based kinds cover part of a single day.
    pub fn is_hourly(&self) -> bool {
        matches!(self, Self::CompensacionHoras | Self::SalidaPersonal)
    }

    pub fn balance(&self) -> Option<Balance> {
        match self {
            Self::Vacaciones => Some(Balance::VacationDays),
            Self::AsuntosPropios => Some(Balance::PersonalDays),
            Self::CompensacionHoras => Some(Balance::CompensationHours),
            Self::SalidaPersonal | Self::Licencia | Self::Baja => None,
        }
    }
}

impl LeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pendiente => "pendiente",
            Self::Confirmada => "confirmada",
            Self::Cancelada => "cancelada",
            Self::Denegada => "denegada",
        }
    }

    /// Pending and confirmed requests block overlapping ones and count as
    /// absence.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pendiente | Self::Confirmada)
    }

    pub fn apply(self, action: LeaveAction) -> Result<LeaveStatus, LeaveRuleError> {
        match (self, action) {
            (Self::Pendiente, LeaveAction::Confirm) => Ok(Self::Confirmada),
            (Self::Pendiente, LeaveAction::Deny) => Ok(Self::Denegada),
            (Self::Pendiente | Self::Confirmada, LeaveAction::Cancel) => Ok(Self::Cancelada),
            (from, action) => Err(LeaveRuleError::IllegalTransition { from, action }),
        }
    }
}

impl fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveAction {
    Confirm,
    Deny,
    Cancel,
}

impl fmt::Display for LeaveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Confirm => "confirm",
            Self::Deny => "deny",
            Self::Cancel => "cancel",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveRuleError {
    EndBeforeStart,
    HoursRequired(LeaveKind),
    SingleDayOnly(LeaveKind),
    InsufficientBalance {
        balance: Balance,
        requested: i32,
        available: i32,
    },
    IllegalTransition {
        from: LeaveStatus,
        action: LeaveAction,
    },
}

impl std::error::Error for LeaveRuleError {}

impl fmt::Display for LeaveRuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndBeforeStart => f.write_str("end_date must not be before start_date"),
            Self::HoursRequired(kind) => {
                write!(f, "'{}' requests need a positive number of hours", kind.as_str())
            }
            Self::SingleDayOnly(kind) => {
                write!(f, "'{}' requests must start and end on the same day", kind.as_str())
            }
            Self::InsufficientBalance {
                balance,
                requested,
                available,
            } => write!(
                f,
                "Insufficient {}: requested {}, available {}",
                balance.column(),
                requested,
                available
            ),
            Self::IllegalTransition { from, action } => {
                write!(f, "Cannot {} a request that is {}", action, from)
            }
        }
    }
}

/// Checks dates and hours for a new request of `kind`.
pub fn check_shape(
    kind: LeaveKind,
    start: NaiveDate,
    end: NaiveDate,
    hours: Option<i32>,
) -> Result<(), LeaveRuleError> {
    if end < start {
        return Err(LeaveRuleError::EndBeforeStart);
    }
    if kind.is_hourly() {
        if hours.is_none_or(|h| h <= 0) {
            return Err(LeaveRuleError::HoursRequired(kind));
        }
        if start != end {
            return Err(LeaveRuleError::SingleDayOnly(kind));
        }
    }
    Ok(())
}

/// Units a request takes from its balance: inclusive days, or hours for
/// compensation. `None` when the kind draws from no balance.
pub fn balance_cost(
    kind: LeaveKind,
    start: NaiveDate,
    end: NaiveDate,
    hours: Option<i32>,
) -> Option<(Balance, i32)> {
    let balance = kind.balance()?;
    let amount = match balance {
        Balance::CompensationHours => hours.unwrap_or(0),
        Balance::VacationDays | Balance::PersonalDays => {
            i32::try_from(inclusive_days(start, end)).unwrap_or(i32::MAX)
        }
    };
    Some((balance, amount))
}

/// Fails with [`LeaveRuleError::InsufficientBalance`] when `user` cannot
/// afford the request.
pub fn check_balance(
    user: &User,
    kind: LeaveKind,
    start: NaiveDate,
    end: NaiveDate,
    hours: Option<i32>,
) -> Result<(), LeaveRuleError> {
    if let Some((balance, requested)) = balance_cost(kind, start, end, hours) {
        let available = balance.available(user);
        if requested > available {
            return Err(LeaveRuleError::InsufficientBalance {
                balance,
                requested,
                available,
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LeaveRequest {
    pub id: LeaveRequestId,
    pub user_id: UserId,
    pub kind: LeaveKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub hours: Option<i32>,
    pub reason: Option<String>,
    pub status: LeaveStatus,
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateLeaveRequestDto {
    pub kind: LeaveKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Required for `compensacion_horas` and `salida_personal`
    #[validate(range(min = 1, max = 24))]
    pub hours: Option<i32>,
    #[validate(length(max = 1000))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaveFilterParams {
    /// Only honoured for reviewers
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub user_id: Option<Uuid>,
    pub status: Option<LeaveStatus>,
    pub kind: Option<LeaveKind>,
    /// Requests ending on or after this date
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub from: Option<NaiveDate>,
    /// Requests starting on or before this date
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub to: Option<NaiveDate>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedLeaveRequestsResponse {
    pub data: Vec<LeaveRequest>,
    pub meta: PaginationMeta,
}
