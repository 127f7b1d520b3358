//! Personnel: users, roles and HR balances.

use crate::ids::{BrigadeId, UserId};
use crate::value_types::{Dni, Email};
use brigada_core::serde::{deserialize_optional_date, deserialize_optional_uuid};
use brigada_core::{PaginationMeta, PaginationParams, permissions};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Staff role. Stored as the `user_role` Postgres enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Chief, administers the whole service
    Jefe,
    /// Officer
    Mando,
    Bombero,
    /// Office staff
    Empleado,
}

impl UserRole {
    pub const ALL: [UserRole; 4] = [Self::Jefe, Self::Mando, Self::Bombero, Self::Empleado];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jefe => "jefe",
            Self::Mando => "mando",
            Self::Bombero => "bombero",
            Self::Empleado => "empleado",
        }
    }

    /// Permission strings embedded in access tokens for this role.
    pub fn permissions(&self, mando_especial: bool) -> Vec<String> {
        permissions::for_role(self.as_str(), mando_especial)
    }

    /// Roles that staff guards and can be recalled on requirements.
    pub fn is_operational(&self) -> bool {
        matches!(self, Self::Bombero | Self::Mando)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("Unknown role '{}'", s))
    }
}

/// Columns selected into [`User`]; never includes the password hash.
pub const USER_COLUMNS: &str = "id, first_name, last_name, dni, email, phone, position, role, \
     mando_especial, vacation_days, personal_days, compensation_hours, offered_hours, \
     offered_at, created_at, updated_at";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub dni: Dni,
    pub email: Email,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub role: UserRole,
    pub mando_especial: bool,
    /// Remaining vacation days this year
    pub vacation_days: i32,
    /// Remaining "asuntos propios" days
    pub personal_days: i32,
    pub compensation_hours: i32,
    /// Hours offered for requirements
    pub offered_hours: i32,
    pub offered_at: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn permissions(&self) -> Vec<String> {
        self.role.permissions(self.mando_especial)
    }
}

/// Row used for login, carries the password hash.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: UserId,
    pub email: Email,
    pub password: String,
    pub role: UserRole,
    pub mando_especial: bool,
}

/// Compact user row for rosters and candidate lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserSummary {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub dni: Dni,
    pub role: UserRole,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUserDto {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 150))]
    pub last_name: String,
    pub dni: Dni,
    pub email: Email,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(length(max = 100))]
    pub position: Option<String>,
    pub role: UserRole,
    #[serde(default)]
    pub mando_especial: bool,
    #[validate(range(min = 0, max = 365))]
    pub vacation_days: Option<i32>,
    #[validate(range(min = 0, max = 365))]
    pub personal_days: Option<i32>,
    #[validate(range(min = 0))]
    pub compensation_hours: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserDto {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 150))]
    pub last_name: Option<String>,
    pub email: Option<Email>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(length(max = 100))]
    pub position: Option<String>,
    pub role: Option<UserRole>,
    pub mando_especial: Option<bool>,
}

/// Absolute values for the HR balances; omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBalancesDto {
    #[validate(range(min = 0, max = 365))]
    pub vacation_days: Option<i32>,
    #[validate(range(min = 0, max = 365))]
    pub personal_days: Option<i32>,
    #[validate(range(min = 0))]
    pub compensation_hours: Option<i32>,
}

impl UpdateBalancesDto {
    pub fn is_empty(&self) -> bool {
        self.vacation_days.is_none()
            && self.personal_days.is_none()
            && self.compensation_hours.is_none()
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct OfferHoursDto {
    /// Zero withdraws the offer
    #[validate(range(min = 0, max = 200))]
    pub hours: i32,
}

#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserFilterParams {
    /// Matches first or last name
    pub name: Option<String>,
    pub dni: Option<String>,
    pub role: Option<UserRole>,
    /// Current brigade (today)
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub brigade_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedUsersResponse {
    pub data: Vec<User>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OnDateParams {
    /// Defaults to today
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserBrigadeResponse {
    pub user_id: UserId,
    pub date: NaiveDate,
    pub brigade_id: BrigadeId,
    pub brigade_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in UserRole::ALL {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
        assert!("capitan".parse::<UserRole>().is_err());
    }

    #[test]
    fn role_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&UserRole::Bombero).unwrap(),
            "\"bombero\""
        );
    }

    #[test]
    fn operational_roles() {
        assert!(UserRole::Bombero.is_operational());
        assert!(UserRole::Mando.is_operational());
        assert!(!UserRole::Empleado.is_operational());
        assert!(!UserRole::Jefe.is_operational());
    }

    #[test]
    fn mando_especial_grants_review() {
        let plain = UserRole::Bombero.permissions(false);
        let special = UserRole::Bombero.permissions(true);
        assert!(!plain.iter().any(|p| p == permissions::REQUESTS_REVIEW));
        assert!(special.iter().any(|p| p == permissions::REQUESTS_REVIEW));
    }

    #[test]
    fn create_dto_rejects_bad_dni() {
        let json = r#"{"first_name":"Ana","last_name":"Ruiz","dni":"12345678A",
            "email":"ana@parque.es","password":"12345678","role":"bombero"}"#;
        assert!(serde_json::from_str::<CreateUserDto>(json).is_err());
    }

    #[test]
    fn create_dto_validates_password_length() {
        let json = r#"{"first_name":"Ana","last_name":"Ruiz","dni":"12345678Z",
            "email":"ana@parque.es","password":"short","role":"bombero"}"#;
        let dto: CreateUserDto = serde_json::from_str(json).unwrap();
        assert!(!dto.mando_especial);
        assert!(dto.validate().is_err());
    }

    #[test]
    fn empty_balances_update() {
        assert!(UpdateBalancesDto::default().is_empty());
        let dto = UpdateBalancesDto {
            personal_days: Some(2),
            ..Default::default()
        };
        assert!(!dto.is_empty());
        assert!(
            UpdateBalancesDto {
                vacation_days: Some(-1),
                ..Default::default()
            }
            .validate()
            .is_err()
        );
    }
}
