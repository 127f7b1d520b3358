//! # Brigada Models
//!
//! Entities, DTOs and the pure scheduling rules of the Brigada API.
//!
//! Database-free logic lives here so it can be unit tested directly:
//!
//! - [`assignments::brigade_on`]: which brigade a firefighter serves on a day
//! - [`guards::rotation_plan`]: cycling brigades across a date range
//! - [`requests`]: leave shape checks, balance costs, status transitions
//! - [`shift_changes::transition`]: the swap approval state machine
//! - [`requirements::rank_candidates`]: recall list ordering
//!
//! ```ignore
//! use brigada_models::assignments::brigade_on;
//!
//! let brigade = brigade_on(&history, today);
//! ```

pub mod assignments;
pub mod auth;
pub mod brigades;
pub mod dates;
pub mod guards;
pub mod ids;
pub mod incidents;
pub mod messages;
pub mod parks;
pub mod requests;
pub mod requirements;
pub mod shift_changes;
pub mod users;
pub mod value_types;
pub mod vehicles;

pub use dates::{DateRange, DateRangeError};
pub use ids::{
    AssignmentId, BrigadeId, GuardId, IncidentId, LeaveRequestId, MessageId, ParkId,
    RequirementId, ShiftChangeId, UserId, VehicleId,
};
pub use users::{User, UserRole};
pub use value_types::{Dni, Email, ValueTypeError};
