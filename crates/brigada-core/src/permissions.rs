//! Permission name constants and the role → permission table.
//!
//! Permissions are embedded in access tokens at login, so handlers check
//! them without touching the database.
//!
//! ```ignore
//! use brigada_core::permissions;
//!
//! if auth_user.has_permission(permissions::REQUESTS_REVIEW) {
//!     // show every pending leave request
//! }
//! ```

// =============================================================================
// Users
// =============================================================================

pub const USERS_CREATE: &str = "users:create";
pub const USERS_READ: &str = "users:read";
pub const USERS_UPDATE: &str = "users:update";
pub const USERS_DELETE: &str = "users:delete";
/// Adjust vacation, personal-day and compensation balances
pub const USERS_BALANCES: &str = "users:balances";

// =============================================================================
// Parks, brigades and guards
// =============================================================================

pub const PARKS_READ: &str = "parks:read";
pub const PARKS_MANAGE: &str = "parks:manage";
pub const BRIGADES_READ: &str = "brigades:read";
pub const BRIGADES_MANAGE: &str = "brigades:manage";
pub const GUARDS_READ: &str = "guards:read";
pub const GUARDS_MANAGE: &str = "guards:manage";
pub const ASSIGNMENTS_READ: &str = "assignments:read";
pub const ASSIGNMENTS_MANAGE: &str = "assignments:manage";
pub const REQUIREMENTS_MANAGE: &str = "requirements:manage";

// =============================================================================
// Requests and shift changes
// =============================================================================

pub const REQUESTS_CREATE: &str = "requests:create";
pub const REQUESTS_REVIEW: &str = "requests:review";
pub const REQUESTS_READ_ALL: &str = "requests:read_all";
pub const SHIFT_CHANGES_CREATE: &str = "shift_changes:create";
pub const SHIFT_CHANGES_REVIEW: &str = "shift_changes:review";

// =============================================================================
// Fleet, incidents and messaging
// =============================================================================

pub const VEHICLES_READ: &str = "vehicles:read";
pub const VEHICLES_MANAGE: &str = "vehicles:manage";
pub const INCIDENTS_READ: &str = "incidents:read";
pub const INCIDENTS_CREATE: &str = "incidents:create";
pub const INCIDENTS_RESOLVE: &str = "incidents:resolve";
pub const MESSAGES_SEND: &str = "messages:send";

/// Granted to every authenticated role.
pub const BASE: &[&str] = &[
    PARKS_READ,
    BRIGADES_READ,
    GUARDS_READ,
    VEHICLES_READ,
    INCIDENTS_READ,
    INCIDENTS_CREATE,
    REQUESTS_CREATE,
    SHIFT_CHANGES_CREATE,
    MESSAGES_SEND,
];

/// Command staff: scheduling and review, no personnel administration.
pub const MANDO: &[&str] = &[
    USERS_READ,
    GUARDS_MANAGE,
    ASSIGNMENTS_READ,
    ASSIGNMENTS_MANAGE,
    REQUIREMENTS_MANAGE,
    REQUESTS_REVIEW,
    REQUESTS_READ_ALL,
    SHIFT_CHANGES_REVIEW,
    VEHICLES_MANAGE,
    INCIDENTS_RESOLVE,
];

/// Chief only, on top of [`MANDO`].
pub const JEFE: &[&str] = &[
    USERS_CREATE,
    USERS_UPDATE,
    USERS_DELETE,
    USERS_BALANCES,
    PARKS_MANAGE,
    BRIGADES_MANAGE,
];

/// Resolves the permission set for a role slug.
///
/// `mando_especial` adds the command permissions regardless of role.
/// Unknown roles only get [`BASE`].
pub fn for_role(role: &str, mando_especial: bool) -> Vec<String> {
    let mut granted: Vec<&str> = BASE.to_vec();

    match role {
        "jefe" => {
            granted.extend_from_slice(MANDO);
            granted.extend_from_slice(JEFE);
        }
        "mando" => granted.extend_from_slice(MANDO),
        _ => {}
    }

    if mando_especial {
        granted.extend_from_slice(MANDO);
    }

    granted.sort_unstable();
    granted.dedup();
    granted.into_iter().map(str::to_string).collect()
}
