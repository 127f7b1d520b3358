use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use brigada_core::{PaginationMeta, PaginationParams};
use brigada_models::assignments::{
    AssignmentReason, CreateAssignmentDto, FirefighterAssignment, PaginatedAssignmentsResponse,
};
use brigada_models::auth::{ChangePasswordDto, LoginRequest, LoginResponse, RefreshTokenRequest};
use brigada_models::brigades::{
    Brigade, BrigadeRoster, BrigadeWithPark, CreateBrigadeDto, PaginatedBrigadesResponse,
    UpdateBrigadeDto,
};
use brigada_models::guards::{
    CreateGuardDto, GenerateGuardsDto, GenerateGuardsResponse, Guard, GuardShift,
    GuardWithBrigade, UpdateGuardDto,
};
use brigada_models::incidents::{
    CreateIncidentDto, Incident, IncidentKind, IncidentStatus, PaginatedIncidentsResponse,
    ResolveIncidentDto,
};
use brigada_models::messages::{
    Message, MessageView, PaginatedMessagesResponse, SendMessageDto, UnreadCountResponse,
};
use brigada_models::parks::{
    CreateParkDto, PaginatedParksResponse, Park, ParkWithStats, UpdateParkDto,
};
use brigada_models::requests::{
    CreateLeaveRequestDto, LeaveKind, LeaveRequest, LeaveStatus, PaginatedLeaveRequestsResponse,
};
use brigada_models::requirements::{
    CreateRequirementDto, PaginatedRequirementsResponse, Requirement, RequirementCandidate,
};
use brigada_models::shift_changes::{
    CreateShiftChangeDto, PaginatedShiftChangesResponse, ShiftChangeRequest, ShiftChangeStatus,
};
use brigada_models::users::{
    CreateUserDto, OfferHoursDto, PaginatedUsersResponse, UpdateBalancesDto, UpdateUserDto,
    User, UserBrigadeResponse, UserRole, UserSummary,
};
use brigada_models::vehicles::{
    CreateVehicleDto, PaginatedVehiclesResponse, UpdateVehicleDto, Vehicle,
};

use crate::modules::auth::controller::ErrorResponse;
use crate::modules::health::controller::HealthResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::health::controller::health,
        crate::modules::auth::controller::login_user,
        crate::modules::auth::controller::refresh_token,
        crate::modules::auth::controller::get_me,
        crate::modules::auth::controller::change_password,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::delete_user,
        crate::modules::users::controller::update_balances,
        crate::modules::users::controller::offer_hours,
        crate::modules::users::controller::get_user_brigade,
        crate::modules::parks::controller::create_park,
        crate::modules::parks::controller::get_parks,
        crate::modules::parks::controller::get_park,
        crate::modules::parks::controller::update_park,
        crate::modules::parks::controller::delete_park,
        crate::modules::parks::controller::get_park_brigades,
        crate::modules::brigades::controller::create_brigade,
        crate::modules::brigades::controller::get_brigades,
        crate::modules::brigades::controller::get_brigade,
        crate::modules::brigades::controller::update_brigade,
        crate::modules::brigades::controller::delete_brigade,
        crate::modules::brigades::controller::get_brigade_firefighters,
        crate::modules::guards::controller::create_guard,
        crate::modules::guards::controller::get_guards,
        crate::modules::guards::controller::get_my_guards,
        crate::modules::guards::controller::get_guard,
        crate::modules::guards::controller::update_guard,
        crate::modules::guards::controller::delete_guard,
        crate::modules::guards::controller::generate_guards,
        crate::modules::assignments::controller::create_assignment,
        crate::modules::assignments::controller::get_assignments,
        crate::modules::assignments::controller::delete_assignment,
        crate::modules::requests::controller::create_request,
        crate::modules::requests::controller::get_requests,
        crate::modules::requests::controller::get_request,
        crate::modules::requests::controller::confirm_request,
        crate::modules::requests::controller::deny_request,
        crate::modules::requests::controller::cancel_request,
        crate::modules::shift_changes::controller::create_shift_change,
        crate::modules::shift_changes::controller::get_shift_changes,
        crate::modules::shift_changes::controller::get_shift_change,
        crate::modules::shift_changes::controller::accept_shift_change,
        crate::modules::shift_changes::controller::reject_shift_change,
        crate::modules::shift_changes::controller::approve_shift_change,
        crate::modules::requirements::controller::get_available,
        crate::modules::requirements::controller::create_requirement,
        crate::modules::requirements::controller::get_requirements,
        crate::modules::requirements::controller::delete_requirement,
        crate::modules::vehicles::controller::create_vehicle,
        crate::modules::vehicles::controller::get_vehicles,
        crate::modules::vehicles::controller::get_vehicle,
        crate::modules::vehicles::controller::update_vehicle,
        crate::modules::vehicles::controller::delete_vehicle,
        crate::modules::incidents::controller::create_incident,
        crate::modules::incidents::controller::get_incidents,
        crate::modules::incidents::controller::get_incident,
        crate::modules::incidents::controller::resolve_incident,
        crate::modules::incidents::controller::delete_incident,
        crate::modules::messages::controller::send_message,
        crate::modules::messages::controller::get_inbox,
        crate::modules::messages::controller::get_sent,
        crate::modules::messages::controller::get_unread_count,
        crate::modules::messages::controller::get_message,
        crate::modules::messages::controller::delete_message,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            PaginationMeta,
            PaginationParams,
            LoginRequest,
            LoginResponse,
            RefreshTokenRequest,
            ChangePasswordDto,
            User,
            UserRole,
            UserSummary,
            CreateUserDto,
            UpdateUserDto,
            UpdateBalancesDto,
            OfferHoursDto,
            UserBrigadeResponse,
            PaginatedUsersResponse,
            Park,
            ParkWithStats,
            CreateParkDto,
            UpdateParkDto,
            PaginatedParksResponse,
            Brigade,
            BrigadeWithPark,
            BrigadeRoster,
            CreateBrigadeDto,
            UpdateBrigadeDto,
            PaginatedBrigadesResponse,
            Guard,
            GuardShift,
            GuardWithBrigade,
            CreateGuardDto,
            UpdateGuardDto,
            GenerateGuardsDto,
            GenerateGuardsResponse,
            FirefighterAssignment,
            AssignmentReason,
            CreateAssignmentDto,
            PaginatedAssignmentsResponse,
            LeaveRequest,
            LeaveKind,
            LeaveStatus,
            CreateLeaveRequestDto,
            PaginatedLeaveRequestsResponse,
            ShiftChangeRequest,
            ShiftChangeStatus,
            CreateShiftChangeDto,
            PaginatedShiftChangesResponse,
            Requirement,
            RequirementCandidate,
            CreateRequirementDto,
            PaginatedRequirementsResponse,
            Vehicle,
            CreateVehicleDto,
            UpdateVehicleDto,
            PaginatedVehiclesResponse,
            Incident,
            IncidentKind,
            IncidentStatus,
            CreateIncidentDto,
            ResolveIncidentDto,
            PaginatedIncidentsResponse,
            Message,
            MessageView,
            SendMessageDto,
            PaginatedMessagesResponse,
            UnreadCountResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and metrics"),
        (name = "Authentication", description = "Login, token refresh and the caller's account"),
        (name = "Users", description = "Personnel and HR balances"),
        (name = "Parks", description = "Fire stations"),
        (name = "Brigades", description = "Crews and their rosters"),
        (name = "Guards", description = "Guard calendar and rotation generator"),
        (name = "Assignments", description = "Transfers between brigades"),
        (name = "Requests", description = "Leave and permission requests"),
        (name = "Shift changes", description = "Guard swaps between firefighters"),
        (name = "Requirements", description = "Recalling off-duty firefighters"),
        (name = "Vehicles", description = "Fleet"),
        (name = "Incidents", description = "Incidents at parks"),
        (name = "Messages", description = "Internal messaging")
    ),
    info(
        title = "Brigada API",
        version = "0.1.0",
        description = "Staffing and operations API for a fire service, built with Axum and PostgreSQL.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
