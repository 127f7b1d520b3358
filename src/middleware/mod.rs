//! Request extractors for authentication and authorization.
//!
//! 1. Client sends `Authorization: Bearer <token>`
//! 2. [`auth::AuthUser`] verifies the token and exposes its claims
//! 3. `Require*` extractors check one permission each and reject with 403
//!
//! ```ignore
//! use crate::middleware::auth::{AuthUser, RequireGuardsManage};
//!
//! async fn my_guards(auth_user: AuthUser) -> impl IntoResponse {
//!     let user_id = auth_user.user_id()?;
//!     // ...
//! }
//!
//! async fn create_guard(RequireGuardsManage(auth_user): RequireGuardsManage) -> impl IntoResponse {
//!     // only runs with "guards:manage"
//! }
//! ```

pub mod auth;
