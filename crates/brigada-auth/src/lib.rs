//! # Brigada Auth
//!
//! JWT claims and token utilities.
//!
//! - **Access token** ([`Claims`]): carries the role, the `mando_especial`
//!   flag and the resolved permission list so handlers authorize without a
//!   database round trip.
//! - **Refresh token** ([`RefreshTokenClaims`]): identifies the user only;
//!   permissions are recomputed from the database when it is exchanged.
//!
//! ```ignore
//! use brigada_auth::{create_access_token, verify_token};
//!
//! let token = create_access_token(user_id, "ana@bomberos.es", "mando", false, perms, &config)?;
//! let claims = verify_token(&token, &config)?;
//! ```

pub mod claims;
pub mod jwt;

pub use claims::{Claims, RefreshTokenClaims};
pub use jwt::{create_access_token, create_refresh_token, verify_refresh_token, verify_token};
