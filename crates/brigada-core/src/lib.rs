//! # Brigada Core
//!
//! Core types, errors, and utilities for the Brigada API.
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`pagination`]: Pagination parameters and response metadata
//! - [`password`]: bcrypt password hashing and verification
//! - [`permissions`]: Permission name constants
//! - [`serde`]: Query-string friendly deserialization helpers
//!
//! # Example
//!
//! ```ignore
//! use brigada_core::{AppError, PaginationParams, hash_password};
//!
//! let error = AppError::not_found(anyhow::anyhow!("Guard not found"));
//! let hash = hash_password("secure_password")?;
//! let limit = PaginationParams::default().limit();
//! ```

pub mod errors;
pub mod pagination;
pub mod password;
pub mod permissions;
pub mod serde;

pub use errors::AppError;
pub use pagination::{PaginationMeta, PaginationParams};
pub use password::{hash_password, verify_password};
