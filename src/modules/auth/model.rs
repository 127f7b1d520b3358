//! Authentication DTOs, re-exported from `brigada-models`.

pub use brigada_models::auth::*;
