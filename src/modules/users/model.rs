//! Personnel models, re-exported from `brigada-models`.

pub use brigada_models::users::*;
