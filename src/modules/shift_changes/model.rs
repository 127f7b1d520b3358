pub use brigada_models::shift_changes::*;
