pub use brigada_models::requirements::*;
