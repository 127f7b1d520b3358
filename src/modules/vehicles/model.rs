pub use brigada_models::vehicles::*;
