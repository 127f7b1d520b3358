pub use brigada_models::guards::*;
