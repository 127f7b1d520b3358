pub use brigada_models::requests::*;
