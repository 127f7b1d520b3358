pub use brigada_models::messages::*;
