pub use brigada_models::parks::*;
