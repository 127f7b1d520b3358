pub use brigada_models::assignments::*;
