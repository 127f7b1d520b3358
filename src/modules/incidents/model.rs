pub use brigada_models::incidents::*;
