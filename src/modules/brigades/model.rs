pub use brigada_models::brigades::*;
