pub mod config;
pub mod error;
pub mod features;
pub mod insights;
pub mod model;
pub mod pipeline;
pub mod registry;
pub mod scaler;
pub mod schema;
pub mod trees;
pub mod util;

pub use error::PredictError;
pub use model::Predictor;
pub use schema::ModelKind;
