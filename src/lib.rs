//! Cardio Risk Service Library
//!
//! Validates clinical measurements against a fixed schema, scores them with a
//! pre-trained ONNX classifier and turns the result into a risk label,
//! confidence and recommendation.

pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod schema;
pub mod server;
pub mod types;
pub mod validator;

pub use config::AppConfig;
pub use error::{AssessError, PredictorError};
pub use models::inference::Predictor;
pub use pipeline::assess;
pub use types::assessment::{label_text, recommendation_for, Assessment};
pub use validator::{validate, RawInput, ValidatedFeatures, ValidationErrors};
