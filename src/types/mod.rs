//! Type definitions for the risk service

pub mod assessment;

pub use assessment::{label_text, recommendation_for, Assessment, RiskBand};
