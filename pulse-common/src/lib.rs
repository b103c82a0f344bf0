//! # NeuroPulse Common Library
//!
//! Shared code for the NeuroPulse gateway including:
//! - Emotion data model (predictions, source results, fusion results)
//! - Prediction normalization at the backend boundary
//! - Source weighting policy
//! - Multi-modal fusion engine
//! - Stress scoring
//! - Recommendation request/response contract
//! - Fusion policy configuration
//!
//! Everything in this crate is synchronous and free of I/O. Every public
//! operation is a pure function of its explicit inputs.

pub mod config;
pub mod emotion;
pub mod error;
pub mod fusion;
pub mod normalize;
pub mod recommendation;
pub mod stress;
pub mod weighting;

pub use config::FusionPolicy;
pub use emotion::{
    EmotionPrediction, FusionResult, Modality, ModalityWeights, SourceAnalysis, SourceResult,
    SourceResults, SourceStress,
};
pub use error::{Error, Result};
pub use fusion::FusionEngine;
pub use normalize::LabelAliases;
pub use recommendation::{RecommendationRequest, RecommendationResponse};
pub use stress::{StressLevel, StressScorer};
pub use weighting::{BaseWeights, WeightingPolicy};
