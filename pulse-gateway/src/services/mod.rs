//! Outbound service clients

pub mod emotion_backend;
pub mod recommendation_client;

pub use emotion_backend::{BackendError, BackendHealth, EmotionBackendClient, Upload};
pub use recommendation_client::{RecommendationClient, RecommendationError};
