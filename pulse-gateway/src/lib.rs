//! pulse-gateway library - NeuroPulse analysis gateway
//!
//! Fans requests out to the text, face and audio inference backends, fuses
//! the per-source results with the pulse-common fusion engine, and asks an
//! LLM for a summary and tips.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use pulse_common::{FusionEngine, LabelAliases};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod analysis;
pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod services;

use config::GatewayConfig;
use services::{BackendError, EmotionBackendClient, RecommendationClient, RecommendationError};

/// Errors raised while assembling application state
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Backend client: {0}")]
    Backend(#[from] BackendError),

    #[error("Recommendation client: {0}")]
    Recommendation(#[from] RecommendationError),
}

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Inference backend client
    pub backends: Arc<EmotionBackendClient>,
    /// LLM client for tips and summaries
    pub recommender: Arc<RecommendationClient>,
    /// Fusion engine built from the configured policy
    pub engine: Arc<FusionEngine>,
    /// Label canonicalization for raw payloads posted to /api/fusion
    pub aliases: Arc<LabelAliases>,
    /// Server start time, for uptime reporting
    pub startup_time: DateTime<Utc>,
    /// Request body limit applied to every route
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Build state from validated configuration
    pub fn from_config(config: &GatewayConfig) -> Result<Self, StartupError> {
        let aliases = config.fusion.label_aliases();
        Ok(Self {
            backends: Arc::new(EmotionBackendClient::new(&config.backends, aliases.clone())?),
            recommender: Arc::new(RecommendationClient::new(&config.recommendation)?),
            engine: Arc::new(FusionEngine::new(&config.fusion)),
            aliases: Arc::new(aliases),
            startup_time: Utc::now(),
            max_upload_bytes: config.max_upload_bytes,
        })
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .merge(api::health_routes())
        .merge(api::source_routes())
        .merge(api::fusion_routes())
        .merge(api::tips_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}
