//! Recommendation endpoint

use axum::{body::Bytes, extract::State, routing::post, Json, Router};
use pulse_common::{RecommendationRequest, RecommendationResponse};

use crate::AppState;

/// POST /api/generate-tips
///
/// Always answers 200. A body that does not decode as a recommendation
/// request gets the fallback payload, same as an LLM failure.
pub async fn generate_tips(State(state): State<AppState>, body: Bytes) -> Json<RecommendationResponse> {
    let request: RecommendationRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed recommendation request, using fallback tips");
            return Json(RecommendationResponse::fallback());
        }
    };

    Json(state.recommender.generate_tips(&request).await)
}

/// Build recommendation routes
pub fn tips_routes() -> Router<AppState> {
    Router::new().route("/api/generate-tips", post(generate_tips))
}
