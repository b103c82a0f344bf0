//! Fused analysis endpoints

use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use pulse_common::normalize::source_result_from_value;
use pulse_common::SourceResults;
use serde::Deserialize;
use serde_json::Value;

use crate::analysis::{self, AnalysisInput, FusedResponse};
use crate::api::sources::field_to_upload;
use crate::error::ApiResult;
use crate::AppState;

/// POST /api/fusion request body
///
/// Each field is a raw backend payload exactly as the backend returned it,
/// or null when that source was not used.
#[derive(Debug, Default, Deserialize)]
pub struct FusionRequest {
    #[serde(default)]
    pub text_result: Value,
    #[serde(default)]
    pub face_result: Value,
    #[serde(default)]
    pub audio_result: Value,
}

/// POST /api/fusion
///
/// Fuses payloads the client already obtained from the backends.
pub async fn fuse_results(
    State(state): State<AppState>,
    Json(request): Json<FusionRequest>,
) -> Json<FusedResponse> {
    let aliases = state.aliases.as_ref();
    let sources = SourceResults::new(
        source_result_from_value(request.text_result, aliases),
        source_result_from_value(request.face_result, aliases),
        source_result_from_value(request.audio_result, aliases),
    );

    Json(analysis::fuse_sources(&state, sources).await)
}

/// POST /api/analyze (multipart: optional `text`, `image`, `audio`)
///
/// Runs every supplied source concurrently and fuses the outcomes.
pub async fn analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<FusedResponse>> {
    let input = read_analysis_input(multipart).await?;

    tracing::debug!(
        text = input.text.is_some(),
        image = input.image.is_some(),
        audio = input.audio.is_some(),
        "Starting analysis session"
    );

    Ok(Json(analysis::run_analysis(&state, input).await))
}

/// Blank text and empty files count as not supplied; unknown fields are ignored
async fn read_analysis_input(mut multipart: Multipart) -> ApiResult<AnalysisInput> {
    let mut input = AnalysisInput::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "text" => {
                let text = field.text().await?;
                if !text.trim().is_empty() {
                    input.text = Some(text);
                }
            }
            "image" => {
                let upload = field_to_upload(field, "image").await?;
                if !upload.bytes.is_empty() {
                    input.image = Some(upload);
                }
            }
            "audio" => {
                let upload = field_to_upload(field, "audio").await?;
                if !upload.bytes.is_empty() {
                    input.audio = Some(upload);
                }
            }
            other => tracing::debug!(field = %other, "Ignoring unknown multipart field"),
        }
    }

    Ok(input)
}

/// Build fusion routes
pub fn fusion_routes() -> Router<AppState> {
    Router::new()
        .route("/api/fusion", post(fuse_results))
        .route("/api/analyze", post(analyze))
}
