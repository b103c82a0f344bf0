//! Single-source analysis endpoints
//!
//! Each endpoint forwards one input to its backend and reports the
//! normalized outcome. Backend failure is a `Failure` result with status
//! 200; only a request without the expected input is rejected.

use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use pulse_common::{Modality, SourceResult};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::services::Upload;
use crate::AppState;

/// POST /api/text request body
#[derive(Debug, Deserialize)]
pub struct TextRequest {
    #[serde(default)]
    pub text: Option<String>,
}

/// Outcome of one single-source analysis
#[derive(Debug, Serialize)]
pub struct SourceResponse {
    pub modality: Modality,
    pub result: SourceResult,
    /// Stress of this source's own predictions
    pub stress: f64,
}

impl SourceResponse {
    fn new(state: &AppState, modality: Modality, result: SourceResult) -> Self {
        let stress = state.engine.scorer().score(result.predictions());
        Self {
            modality,
            result,
            stress,
        }
    }
}

/// POST /api/text
pub async fn analyze_text(
    State(state): State<AppState>,
    Json(request): Json<TextRequest>,
) -> ApiResult<Json<SourceResponse>> {
    let text = request
        .text
        .ok_or_else(|| ApiError::BadRequest("Missing 'text' field".to_string()))?;

    let result = state.backends.analyze_text(&text).await;
    Ok(Json(SourceResponse::new(&state, Modality::Text, result)))
}

/// POST /api/face (multipart field `image`)
pub async fn analyze_face(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<SourceResponse>> {
    let image = read_upload(multipart, "image").await?;
    let result = state.backends.analyze_face(image).await;
    Ok(Json(SourceResponse::new(&state, Modality::Face, result)))
}

/// POST /api/audio (multipart field `audio`)
pub async fn analyze_audio(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<SourceResponse>> {
    let audio = read_upload(multipart, "audio").await?;
    let result = state.backends.analyze_audio(audio).await;
    Ok(Json(SourceResponse::new(&state, Modality::Audio, result)))
}

/// Read the named file field, rejecting a missing or empty upload
async fn read_upload(mut multipart: Multipart, field_name: &str) -> ApiResult<Upload> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(field_name) {
            continue;
        }

        let upload = field_to_upload(field, field_name).await?;
        if upload.bytes.is_empty() {
            return Err(ApiError::BadRequest(format!("Empty '{}' upload", field_name)));
        }
        return Ok(upload);
    }

    Err(ApiError::BadRequest(format!("Missing '{}' field", field_name)))
}

/// Buffer one multipart field, keeping its file name and content type
pub(crate) async fn field_to_upload(
    field: axum::extract::multipart::Field<'_>,
    default_name: &str,
) -> ApiResult<Upload> {
    let file_name = field
        .file_name()
        .filter(|n| !n.is_empty())
        .unwrap_or(default_name)
        .to_string();
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await?;

    let upload = Upload::new(bytes.to_vec(), file_name);
    Ok(match content_type {
        Some(mime) => upload.with_content_type(mime),
        None => upload,
    })
}

/// Build single-source routes
pub fn source_routes() -> Router<AppState> {
    Router::new()
        .route("/api/text", post(analyze_text))
        .route("/api/face", post(analyze_face))
        .route("/api/audio", post(analyze_audio))
}
