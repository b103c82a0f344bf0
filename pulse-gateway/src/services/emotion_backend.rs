//! Inference backend client
//!
//! One reqwest client for the text, face and audio emotion services. Every
//! call resolves to a [`SourceResult`]: transport errors, timeouts, non-2xx
//! statuses and malformed payloads all become `Failure` so a single bad
//! backend never fails the whole analysis.

use crate::config::BackendConfig;
use pulse_common::normalize::source_result_from_value;
use pulse_common::{LabelAliases, Modality, SourceResult};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// Longest text accepted for analysis, in characters
pub const MAX_TEXT_CHARS: usize = 5000;

const TEXT_PATH: &str = "/api/analyze-text";
const FACE_PATH: &str = "/api/analyze-face";
const AUDIO_PATH: &str = "/api/upload-and-predict";
const HEALTH_PATH: &str = "/api/health";

/// Inference backend errors
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Timeout
        } else {
            BackendError::Network(err.to_string())
        }
    }
}

impl BackendError {
    /// Reason recorded in the `Failure` source result
    ///
    /// A backend that explained itself gets its own message through.
    fn into_reason(self) -> String {
        match self {
            BackendError::Api(_, message) if !message.is_empty() => message,
            other => other.to_string(),
        }
    }
}

/// Uploaded file forwarded to a backend as multipart
#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: Option<String>,
}

impl Upload {
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    fn into_part(self) -> Result<reqwest::multipart::Part, BackendError> {
        let part = reqwest::multipart::Part::bytes(self.bytes).file_name(self.file_name);
        match self.content_type {
            Some(mime) => part
                .mime_str(&mime)
                .map_err(|e| BackendError::Network(format!("invalid content type {:?}: {}", mime, e))),
            None => Ok(part),
        }
    }
}

/// Reachability of each backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BackendHealth {
    pub text_service: bool,
    pub face_service: bool,
    pub audio_service: bool,
}

/// Trim and bound user text before it leaves the gateway
pub fn validate_text(text: &str) -> Result<&str, String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err("Text cannot be empty".to_string());
    }
    if trimmed.chars().count() > MAX_TEXT_CHARS {
        return Err(format!("Text too long (max {} characters)", MAX_TEXT_CHARS));
    }
    Ok(trimmed)
}

/// Client for the three inference backends
pub struct EmotionBackendClient {
    http_client: reqwest::Client,
    text_url: String,
    face_url: String,
    audio_url: String,
    health_timeout: Duration,
    aliases: LabelAliases,
}

impl EmotionBackendClient {
    pub fn new(config: &BackendConfig, aliases: LabelAliases) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            text_url: config.text_url.trim_end_matches('/').to_string(),
            face_url: config.face_url.trim_end_matches('/').to_string(),
            audio_url: config.audio_url.trim_end_matches('/').to_string(),
            health_timeout: config.health_timeout(),
            aliases,
        })
    }

    fn base_url(&self, modality: Modality) -> &str {
        match modality {
            Modality::Text => &self.text_url,
            Modality::Face => &self.face_url,
            Modality::Audio => &self.audio_url,
        }
    }

    /// Analyze free text
    ///
    /// Empty or oversized text fails locally without contacting the backend.
    pub async fn analyze_text(&self, text: &str) -> SourceResult {
        let text = match validate_text(text) {
            Ok(text) => text,
            Err(reason) => {
                tracing::debug!(modality = %Modality::Text, reason = %reason, "Rejected text input");
                return SourceResult::failure(reason);
            }
        };

        let url = format!("{}{}", self.text_url, TEXT_PATH);
        let outcome = self.post(&url, self.http_client.post(&url).json(&json!({ "text": text }))).await;
        self.to_source_result(Modality::Text, outcome)
    }

    /// Analyze a face image
    pub async fn analyze_face(&self, image: Upload) -> SourceResult {
        let url = format!("{}{}", self.face_url, FACE_PATH);
        let outcome = self.post_upload(&url, "image", image).await;
        self.to_source_result(Modality::Face, outcome)
    }

    /// Analyze an audio clip
    pub async fn analyze_audio(&self, audio: Upload) -> SourceResult {
        let url = format!("{}{}", self.audio_url, AUDIO_PATH);
        let outcome = self.post_upload(&url, "audio", audio).await;
        self.to_source_result(Modality::Audio, outcome)
    }

    /// Probe every backend's health endpoint concurrently
    pub async fn check_health(&self) -> BackendHealth {
        let (text_service, face_service, audio_service) = tokio::join!(
            self.ping(Modality::Text),
            self.ping(Modality::Face),
            self.ping(Modality::Audio),
        );

        BackendHealth {
            text_service,
            face_service,
            audio_service,
        }
    }

    async fn ping(&self, modality: Modality) -> bool {
        let url = format!("{}{}", self.base_url(modality), HEALTH_PATH);
        match self.http_client.get(&url).timeout(self.health_timeout).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(modality = %modality, error = %e, "Backend health check failed");
                false
            }
        }
    }

    async fn post_upload(&self, url: &str, field: &'static str, upload: Upload) -> Result<Value, BackendError> {
        let form = reqwest::multipart::Form::new().part(field, upload.into_part()?);
        self.post(url, self.http_client.post(url).multipart(form)).await
    }

    async fn post(&self, url: &str, request: reqwest::RequestBuilder) -> Result<Value, BackendError> {
        tracing::debug!(url = %url, "Calling inference backend");

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Api(status.as_u16(), error_message(&body)));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))
    }

    fn to_source_result(&self, modality: Modality, outcome: Result<Value, BackendError>) -> SourceResult {
        let result = match outcome {
            Ok(Value::Null) => SourceResult::failure("empty response from backend"),
            Ok(value) => source_result_from_value(value, &self.aliases),
            Err(e) => SourceResult::failure(e.into_reason()),
        };

        match &result {
            SourceResult::Success(analysis) => tracing::info!(
                modality = %modality,
                top_emotion = %analysis.top_emotion,
                confidence = analysis.confidence,
                "Source analysis succeeded"
            ),
            SourceResult::Failure { reason } => tracing::warn!(
                modality = %modality,
                reason = %reason,
                "Source analysis failed"
            ),
            SourceResult::Absent => {}
        }

        result
    }
}

/// Pull `error` out of a JSON error body, else use the raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
