//! Recommendation client (OpenAI-compatible chat completions)
//!
//! Produces mental-health tips and a short emotional summary from a fusion
//! result. Both public entry points are infallible: any error, timeout or
//! unusable answer is replaced with a fixed fallback, so callers always have
//! something displayable.

use crate::config::RecommendationConfig;
use pulse_common::{FusionResult, RecommendationRequest, RecommendationResponse, SourceResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Summary used whenever the LLM cannot produce one
pub const SUMMARY_FALLBACK: &str = "We've analyzed your emotions and stress levels. \
Taking deep breaths, practicing mindfulness, and engaging in activities you enjoy can help \
improve your emotional wellbeing. If you're feeling overwhelmed, consider talking to a friend \
or mental health professional.";

const SUMMARY_TEMPERATURE: f32 = 0.7;
const SUMMARY_MAX_TOKENS: u32 = 300;

const TIPS_SYSTEM_PROMPT: &str =
    "You are a mental health wellbeing expert providing practical, supportive advice.";
const SUMMARY_SYSTEM_PROMPT: &str =
    "You are a helpful emotional wellbeing assistant that provides supportive and practical advice.";

/// Recommendation client errors
#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("No API key configured")]
    NotConfigured,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for the recommendation LLM
pub struct RecommendationClient {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
    temperature: f32,
    max_tokens: u32,
}

impl RecommendationClient {
    pub fn new(config: &RecommendationConfig) -> Result<Self, RecommendationError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| RecommendationError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            timeout: config.timeout(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate tips, substituting the fixed fallback on any failure
    pub async fn generate_tips(&self, request: &RecommendationRequest) -> RecommendationResponse {
        match self.try_generate_tips(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Recommendation unavailable, using fallback tips");
                RecommendationResponse::fallback()
            }
        }
    }

    pub async fn try_generate_tips(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationResponse, RecommendationError> {
        let prompt = tips_prompt(request);
        let content = self
            .complete(TIPS_SYSTEM_PROMPT, &prompt, self.temperature, self.max_tokens)
            .await?;
        let response = parse_tips(&content)?;

        tracing::info!(
            tips = response.tips.len(),
            resources = response.resources.len(),
            "Generated recommendations"
        );
        Ok(response)
    }

    /// Short plain-text summary of a fusion result, or [`SUMMARY_FALLBACK`]
    pub async fn summarize(&self, result: &FusionResult) -> String {
        match self.try_summarize(result).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(error = %e, "Summary unavailable, using fallback");
                SUMMARY_FALLBACK.to_string()
            }
        }
    }

    pub async fn try_summarize(&self, result: &FusionResult) -> Result<String, RecommendationError> {
        let prompt = summary_prompt(result);
        let content = self
            .complete(SUMMARY_SYSTEM_PROMPT, &prompt, SUMMARY_TEMPERATURE, SUMMARY_MAX_TOKENS)
            .await?;

        let summary = content.trim();
        if summary.is_empty() {
            return Err(RecommendationError::Parse("empty summary".to_string()));
        }
        Ok(summary.to_string())
    }

    /// One chat completion round trip, bounded by the configured timeout
    async fn complete(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, RecommendationError> {
        let api_key = self.api_key.as_deref().ok_or(RecommendationError::NotConfigured)?;

        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            temperature,
            max_tokens,
        };

        let call = async {
            let response = self
                .http_client
                .post(&self.endpoint)
                .bearer_auth(api_key)
                .json(&body)
                .send()
                .await
                .map_err(map_reqwest_error)?;

            let status = response.status();
            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();
                return Err(RecommendationError::Api(status.as_u16(), error_text));
            }

            response
                .json::<ChatResponse>()
                .await
                .map_err(|e| RecommendationError::Parse(e.to_string()))
        };

        let chat = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| RecommendationError::Timeout)??;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| RecommendationError::Parse("no completion content".to_string()))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> RecommendationError {
    if err.is_timeout() {
        RecommendationError::Timeout
    } else {
        RecommendationError::Network(err.to_string())
    }
}

fn percent(value: f64) -> String {
    format!("{:.0}%", value * 100.0)
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn tips_prompt(request: &RecommendationRequest) -> String {
    let breakdown = request
        .emotion_breakdown
        .iter()
        .map(|p| format!("{} {}", p.label, percent(p.score)))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Based on the following emotional analysis:\n\
         - Primary emotion: {primary}\n\
         - Overall stress level: {stress}\n\
         - Emotion distribution: {breakdown}\n\
         - Text analysis performed: {has_text} (stress {text_stress})\n\
         - Face analysis performed: {has_face} (stress {face_stress})\n\n\
         Provide a brief, encouraging summary (1-2 sentences), 4-5 practical tips for \
         managing emotions and stress, and 2-3 professional resources or helplines if \
         stress is above 70%.\n\
         Respond with JSON only, in exactly this shape:\n\
         {{\"summary\": \"string\", \"tips\": [\"string\"], \
         \"resources\": [{{\"title\": \"string\", \"description\": \"string\"}}]}}\n\
         Keep the tone supportive and non-clinical. Below 30% stress focus on maintaining \
         positive habits; between 30% and 70% offer coping strategies; above 70% include \
         crisis resources.",
        primary = request.primary_emotion,
        stress = percent(request.stress_score),
        breakdown = if breakdown.is_empty() { "none".to_string() } else { breakdown },
        has_text = yes_no(request.has_text_analysis),
        text_stress = percent(request.text_stress),
        has_face = yes_no(request.has_face_analysis),
        face_stress = percent(request.face_stress),
    )
}

fn summary_prompt(result: &FusionResult) -> String {
    let mut prompt = format!(
        "Here are the user's emotion analysis results:\n\
         - Overall stress level: {}\n\
         - Combined emotion: {} ({})\n",
        percent(result.stress),
        result.combined_emotion,
        percent(result.confidence),
    );

    for (modality, source) in result.sources.iter() {
        let line = match source {
            SourceResult::Success(analysis) => {
                format!("{} ({})", analysis.top_emotion, percent(analysis.confidence))
            }
            SourceResult::Failure { .. } => "unavailable".to_string(),
            SourceResult::Absent => "not analyzed".to_string(),
        };
        prompt.push_str(&format!("- {} analysis: {}\n", modality, line));
    }

    prompt.push_str(
        "\nWrite a short emotional summary (2-3 sentences) of the user's overall state, \
         explain what the stress level means for their wellbeing, and give 3 practical \
         suggestions. Keep the tone supportive and friendly, avoid jargon, and answer in \
         plain text without markdown.",
    );
    prompt
}

/// Parse the LLM answer into a recommendation, tolerating ```json fences
pub fn parse_tips(content: &str) -> Result<RecommendationResponse, RecommendationError> {
    let json = strip_code_fence(content);
    let response: RecommendationResponse =
        serde_json::from_str(json).map_err(|e| RecommendationError::Parse(e.to_string()))?;

    if !response.is_usable() {
        return Err(RecommendationError::Parse(
            "recommendation has no summary or tips".to_string(),
        ));
    }
    Ok(response)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_common::EmotionPrediction;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {}  "), "{}");
    }

    #[test]
    fn test_parse_tips_accepts_fenced_json() {
        let content = "```json\n{\"summary\": \"You seem calm.\", \"tips\": [\"Keep journaling\"]}\n```";
        let response = parse_tips(content).unwrap();
        assert_eq!(response.summary, "You seem calm.");
        assert_eq!(response.tips, vec!["Keep journaling".to_string()]);
        assert!(response.resources.is_empty());
    }

    #[test]
    fn test_parse_tips_rejects_prose() {
        let err = parse_tips("Here are some tips: breathe.").unwrap_err();
        assert!(matches!(err, RecommendationError::Parse(_)));
    }

    #[test]
    fn test_parse_tips_rejects_empty_payload() {
        let err = parse_tips(r#"{"summary": "", "tips": []}"#).unwrap_err();
        assert!(matches!(err, RecommendationError::Parse(_)));
    }

    #[test]
    fn test_tips_prompt_mentions_inputs() {
        let request = RecommendationRequest {
            stress_score: 0.72,
            primary_emotion: "fear".to_string(),
            emotion_breakdown: vec![EmotionPrediction::new("fear", 0.72)],
            has_text_analysis: true,
            has_face_analysis: false,
            text_stress: 0.72,
            face_stress: 0.0,
        };
        let prompt = tips_prompt(&request);
        assert!(prompt.contains("Primary emotion: fear"));
        assert!(prompt.contains("Overall stress level: 72%"));
        assert!(prompt.contains("Text analysis performed: Yes"));
        assert!(prompt.contains("Face analysis performed: No"));
    }

    #[test]
    fn test_summary_prompt_lists_every_source() {
        let result = pulse_common::FusionEngine::default().fuse(pulse_common::SourceResults::new(
            SourceResult::success(vec![EmotionPrediction::new("joy", 0.9)]),
            SourceResult::Absent,
            SourceResult::failure("no microphone"),
        ));
        let prompt = summary_prompt(&result);
        assert!(prompt.contains("- text analysis: joy (90%)\n"));
        assert!(prompt.contains("- face analysis: not analyzed\n"));
        assert!(prompt.contains("- audio analysis: unavailable\n"));
        assert!(prompt.contains("Combined emotion: joy (90%)"));
    }

    #[tokio::test]
    async fn test_unconfigured_client_falls_back() {
        let client = RecommendationClient::new(&RecommendationConfig::default()).unwrap();
        assert!(!client.is_configured());

        let request: RecommendationRequest = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            client.try_generate_tips(&request).await,
            Err(RecommendationError::NotConfigured)
        ));
        assert_eq!(client.generate_tips(&request).await, RecommendationResponse::fallback());
    }

    #[test]
    fn test_blank_api_key_counts_as_unconfigured() {
        let config = RecommendationConfig {
            api_key: Some("   ".to_string()),
            ..RecommendationConfig::default()
        };
        assert!(!RecommendationClient::new(&config).unwrap().is_configured());
    }
}
