//! Recommendation request/response contract
//!
//! The recommendation requester turns a fusion result into human-readable
//! guidance. Field names are camelCase on the wire to match the dashboard.

use crate::emotion::{EmotionPrediction, FusionResult};
use serde::{Deserialize, Serialize};

/// Input to the recommendation requester
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    #[serde(default)]
    pub stress_score: f64,
    #[serde(default = "default_primary_emotion")]
    pub primary_emotion: String,
    #[serde(default)]
    pub emotion_breakdown: Vec<EmotionPrediction>,
    #[serde(default)]
    pub has_text_analysis: bool,
    #[serde(default)]
    pub has_face_analysis: bool,
    #[serde(default)]
    pub text_stress: f64,
    #[serde(default)]
    pub face_stress: f64,
}

fn default_primary_emotion() -> String {
    crate::emotion::NEUTRAL.to_string()
}

impl From<&FusionResult> for RecommendationRequest {
    fn from(result: &FusionResult) -> Self {
        Self {
            stress_score: result.stress,
            primary_emotion: result.combined_emotion.clone(),
            emotion_breakdown: result.predictions.clone(),
            has_text_analysis: result.weights.text > 0.0,
            has_face_analysis: result.weights.face > 0.0,
            text_stress: result.source_stress.text,
            face_stress: result.source_stress.face,
        }
    }
}

/// Helpline or other external resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub title: String,
    pub description: String,
}

impl Resource {
    fn new(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
        }
    }
}

/// Guidance returned to the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub summary: String,
    pub tips: Vec<String>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl RecommendationResponse {
    /// Static payload used whenever the requester fails or times out
    pub fn fallback() -> Self {
        Self {
            summary: "We've analyzed your emotional state and provided personalized suggestions to support your wellbeing.".to_string(),
            tips: [
                "Practice deep breathing exercises for 5 minutes daily",
                "Engage in physical activity or stretching",
                "Connect with friends or family members",
                "Maintain a regular sleep schedule",
                "Try mindfulness or meditation techniques",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            resources: vec![
                Resource::new(
                    "Crisis Text Line",
                    "Text HOME to 741741 for free, 24/7 crisis support",
                ),
                Resource::new(
                    "National Suicide Prevention Lifeline",
                    "Call 988 for 24/7 support",
                ),
            ],
        }
    }

    /// A response is usable when it has a summary and at least one tip
    pub fn is_usable(&self) -> bool {
        !self.summary.trim().is_empty() && self.tips.iter().any(|t| !t.trim().is_empty())
    }
}
