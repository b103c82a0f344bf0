//! Emotion data model shared by the fusion core and the gateway
//!
//! A source (modality) produces a [`SourceResult`]; the fusion engine turns
//! the three source slots into one [`FusionResult`]. None of these values are
//! mutated after construction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Label used by the degenerate result and as a default top emotion
pub const NEUTRAL: &str = "neutral";

/// One (label, score) pair from a classifier
///
/// Labels are an open vocabulary and are compared case-sensitively.
/// Scores are expected in [0, 1] but are carried as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionPrediction {
    pub label: String,
    pub score: f64,
}

impl EmotionPrediction {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Emotion inference channel
///
/// Declaration order is the fusion processing order, which also decides
/// ties between equal merged scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Face,
    Audio,
}

impl Modality {
    /// All modalities in processing order
    pub const ALL: [Modality; 3] = [Modality::Text, Modality::Face, Modality::Audio];

    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Text => "text",
            Modality::Face => "face",
            Modality::Audio => "audio",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful analysis from one source, predictions already normalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAnalysis {
    pub predictions: Vec<EmotionPrediction>,
    pub top_emotion: String,
    pub confidence: f64,
}

/// Outcome of one modality's analysis
///
/// `Absent` means the source was never invoked (camera disabled, no text
/// typed). `Failure` means it was invoked and did not produce a result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceResult {
    Success(SourceAnalysis),
    Failure { reason: String },
    #[default]
    Absent,
}

impl SourceResult {
    pub fn success(predictions: Vec<EmotionPrediction>) -> Self {
        let (top_emotion, confidence) = predictions
            .first()
            .map(|p| (p.label.clone(), p.score))
            .unwrap_or_else(|| (NEUTRAL.to_string(), 0.0));

        SourceResult::Success(SourceAnalysis {
            predictions,
            top_emotion,
            confidence,
        })
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        SourceResult::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SourceResult::Success(_))
    }

    /// Normalized predictions of a successful source, empty otherwise
    pub fn predictions(&self) -> &[EmotionPrediction] {
        match self {
            SourceResult::Success(analysis) => &analysis.predictions,
            _ => &[],
        }
    }
}

/// The three source slots of one analysis session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceResults {
    pub text: SourceResult,
    pub face: SourceResult,
    pub audio: SourceResult,
}

impl SourceResults {
    pub fn new(text: SourceResult, face: SourceResult, audio: SourceResult) -> Self {
        Self { text, face, audio }
    }

    pub fn get(&self, modality: Modality) -> &SourceResult {
        match modality {
            Modality::Text => &self.text,
            Modality::Face => &self.face,
            Modality::Audio => &self.audio,
        }
    }

    /// Slots in processing order
    pub fn iter(&self) -> impl Iterator<Item = (Modality, &SourceResult)> {
        Modality::ALL.into_iter().map(move |m| (m, self.get(m)))
    }
}

/// Per-source reliability weights
///
/// Sums to 1 when any source succeeded, all zero in the degenerate result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModalityWeights {
    pub text: f64,
    pub face: f64,
    pub audio: f64,
}

impl ModalityWeights {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn get(&self, modality: Modality) -> f64 {
        match modality {
            Modality::Text => self.text,
            Modality::Face => self.face,
            Modality::Audio => self.audio,
        }
    }

    pub fn total(&self) -> f64 {
        self.text + self.face + self.audio
    }
}

/// Stress computed from each source's own predictions
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceStress {
    pub text: f64,
    pub face: f64,
    pub audio: f64,
}

/// Combined assessment for one analysis session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionResult {
    /// Label with the highest merged score
    pub combined_emotion: String,
    /// Merged score of `combined_emotion`
    pub confidence: f64,
    /// Merged distribution, highest score first
    pub predictions: Vec<EmotionPrediction>,
    /// The source results the fusion was computed from
    pub sources: SourceResults,
    pub weights: ModalityWeights,
    /// Stress of the merged distribution, in [0, 1]
    pub stress: f64,
    /// Stress of each source's own distribution
    pub source_stress: SourceStress,
}

impl FusionResult {
    /// True when no source contributed any signal
    pub fn is_degenerate(&self) -> bool {
        self.weights.total() == 0.0
    }
}
