//! Stress scoring
//!
//! Stress is the share of a distribution's mass sitting on negative-affect
//! labels, clamped to [0, 1]. The same formula serves the merged
//! distribution and each source's own predictions.

use crate::emotion::EmotionPrediction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default negative-affect membership
pub const DEFAULT_NEGATIVE_AFFECT: [&str; 4] = ["sadness", "fear", "anger", "disgust"];

/// Upper bound (exclusive) of the Low band
const LOW_STRESS_LIMIT: f64 = 0.3;
/// Upper bound (exclusive) of the Moderate band
const MODERATE_STRESS_LIMIT: f64 = 0.6;

/// Maps an emotion distribution to a scalar in [0, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct StressScorer {
    /// Lowercased negative-affect labels
    negative_affect: Vec<String>,
}

impl StressScorer {
    pub fn new<I, S>(negative_affect: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            negative_affect: negative_affect
                .into_iter()
                .map(|label| label.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Whether `label` counts as negative affect (case-insensitive)
    pub fn is_negative(&self, label: &str) -> bool {
        let label = label.to_lowercase();
        self.negative_affect.iter().any(|n| *n == label)
    }

    /// Sum of negative-affect scores, clamped to [0, 1]; 0 for an empty list
    pub fn score(&self, predictions: &[EmotionPrediction]) -> f64 {
        let sum: f64 = predictions
            .iter()
            .filter(|p| self.is_negative(&p.label))
            .map(|p| p.score)
            .sum();

        if sum.is_nan() {
            return 0.0;
        }
        sum.clamp(0.0, 1.0)
    }
}

impl Default for StressScorer {
    fn default() -> Self {
        Self::new(DEFAULT_NEGATIVE_AFFECT)
    }
}

/// Display band for a stress score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StressLevel {
    Low,
    Moderate,
    High,
}

impl StressLevel {
    pub fn from_score(score: f64) -> Self {
        if score < LOW_STRESS_LIMIT {
            StressLevel::Low
        } else if score < MODERATE_STRESS_LIMIT {
            StressLevel::Moderate
        } else {
            StressLevel::High
        }
    }
}

impl fmt::Display for StressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StressLevel::Low => write!(f, "Low"),
            StressLevel::Moderate => write!(f, "Moderate"),
            StressLevel::High => write!(f, "High"),
        }
    }
}
