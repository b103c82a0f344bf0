//! Prediction normalization at the backend boundary
//!
//! Inference backends answer with loosely shaped JSON: predictions may be a
//! list of `{label, score}` objects, a `label -> score` mapping, or missing
//! entirely. This module decides the shape once, at the edge, and hands the
//! fusion engine nothing but canonical [`EmotionPrediction`] lists wrapped in
//! a [`SourceResult`].
//!
//! Nothing here ever fails: unrecognized shapes become an empty list (no
//! signal) or a `Failure` source.

use crate::emotion::{EmotionPrediction, SourceAnalysis, SourceResult, NEUTRAL};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// One list entry as sent by a backend
#[derive(Debug, Clone, Deserialize)]
pub struct RawPrediction {
    pub label: String,
    #[serde(default)]
    pub score: f64,
}

/// Predictions field of a backend payload, in any of its observed shapes
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawPredictions {
    /// `[{"label": "joy", "score": 0.9}, ...]`
    List(Vec<RawPrediction>),
    /// `{"joy": 0.9, ...}` in document order
    Mapping(IndexMap<String, f64>),
    /// Anything else (string, number, list of junk)
    Other(Value),
}

impl RawPredictions {
    /// Convert to the canonical ordered list
    ///
    /// Lists pass through in order; mappings keep entry order; anything else
    /// yields an empty list. Scores are neither clamped nor re-normalized.
    pub fn into_predictions(self) -> Vec<EmotionPrediction> {
        match self {
            RawPredictions::List(items) => items
                .into_iter()
                .map(|p| EmotionPrediction::new(p.label, p.score))
                .collect(),
            RawPredictions::Mapping(entries) => entries
                .into_iter()
                .map(|(label, score)| EmotionPrediction::new(label, score))
                .collect(),
            RawPredictions::Other(value) => {
                tracing::debug!(shape = %value_kind(&value), "Unrecognized predictions shape");
                Vec::new()
            }
        }
    }
}

/// Normalize an optional predictions field
pub fn normalize_predictions(raw: Option<RawPredictions>) -> Vec<EmotionPrediction> {
    raw.map(RawPredictions::into_predictions).unwrap_or_default()
}

/// Normalize an arbitrary JSON value holding predictions
///
/// Never panics and never errors; `null` and unknown shapes give `[]`.
pub fn normalize_value(value: &Value) -> Vec<EmotionPrediction> {
    if value.is_null() {
        return Vec::new();
    }
    serde_json::from_value::<RawPredictions>(value.clone())
        .map(RawPredictions::into_predictions)
        .unwrap_or_default()
}

/// Backend analysis payload as received on the wire
///
/// Every field is optional; a payload without `success: true` is a failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSourceResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub predictions: Option<RawPredictions>,
    #[serde(default, alias = "topEmotion")]
    pub top_emotion: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl RawSourceResult {
    /// Convert into the tagged source outcome
    pub fn into_source_result(self, aliases: &LabelAliases) -> SourceResult {
        if !self.success {
            let reason = self
                .error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| "analysis failed".to_string());
            return SourceResult::failure(reason);
        }

        let predictions = aliases.apply(normalize_predictions(self.predictions));

        let top_emotion = self
            .top_emotion
            .map(|label| aliases.canonical(&label).to_string())
            .or_else(|| predictions.first().map(|p| p.label.clone()))
            .unwrap_or_else(|| NEUTRAL.to_string());
        let confidence = self
            .confidence
            .or_else(|| predictions.first().map(|p| p.score))
            .unwrap_or(0.0);

        SourceResult::Success(SourceAnalysis {
            predictions,
            top_emotion,
            confidence,
        })
    }
}

/// Convert an arbitrary JSON payload into a source outcome
///
/// `null` is `Absent`; a non-object or undecodable payload is a `Failure`.
pub fn source_result_from_value(value: Value, aliases: &LabelAliases) -> SourceResult {
    match value {
        Value::Null => SourceResult::Absent,
        Value::Object(_) => match serde_json::from_value::<RawSourceResult>(value) {
            Ok(raw) => raw.into_source_result(aliases),
            Err(e) => SourceResult::failure(format!("malformed source result: {}", e)),
        },
        other => SourceResult::failure(format!(
            "malformed source result: expected object, got {}",
            value_kind(&other)
        )),
    }
}

/// Label canonicalization applied before the merge
///
/// Maps backend-specific vocabulary (`sad`, `angry`) onto shared labels.
/// Empty by default, in which case labels pass through untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelAliases {
    aliases: HashMap<String, String>,
}

impl LabelAliases {
    pub fn new(aliases: HashMap<String, String>) -> Self {
        Self { aliases }
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    pub fn canonical<'a>(&'a self, label: &'a str) -> &'a str {
        self.aliases.get(label).map(String::as_str).unwrap_or(label)
    }

    pub fn apply(&self, predictions: Vec<EmotionPrediction>) -> Vec<EmotionPrediction> {
        if self.is_empty() {
            return predictions;
        }
        predictions
            .into_iter()
            .map(|p| EmotionPrediction::new(self.canonical(&p.label), p.score))
            .collect()
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
