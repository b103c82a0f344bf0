//! Multi-modal emotion fusion engine
//!
//! Merges up to three normalized, weighted distributions into one:
//!
//! 1. Weights come from the [`WeightingPolicy`] (zero for absent or failed
//!    sources).
//! 2. For every contributing source, in text → face → audio order, each
//!    `(label, score)` adds `score × weight` to the label's accumulator.
//! 3. The accumulator is sorted by descending score; equal scores keep the
//!    order in which their label was first inserted.
//! 4. The first entry is the combined emotion and its confidence.
//!
//! When no source contributes, the fixed degenerate result is returned
//! (`neutral`, confidence 0.5). Fusion is total and deterministic: the same
//! inputs always give a bit-identical result.

use crate::config::FusionPolicy;
use crate::emotion::{
    EmotionPrediction, FusionResult, ModalityWeights, SourceResults, SourceStress, NEUTRAL,
};
use crate::stress::StressScorer;
use crate::weighting::WeightingPolicy;
use indexmap::IndexMap;
use tracing::debug;

/// Confidence reported by the degenerate result
pub const DEGENERATE_CONFIDENCE: f64 = 0.5;

/// Weighted merge of source distributions
#[derive(Debug, Clone, Default)]
pub struct FusionEngine {
    weighting: WeightingPolicy,
    scorer: StressScorer,
}

impl FusionEngine {
    pub fn new(policy: &FusionPolicy) -> Self {
        Self {
            weighting: WeightingPolicy::new(policy.base_weights()),
            scorer: StressScorer::new(&policy.negative_affect),
        }
    }

    pub fn scorer(&self) -> &StressScorer {
        &self.scorer
    }

    pub fn weighting(&self) -> &WeightingPolicy {
        &self.weighting
    }

    /// Fuse one session's source outcomes
    pub fn fuse(&self, sources: SourceResults) -> FusionResult {
        let weights = self.weighting.weights_for(&sources);
        let source_stress = self.source_stress(&sources);

        if weights.total() <= 0.0 {
            debug!("No source contributed, using degenerate result");
            return self.degenerate(sources, source_stress);
        }

        let predictions = merge(&sources, &weights);

        let Some(top) = predictions.first() else {
            return self.degenerate(sources, source_stress);
        };

        let combined_emotion = top.label.clone();
        let confidence = top.score;
        let stress = self.scorer.score(&predictions);

        debug!(
            combined_emotion = %combined_emotion,
            confidence,
            stress,
            text_weight = weights.text,
            face_weight = weights.face,
            audio_weight = weights.audio,
            "Fused emotion distribution"
        );

        FusionResult {
            combined_emotion,
            confidence,
            predictions,
            sources,
            weights,
            stress,
            source_stress,
        }
    }

    fn source_stress(&self, sources: &SourceResults) -> SourceStress {
        SourceStress {
            text: self.scorer.score(sources.text.predictions()),
            face: self.scorer.score(sources.face.predictions()),
            audio: self.scorer.score(sources.audio.predictions()),
        }
    }

    fn degenerate(&self, sources: SourceResults, source_stress: SourceStress) -> FusionResult {
        let predictions = vec![EmotionPrediction::new(NEUTRAL, 1.0)];
        let stress = self.scorer.score(&predictions);

        FusionResult {
            combined_emotion: NEUTRAL.to_string(),
            confidence: DEGENERATE_CONFIDENCE,
            predictions,
            sources,
            weights: ModalityWeights::zero(),
            stress,
            source_stress,
        }
    }
}

/// Accumulate weighted scores per label and sort, highest first
fn merge(sources: &SourceResults, weights: &ModalityWeights) -> Vec<EmotionPrediction> {
    let mut accumulator: IndexMap<&str, f64> = IndexMap::new();

    for (modality, source) in sources.iter() {
        let weight = weights.get(modality);
        if weight <= 0.0 {
            continue;
        }
        for prediction in source.predictions() {
            *accumulator.entry(prediction.label.as_str()).or_insert(0.0) +=
                prediction.score * weight;
        }
    }

    let mut merged: Vec<EmotionPrediction> = accumulator
        .into_iter()
        .map(|(label, score)| EmotionPrediction::new(label, score))
        .collect();

    // Stable sort keeps first-insertion order between equal scores
    merged.sort_by(|a, b| b.score.total_cmp(&a.score));
    merged
}
