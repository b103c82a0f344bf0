//! Source weighting policy
//!
//! Each source gets a fixed base weight when it reported success, zero when
//! it failed or was absent. A success with an empty prediction list still
//! takes its weight; it just adds nothing to the merge. Base weights are then normalized so the
//! three weights sum to 1. When nothing contributed, all weights are zero
//! and the fusion engine takes its degenerate branch.

use crate::emotion::{ModalityWeights, SourceResults};
use serde::{Deserialize, Serialize};

/// Un-normalized reliability weight per modality
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseWeights {
    pub text: f64,
    pub face: f64,
    pub audio: f64,
}

impl BaseWeights {
    /// Three-source configuration: text 0.4, face 0.4, audio 0.2
    pub const fn three_source() -> Self {
        Self {
            text: 0.4,
            face: 0.4,
            audio: 0.2,
        }
    }

    /// Text + face pairing, audio never contributes
    pub const fn text_face() -> Self {
        Self {
            text: 0.6,
            face: 0.4,
            audio: 0.0,
        }
    }

    /// Text-only configuration
    pub const fn text_only() -> Self {
        Self {
            text: 1.0,
            face: 0.0,
            audio: 0.0,
        }
    }
}

impl Default for BaseWeights {
    fn default() -> Self {
        Self::three_source()
    }
}

/// Computes normalized modality weights from source outcomes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightingPolicy {
    base: BaseWeights,
}

impl WeightingPolicy {
    pub fn new(base: BaseWeights) -> Self {
        Self { base }
    }

    pub fn base(&self) -> BaseWeights {
        self.base
    }

    /// Normalized weights for one set of source outcomes
    ///
    /// Absent and failed sources contribute 0. The result sums to 1 (within
    /// floating-point tolerance) or is all zero.
    pub fn weights_for(&self, sources: &SourceResults) -> ModalityWeights {
        let gate = |succeeded: bool, weight: f64| if succeeded { weight } else { 0.0 };

        let text = gate(sources.text.is_success(), self.base.text);
        let face = gate(sources.face.is_success(), self.base.face);
        let audio = gate(sources.audio.is_success(), self.base.audio);

        let total = text + face + audio;
        if total <= 0.0 {
            return ModalityWeights::zero();
        }

        ModalityWeights {
            text: text / total,
            face: face / total,
            audio: audio / total,
        }
    }
}

impl Default for WeightingPolicy {
    fn default() -> Self {
        Self::new(BaseWeights::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::{EmotionPrediction, SourceResult};

    fn ok(label: &str) -> SourceResult {
        SourceResult::success(vec![EmotionPrediction::new(label, 1.0)])
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_all_sources_succeed_uses_base_weights() {
        let policy = WeightingPolicy::default();
        let w = policy.weights_for(&SourceResults::new(ok("joy"), ok("joy"), ok("joy")));
        assert_close(w.text, 0.4);
        assert_close(w.face, 0.4);
        assert_close(w.audio, 0.2);
        assert_close(w.total(), 1.0);
    }

    #[test]
    fn test_single_source_gets_full_weight() {
        let policy = WeightingPolicy::default();
        let w = policy.weights_for(&SourceResults::new(
            SourceResult::Absent,
            SourceResult::Absent,
            ok("calm"),
        ));
        assert_eq!(w, ModalityWeights { text: 0.0, face: 0.0, audio: 1.0 });
    }

    #[test]
    fn test_failed_source_is_excluded() {
        let policy = WeightingPolicy::default();
        let w = policy.weights_for(&SourceResults::new(
            ok("joy"),
            SourceResult::failure("camera error"),
            ok("joy"),
        ));
        assert_close(w.text, 0.4 / 0.6);
        assert_close(w.face, 0.0);
        assert_close(w.audio, 0.2 / 0.6);
    }

    #[test]
    fn test_nothing_succeeded_is_all_zero() {
        let policy = WeightingPolicy::default();
        let w = policy.weights_for(&SourceResults::new(
            SourceResult::failure("down"),
            SourceResult::Absent,
            SourceResult::failure("down"),
        ));
        assert_eq!(w, ModalityWeights::zero());
    }

    #[test]
    fn test_success_without_predictions_keeps_its_weight() {
        let policy = WeightingPolicy::default();
        let w = policy.weights_for(&SourceResults::new(
            SourceResult::success(vec![]),
            ok("joy"),
            SourceResult::Absent,
        ));
        assert_close(w.text, 0.5);
        assert_close(w.face, 0.5);
        assert_eq!(w.audio, 0.0);
    }

    #[test]
    fn test_text_only_preset() {
        let policy = WeightingPolicy::new(BaseWeights::text_only());
        let w = policy.weights_for(&SourceResults::new(ok("joy"), ok("fear"), ok("anger")));
        assert_eq!(w, ModalityWeights { text: 1.0, face: 0.0, audio: 0.0 });

        let w = policy.weights_for(&SourceResults::new(
            SourceResult::failure("empty text"),
            ok("fear"),
            SourceResult::Absent,
        ));
        assert_eq!(w, ModalityWeights::zero());
    }

    #[test]
    fn test_text_face_preset_ignores_audio() {
        let policy = WeightingPolicy::new(BaseWeights::text_face());
        let w = policy.weights_for(&SourceResults::new(ok("joy"), ok("joy"), ok("joy")));
        assert_close(w.text, 0.6);
        assert_close(w.face, 0.4);
        assert_eq!(w.audio, 0.0);
    }
}
