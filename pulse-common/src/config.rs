//! Fusion policy configuration
//!
//! Weighting constants, negative-affect membership and label aliases are
//! explicit values handed to the fusion engine at construction. They are
//! read from the `[fusion]` table of the gateway TOML file; every field has
//! a built-in default.

use crate::normalize::LabelAliases;
use crate::stress::DEFAULT_NEGATIVE_AFFECT;
use crate::weighting::BaseWeights;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tunable constants of the fusion core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionPolicy {
    /// Base weight of the text source
    #[serde(default = "default_text_weight")]
    pub text_weight: f64,

    /// Base weight of the face source
    #[serde(default = "default_face_weight")]
    pub face_weight: f64,

    /// Base weight of the audio source (0 for a text + face deployment)
    #[serde(default = "default_audio_weight")]
    pub audio_weight: f64,

    /// Labels counted toward the stress score (case-insensitive)
    #[serde(default = "default_negative_affect")]
    pub negative_affect: Vec<String>,

    /// Backend label -> canonical label, applied before the merge
    #[serde(default)]
    pub label_aliases: HashMap<String, String>,
}

fn default_text_weight() -> f64 {
    BaseWeights::three_source().text
}

fn default_face_weight() -> f64 {
    BaseWeights::three_source().face
}

fn default_audio_weight() -> f64 {
    BaseWeights::three_source().audio
}

fn default_negative_affect() -> Vec<String> {
    DEFAULT_NEGATIVE_AFFECT.iter().map(|s| s.to_string()).collect()
}

impl Default for FusionPolicy {
    fn default() -> Self {
        Self {
            text_weight: default_text_weight(),
            face_weight: default_face_weight(),
            audio_weight: default_audio_weight(),
            negative_affect: default_negative_affect(),
            label_aliases: HashMap::new(),
        }
    }
}

impl FusionPolicy {
    /// Parse a standalone `[fusion]` table
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let policy: FusionPolicy = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse fusion policy failed: {}", e)))?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn base_weights(&self) -> BaseWeights {
        BaseWeights {
            text: self.text_weight,
            face: self.face_weight,
            audio: self.audio_weight,
        }
    }

    pub fn label_aliases(&self) -> LabelAliases {
        LabelAliases::new(self.label_aliases.clone())
    }

    /// Reject weights that would break normalization
    pub fn validate(&self) -> Result<()> {
        for (name, weight) in [
            ("text_weight", self.text_weight),
            ("face_weight", self.face_weight),
            ("audio_weight", self.audio_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::Config(format!(
                    "{} must be a finite non-negative number, got {}",
                    name, weight
                )));
            }
        }

        if self.text_weight + self.face_weight + self.audio_weight <= 0.0 {
            return Err(Error::Config(
                "At least one modality weight must be positive".to_string(),
            ));
        }

        if let Some(empty) = self.label_aliases.iter().find(|(k, v)| k.is_empty() || v.is_empty()) {
            return Err(Error::Config(format!(
                "Label alias entries must be non-empty: {:?} -> {:?}",
                empty.0, empty.1
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_valid() {
        let policy = FusionPolicy::default();
        assert!(policy.validate().is_ok());
        assert_eq!(policy.base_weights(), BaseWeights::three_source());
        assert_eq!(policy.negative_affect, vec!["sadness", "fear", "anger", "disgust"]);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let policy = FusionPolicy::from_toml_str("audio_weight = 0.0\ntext_weight = 0.6").unwrap();
        assert_eq!(policy.base_weights(), BaseWeights::text_face());
    }

    #[test]
    fn test_label_aliases_table() {
        let policy = FusionPolicy::from_toml_str(
            r#"
            [label_aliases]
            sad = "sadness"
            happy = "joy"
            "#,
        )
        .unwrap();
        let aliases = policy.label_aliases();
        assert_eq!(aliases.canonical("sad"), "sadness");
        assert_eq!(aliases.canonical("joy"), "joy");
    }

    #[test]
    fn test_negative_weight_rejected() {
        let err = FusionPolicy::from_toml_str("face_weight = -0.1").unwrap_err();
        assert!(err.to_string().contains("face_weight"));
    }

    #[test]
    fn test_all_zero_weights_rejected() {
        let result =
            FusionPolicy::from_toml_str("text_weight = 0.0\nface_weight = 0.0\naudio_weight = 0.0");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
