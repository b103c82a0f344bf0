//! Analysis orchestration
//!
//! Issues the backend requests of one session concurrently, waits for all of
//! them, then runs the fusion engine exactly once. A source that was not
//! supplied stays `Absent`; a source that fails becomes `Failure` without
//! affecting the others.

use crate::services::{EmotionBackendClient, Upload};
use crate::AppState;
use chrono::{DateTime, Utc};
use pulse_common::{FusionResult, SourceResult, SourceResults, StressLevel};
use serde::Serialize;
use uuid::Uuid;

/// Inputs of one analysis session; `None` means the source was not supplied
#[derive(Debug, Clone, Default)]
pub struct AnalysisInput {
    pub text: Option<String>,
    pub image: Option<Upload>,
    pub audio: Option<Upload>,
}

impl AnalysisInput {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.image.is_none() && self.audio.is_none()
    }
}

/// Fused analysis as returned to the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct FusedResponse {
    pub success: bool,
    pub analysis_id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub result: FusionResult,
    pub stress_level: StressLevel,
    pub llm_summary: String,
}

impl FusedResponse {
    pub fn new(result: FusionResult, llm_summary: String) -> Self {
        Self {
            success: true,
            analysis_id: Uuid::new_v4(),
            analyzed_at: Utc::now(),
            stress_level: StressLevel::from_score(result.stress),
            result,
            llm_summary,
        }
    }
}

/// Run every supplied source concurrently and collect the outcomes
pub async fn collect_sources(backends: &EmotionBackendClient, input: AnalysisInput) -> SourceResults {
    let AnalysisInput { text, image, audio } = input;

    let text = async {
        match text {
            Some(text) => backends.analyze_text(&text).await,
            None => SourceResult::Absent,
        }
    };
    let face = async {
        match image {
            Some(image) => backends.analyze_face(image).await,
            None => SourceResult::Absent,
        }
    };
    let audio = async {
        match audio {
            Some(audio) => backends.analyze_audio(audio).await,
            None => SourceResult::Absent,
        }
    };

    let (text, face, audio) = tokio::join!(text, face, audio);
    SourceResults::new(text, face, audio)
}

/// Fuse collected sources and attach the LLM summary
pub async fn fuse_sources(state: &AppState, sources: SourceResults) -> FusedResponse {
    let result = state.engine.fuse(sources);

    tracing::info!(
        combined_emotion = %result.combined_emotion,
        confidence = result.confidence,
        stress = result.stress,
        degenerate = result.is_degenerate(),
        "Fused analysis"
    );

    let llm_summary = state.recommender.summarize(&result).await;
    FusedResponse::new(result, llm_summary)
}

/// Full session: collect, fuse, summarize
pub async fn run_analysis(state: &AppState, input: AnalysisInput) -> FusedResponse {
    let sources = collect_sources(&state.backends, input).await;
    fuse_sources(state, sources).await
}
