//! Backend client and end-to-end tests against mock inference services
//!
//! Each mock is a real axum router bound to an ephemeral local port.

use axum::{
    extract::Multipart,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use http_body_util::BodyExt;
use pulse_common::{LabelAliases, SourceResult};
use pulse_gateway::config::{BackendConfig, GatewayConfig};
use pulse_gateway::services::{EmotionBackendClient, Upload};
use pulse_gateway::{build_router, AppState};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tower::util::ServiceExt;

/// Test helper: serve a router on 127.0.0.1:0 and return its base URL
async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Echo the named multipart field's size so tests can see what arrived
async fn multipart_field_len(mut multipart: Multipart, wanted: &str) -> Option<usize> {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some(wanted) {
            return field.bytes().await.ok().map(|b| b.len());
        }
    }
    None
}

/// One router playing all three backends
fn mock_backends() -> Router {
    Router::new()
        .route("/api/health", get(|| async { Json(json!({"status": "ok"})) }))
        .route(
            "/api/analyze-text",
            post(|Json(body): Json<Value>| async move {
                let text = body["text"].as_str().unwrap_or_default().to_string();
                Json(json!({
                    "success": true,
                    "text": text,
                    "predictions": [
                        {"label": "joy", "score": 0.7},
                        {"label": "sad", "score": 0.3}
                    ],
                    "top_emotion": "joy",
                    "confidence": 0.7
                }))
            }),
        )
        .route(
            "/api/analyze-face",
            post(|multipart: Multipart| async move {
                match multipart_field_len(multipart, "image").await {
                    Some(len) if len > 0 => (
                        StatusCode::OK,
                        Json(json!({
                            "success": true,
                            "predictions": {"neutral": 0.6, "fear": 0.15, "joy": 0.25}
                        })),
                    ),
                    _ => (
                        StatusCode::BAD_REQUEST,
                        Json(json!({"success": false, "error": "No image provided"})),
                    ),
                }
            }),
        )
        .route(
            "/api/upload-and-predict",
            post(|multipart: Multipart| async move {
                match multipart_field_len(multipart, "audio").await {
                    Some(_) => Json(json!({
                        "success": true,
                        "predictions": [
                            {"label": "anger", "score": 0.7},
                            {"label": "neutral", "score": 0.3}
                        ]
                    })),
                    None => Json(json!({"success": false, "error": "No audio file"})),
                }
            }),
        )
}

fn backend_config(base_url: &str) -> BackendConfig {
    BackendConfig {
        text_url: base_url.to_string(),
        face_url: base_url.to_string(),
        audio_url: base_url.to_string(),
        ..BackendConfig::default()
    }
}

fn sad_alias() -> LabelAliases {
    LabelAliases::new(HashMap::from([("sad".to_string(), "sadness".to_string())]))
}

// =============================================================================
// Client
// =============================================================================

#[tokio::test]
async fn test_text_analysis_success_applies_aliases() {
    let base = spawn_backend(mock_backends()).await;
    let client = EmotionBackendClient::new(&backend_config(&base), sad_alias()).unwrap();

    let result = client.analyze_text("  What a day  ").await;

    let SourceResult::Success(analysis) = result else {
        panic!("expected success");
    };
    assert_eq!(analysis.top_emotion, "joy");
    assert_eq!(analysis.confidence, 0.7);
    let labels: Vec<&str> = analysis.predictions.iter().map(|p| p.label.as_str()).collect();
    assert_eq!(labels, vec!["joy", "sadness"]);
}

#[tokio::test]
async fn test_face_mapping_predictions_keep_order() {
    let base = spawn_backend(mock_backends()).await;
    let client = EmotionBackendClient::new(&backend_config(&base), LabelAliases::default()).unwrap();

    let upload = Upload::new(b"\xff\xd8\xff\xe0".to_vec(), "frame.jpg").with_content_type("image/jpeg");
    let result = client.analyze_face(upload).await;

    let SourceResult::Success(analysis) = result else {
        panic!("expected success");
    };
    let labels: Vec<&str> = analysis.predictions.iter().map(|p| p.label.as_str()).collect();
    assert_eq!(labels, vec!["neutral", "fear", "joy"]);
    assert_eq!(analysis.top_emotion, "neutral");
}

#[tokio::test]
async fn test_non_success_status_reports_backend_error_message() {
    let base = spawn_backend(mock_backends()).await;
    let client = EmotionBackendClient::new(&backend_config(&base), LabelAliases::default()).unwrap();

    let result = client.analyze_face(Upload::new(Vec::new(), "empty.jpg")).await;

    assert_eq!(result, SourceResult::failure("No image provided"));
}

#[tokio::test]
async fn test_audio_upload_is_sent_as_audio_field() {
    let base = spawn_backend(mock_backends()).await;
    let client = EmotionBackendClient::new(&backend_config(&base), LabelAliases::default()).unwrap();

    let result = client.analyze_audio(Upload::new(b"RIFF0000WAVE".to_vec(), "clip.wav")).await;

    assert!(result.is_success());
    assert_eq!(result.predictions()[0].label, "anger");
}

#[tokio::test]
async fn test_non_json_success_body_is_failure() {
    let router = Router::new().route("/api/analyze-text", post(|| async { "definitely not json" }));
    let base = spawn_backend(router).await;
    let client = EmotionBackendClient::new(&backend_config(&base), LabelAliases::default()).unwrap();

    let result = client.analyze_text("hello").await;

    let SourceResult::Failure { reason } = result else {
        panic!("expected failure");
    };
    assert!(reason.starts_with("Parse error"), "unexpected reason: {}", reason);
}

#[tokio::test]
async fn test_slow_backend_times_out_as_failure() {
    let router = Router::new().route(
        "/api/analyze-text",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"success": true, "predictions": []}))
        }),
    );
    let base = spawn_backend(router).await;
    let config = BackendConfig {
        request_timeout_secs: 1,
        ..backend_config(&base)
    };
    let client = EmotionBackendClient::new(&config, LabelAliases::default()).unwrap();

    let result = client.analyze_text("hello").await;

    assert_eq!(result, SourceResult::failure("Request timed out"));
}

#[tokio::test]
async fn test_backend_reporting_failure_in_body() {
    let router = Router::new().route(
        "/api/analyze-text",
        post(|| async { Json(json!({"success": false, "error": "Model not loaded"})) }),
    );
    let base = spawn_backend(router).await;
    let client = EmotionBackendClient::new(&backend_config(&base), LabelAliases::default()).unwrap();

    assert_eq!(
        client.analyze_text("hello").await,
        SourceResult::failure("Model not loaded")
    );
}

#[tokio::test]
async fn test_health_check_with_mixed_backends() {
    let base = spawn_backend(mock_backends()).await;
    let config = BackendConfig {
        face_url: "http://127.0.0.1:9".to_string(),
        ..backend_config(&base)
    };
    let client = EmotionBackendClient::new(&config, LabelAliases::default()).unwrap();

    let health = client.check_health().await;

    assert!(health.text_service);
    assert!(!health.face_service);
    assert!(health.audio_service);
}

// =============================================================================
// Gateway end to end
// =============================================================================

#[tokio::test]
async fn test_analyze_end_to_end_with_all_sources() {
    let base = spawn_backend(mock_backends()).await;
    let mut config = GatewayConfig {
        backends: backend_config(&base),
        ..GatewayConfig::default()
    };
    config
        .fusion
        .label_aliases
        .insert("sad".to_string(), "sadness".to_string());
    let app = build_router(AppState::from_config(&config).unwrap());

    let boundary = "e2e-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"text\"\r\n\r\nWhat a day\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"f.jpg\"\r\n\
             Content-Type: image/jpeg\r\n\r\njpeg\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"audio\"; filename=\"a.wav\"\r\n\
             Content-Type: audio/wav\r\n\r\nwave\r\n\
             --{b}--\r\n",
            b = boundary
        )
        .as_bytes(),
    );

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(axum::body::Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    // joy 0.38, neutral 0.30, anger 0.14, sadness 0.12, fear 0.06
    assert_eq!(body["combined_emotion"], "joy");
    assert!((body["confidence"].as_f64().unwrap() - 0.38).abs() < 1e-9);
    assert!((body["stress"].as_f64().unwrap() - 0.32).abs() < 1e-9);
    assert_eq!(body["stress_level"], "moderate");
    assert_eq!(body["sources"]["text"]["status"], "success");
    assert_eq!(body["sources"]["face"]["status"], "success");
    assert_eq!(body["sources"]["audio"]["status"], "success");
    assert_eq!(body["predictions"].as_array().unwrap().len(), 5);
}
