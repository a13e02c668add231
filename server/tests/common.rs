//! Common utilities for integration tests

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use base64::{engine::general_purpose, Engine as _};
use server::config::ServerConfig;
use server::state::AppState;
use tower::ServiceExt;
use voice_core::backend::ToneSynthesizer;
use voice_core::{wav, Device, ModelHandle, SpeechSynthesizer, VoiceCloner};

/// A cloner backed by the tone synthesizer, staging files in `scratch`.
pub fn tone_cloner(scratch: &Path) -> Arc<VoiceCloner> {
    let model = ModelHandle::new(
        Box::new(ToneSynthesizer::default()),
        Device::Cpu,
        "xtts_v2",
        Duration::from_millis(1500),
    );
    Arc::new(VoiceCloner::new(model, scratch))
}

/// Create a test app whose model is already loaded
pub fn create_test_app(scratch: &Path) -> Router {
    create_app_with(ServerConfig::default(), tone_cloner(scratch))
}

pub fn create_app_with(config: ServerConfig, cloner: Arc<VoiceCloner>) -> Router {
    server::build_router(AppState::ready(config, cloner))
}

/// Tone synthesizer that takes `delay` before every call.
pub struct SlowSynthesizer {
    pub delay: Duration,
    inner: ToneSynthesizer,
}

impl SlowSynthesizer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            inner: ToneSynthesizer::default(),
        }
    }
}

impl SpeechSynthesizer for SlowSynthesizer {
    fn synthesize_to_file(
        &self,
        text: &str,
        speaker_wav: &Path,
        language: &str,
        out_path: &Path,
    ) -> anyhow::Result<()> {
        std::thread::sleep(self.delay);
        self.inner.synthesize_to_file(text, speaker_wav, language, out_path)
    }
}

pub fn slow_cloner(scratch: &Path, delay: Duration) -> Arc<VoiceCloner> {
    let model = ModelHandle::new(Box::new(SlowSynthesizer::new(delay)), Device::Cpu, "xtts_v2", Duration::ZERO);
    Arc::new(VoiceCloner::new(model, scratch))
}

/// Poll until `dir` is empty or `within` elapses.
pub async fn wait_for_empty_scratch(dir: &Path, within: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while tokio::time::Instant::now() < deadline {
        if scratch_is_empty(dir) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    scratch_is_empty(dir)
}

/// Base64 of a mono sine WAV lasting `seconds`.
pub fn voice_reference(seconds: f64) -> String {
    general_purpose::STANDARD.encode(wav::sine_wav(seconds, 22_050).unwrap())
}

pub async fn post_speech(app: Router, body: &serde_json::Value) -> Response {
    post_raw(app, serde_json::to_string(body).unwrap()).await
}

pub async fn post_raw(app: Router, body: String) -> Response {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/v1/audio/speech")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn json_body(response: Response) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

pub fn scratch_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}
