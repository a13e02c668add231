use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, warn};
use voice_core::{
    Envelope, EnvelopeKind, SynthesisError, SynthesisRequest, SynthesisResult, VoiceCloner,
};

use crate::error::ApiError;
use crate::state::{AppState, Readiness};

pub const SERVICE_NAME: &str = "XTTS Voice Cloning Server";
pub const SPEECH_PATH: &str = "/v1/audio/speech";

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    model: String,
    device: String,
    load_time: f64,
    model_ready: bool,
}

#[derive(Serialize)]
pub struct NotReadyResponse {
    status: &'static str,
    message: String,
}

/// Body of a successful nested-envelope synthesis.
#[derive(Serialize)]
pub struct SpeechOutput {
    success: bool,
    audio_base64: String,
    duration: f64,
    generation_time: f64,
    text_length: usize,
    device: String,
    realtime_factor: f64,
}

#[derive(Serialize)]
pub struct CompletedResponse {
    status: &'static str,
    output: SpeechOutput,
}

pub async fn health_check(State(state): State<AppState>) -> Response {
    match state.readiness() {
        Readiness::Ready(cloner) => {
            let model = cloner.model();
            Json(HealthResponse {
                status: "healthy",
                model: model.model_name().to_string(),
                device: model.device().to_string(),
                load_time: model.load_time().as_secs_f64(),
                model_ready: true,
            })
            .into_response()
        }
        Readiness::Failed(message) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(NotReadyResponse {
                status: "failed",
                message,
            }),
        )
            .into_response(),
        Readiness::Starting | Readiness::Loading => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(NotReadyResponse {
                status: "loading",
                message: "Model is still loading, please wait...".to_string(),
            }),
        )
            .into_response(),
    }
}

pub async fn generate_speech(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    state.request_count.fetch_add(1, Ordering::Relaxed);

    // No body means no envelope to mirror, so rejections answer flat.
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            return ApiError::BodyRejected(rejection.status(), rejection.body_text()).into_response()
        }
    };
    let body: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => return ApiError::InvalidJson(e.to_string()).into_response(),
    };

    let (kind, request) = Envelope::detect(&body).normalize();
    match run_synthesis(&state, request).await {
        Ok((request, result, cloner)) => speech_response(kind, &request, result, &cloner),
        Err(e) => e.into_enveloped(kind),
    }
}

async fn run_synthesis(
    state: &AppState,
    request: Result<SynthesisRequest, SynthesisError>,
) -> Result<(SynthesisRequest, SynthesisResult, Arc<VoiceCloner>), ApiError> {
    let cloner = state
        .readiness()
        .cloner()
        .cloned()
        .ok_or(SynthesisError::ModelNotReady)?;
    let request = request?;

    // The blocking task cannot be cancelled: on timeout it runs to completion
    // in the background and still removes its scratch files.
    let task = tokio::task::spawn_blocking({
        let cloner = cloner.clone();
        move || {
            let result = cloner.synthesize(&request);
            (request, result)
        }
    });
    let limit = state.config.request_timeout;
    let (request, result) = tokio::time::timeout(limit, task)
        .await
        .map_err(|_| {
            warn!("Synthesis exceeded {:?}, abandoning request", limit);
            ApiError::Timeout(limit)
        })?
        .map_err(|join_err| {
            error!("Task join error: {join_err}");
            ApiError::InternalError(format!("Task join error: {join_err}"))
        })?;

    Ok((request, result?, cloner))
}

fn speech_response(
    kind: EnvelopeKind,
    request: &SynthesisRequest,
    result: SynthesisResult,
    cloner: &VoiceCloner,
) -> Response {
    match kind {
        EnvelopeKind::Flat => ([(header::CONTENT_TYPE, "audio/wav")], result.audio).into_response(),
        EnvelopeKind::Nested => Json(CompletedResponse {
            status: "COMPLETED",
            output: SpeechOutput {
                success: true,
                audio_base64: result.audio_base64(),
                duration: result.duration_secs,
                generation_time: result.generation_secs,
                text_length: request.text_length(),
                device: cloner.model().device().to_string(),
                realtime_factor: result.realtime_factor(),
            },
        })
        .into_response(),
    }
}

/// Fields shared by the informational endpoints; null until the model is loaded.
fn model_summary(readiness: &Readiness) -> (Value, Value, Value) {
    match readiness.cloner() {
        Some(cloner) => {
            let model = cloner.model();
            (
                json!(model.model_name()),
                json!(model.device().as_str()),
                json!(model.load_time().as_secs_f64()),
            )
        }
        None => (Value::Null, Value::Null, Value::Null),
    }
}

pub async fn test_endpoint(State(state): State<AppState>) -> Json<Value> {
    let readiness = state.readiness();
    let (model, device, _) = model_summary(&readiness);
    Json(json!({
        "message": "XTTS server is running!",
        "device": device,
        "model": model,
        "model_ready": readiness.cloner().is_some(),
        "endpoints": ["/health", SPEECH_PATH, "/test"]
    }))
}

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let readiness = state.readiness();
    let (model, device, load_time) = model_summary(&readiness);
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "model": model,
        "device": device,
        "model_ready": readiness.cloner().is_some(),
        "state": readiness.label(),
        "load_time": load_time,
        "requests_served": state.request_count.load(Ordering::Relaxed),
        "endpoints": {
            "health": "/health",
            "generate": SPEECH_PATH,
            "test": "/test"
        },
        "usage": {
            "method": "POST",
            "url": SPEECH_PATH,
            "body": {
                "text": "Your text here",
                "voice_reference": "base64_encoded_wav_audio",
                "language": "en"
            }
        }
    }))
}
