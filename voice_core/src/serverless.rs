//! Serverless invocation handler.
//!
//! The host delivers events shaped `{"input": {text, voice_reference, language?}}`
//! and expects either a success or a failure object back; nothing escapes as a
//! panic or error.

use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

use crate::adapter::VoiceCloner;
use crate::envelope::Payload;

/// Result object returned to the serverless host.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InvocationOutput {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InvocationOutput {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            audio_base64: None,
            duration: None,
            generation_time: None,
            text_length: None,
            device: None,
            model: None,
            error: Some(message.into()),
        }
    }
}

/// Handle one invocation event.
pub fn handle_event(cloner: &VoiceCloner, event: &Value) -> InvocationOutput {
    let payload = event
        .get("input")
        .and_then(Value::as_object)
        .map(Payload::from_object)
        .unwrap_or_default();

    let request = match payload.into_request() {
        Ok(request) => request,
        Err(e) => return InvocationOutput::failure(e.to_string()),
    };

    match cloner.synthesize(&request) {
        Ok(result) => InvocationOutput {
            success: true,
            audio_base64: Some(result.audio_base64()),
            duration: Some(result.duration_secs),
            generation_time: Some(result.generation_secs),
            text_length: Some(request.text_length()),
            device: Some(cloner.model().device().to_string()),
            model: Some(cloner.model().model_name().to_string()),
            error: None,
        },
        Err(e) => {
            if e.is_client_error() {
                warn!("Rejected invocation: {e}");
            } else {
                error!("Error: {e}");
            }
            InvocationOutput::failure(e.to_string())
        }
    }
}
