use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use voice_core::{EnvelopeKind, SynthesisError};

/// API Error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid JSON body: {0}")]
    InvalidJson(String),

    #[error("Request body rejected: {1}")]
    BodyRejected(StatusCode, String),

    #[error("Synthesis timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::BodyRejected(status, _) => *status,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Synthesis(e) => StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Shape the error like the request was shaped: bare `{error}` for flat
    /// requests, `{status: "FAILED", output: {error}}` for nested ones.
    pub fn into_enveloped(self, kind: EnvelopeKind) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Error: {}", self);
        }
        let body = ErrorResponse {
            error: self.to_string(),
        };
        match kind {
            EnvelopeKind::Flat => (status, Json(body)).into_response(),
            EnvelopeKind::Nested => (
                status,
                Json(FailedResponse {
                    status: "FAILED",
                    output: body,
                }),
            )
                .into_response(),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct FailedResponse {
    status: &'static str,
    output: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.into_enveloped(EnvelopeKind::Flat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(SynthesisError::MissingField("text")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(SynthesisError::SynthesisFailure("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(SynthesisError::ModelNotReady).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(ApiError::InvalidJson("eof".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Timeout(Duration::from_secs(600)).status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            ApiError::BodyRejected(StatusCode::PAYLOAD_TOO_LARGE, "length limit exceeded".into()).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_timeout_message() {
        let err = ApiError::Timeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "Synthesis timed out after 0.25s");
    }

    #[test]
    fn test_synthesis_message_is_not_wrapped() {
        let err = ApiError::from(SynthesisError::MissingField("text"));
        assert_eq!(err.to_string(), "Missing text parameter");
    }
}
