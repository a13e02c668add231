use thiserror::Error;

/// Failure classes of a single synthesis request, plus the fatal startup case.
///
/// Transports dispatch on the variant (see [`SynthesisError::status_code`]);
/// the rendered message is what ends up in the `error` field of a response.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// A required request field was absent or empty.
    #[error("Missing {0} parameter")]
    MissingField(&'static str),

    /// `voice_reference` was not valid base64.
    #[error("Invalid base64 voice_reference: {0}")]
    InvalidEncoding(String),

    /// The model rejected the input or faulted. The message is the model's own.
    #[error("{0}")]
    SynthesisFailure(String),

    /// The model reported success but its output is missing or not a WAV file.
    #[error("Generated audio is unreadable: {0}")]
    OutputCorrupt(String),

    /// Staging the per-request scratch files failed.
    #[error("Scratch file error: {0}")]
    Scratch(#[from] std::io::Error),

    #[error("Model not ready yet")]
    ModelNotReady,

    /// Model initialization failed. Never returned for a request; the process exits instead.
    #[error("Failed to load model: {0}")]
    ModelLoadFailure(String),
}

impl SynthesisError {
    /// HTTP status for this failure class: 400 for client input, 503 while loading, 500 otherwise.
    pub fn status_code(&self) -> u16 {
        match self {
            SynthesisError::MissingField(_) | SynthesisError::InvalidEncoding(_) => 400,
            SynthesisError::ModelNotReady => 503,
            SynthesisError::SynthesisFailure(_)
            | SynthesisError::OutputCorrupt(_)
            | SynthesisError::Scratch(_)
            | SynthesisError::ModelLoadFailure(_) => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code() == 400
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_message() {
        assert_eq!(
            SynthesisError::MissingField("text").to_string(),
            "Missing text parameter"
        );
        assert_eq!(
            SynthesisError::MissingField("voice_reference").to_string(),
            "Missing voice_reference parameter"
        );
    }

    #[test]
    fn test_synthesis_failure_is_verbatim() {
        let err = SynthesisError::SynthesisFailure("Language xx is not supported".into());
        assert_eq!(err.to_string(), "Language xx is not supported");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(SynthesisError::MissingField("text").status_code(), 400);
        assert_eq!(SynthesisError::InvalidEncoding("bad".into()).status_code(), 400);
        assert_eq!(SynthesisError::SynthesisFailure("boom".into()).status_code(), 500);
        assert_eq!(SynthesisError::OutputCorrupt("empty".into()).status_code(), 500);
        assert_eq!(SynthesisError::ModelNotReady.status_code(), 503);
        assert!(SynthesisError::InvalidEncoding("bad".into()).is_client_error());
        assert!(!SynthesisError::ModelNotReady.is_client_error());
    }
}
