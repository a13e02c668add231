//! Request envelope detection.
//!
//! Callers hit the speech endpoint in two ways: direct clients send the
//! fields at the top level, while serverless hosts wrap them in an `input`
//! object. The envelope is resolved once at the boundary and carried along so
//! the response can be shaped the same way the request was.

use serde_json::{Map, Value};

use crate::error::SynthesisError;

pub const DEFAULT_LANGUAGE: &str = "en";

/// Which wrapping convention a request used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    Flat,
    Nested,
}

/// Raw request fields as they arrived. Only JSON strings are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    pub text: Option<String>,
    pub voice_reference: Option<String>,
    pub language: Option<String>,
}

impl Payload {
    pub fn from_object(obj: &Map<String, Value>) -> Self {
        let field = |name: &str| obj.get(name).and_then(Value::as_str).map(str::to_owned);
        Self {
            text: field("text"),
            voice_reference: field("voice_reference"),
            language: field("language"),
        }
    }

    fn from_value(value: &Value) -> Self {
        value.as_object().map(Self::from_object).unwrap_or_default()
    }

    /// Validate and canonicalize into a [`SynthesisRequest`].
    pub fn into_request(self) -> Result<SynthesisRequest, SynthesisError> {
        let text = self
            .text
            .filter(|t| !t.is_empty())
            .ok_or(SynthesisError::MissingField("text"))?;
        let voice_reference = self
            .voice_reference
            .filter(|v| !v.is_empty())
            .ok_or(SynthesisError::MissingField("voice_reference"))?;
        let language = self
            .language
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        Ok(SynthesisRequest {
            text,
            voice_reference,
            language,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    Flat(Payload),
    Nested(Payload),
}

impl Envelope {
    /// Detect the envelope of a parsed JSON body. Never fails: a body that is
    /// not an object is a flat envelope with no fields.
    pub fn detect(body: &Value) -> Self {
        match body.as_object() {
            Some(obj) => match obj.get("input") {
                Some(inner) => Envelope::Nested(Payload::from_value(inner)),
                None => Envelope::Flat(Payload::from_object(obj)),
            },
            None => Envelope::Flat(Payload::default()),
        }
    }

    pub fn kind(&self) -> EnvelopeKind {
        match self {
            Envelope::Flat(_) => EnvelopeKind::Flat,
            Envelope::Nested(_) => EnvelopeKind::Nested,
        }
    }

    pub fn into_payload(self) -> Payload {
        match self {
            Envelope::Flat(p) | Envelope::Nested(p) => p,
        }
    }

    /// Split into the envelope tag and the validated request.
    pub fn normalize(self) -> (EnvelopeKind, Result<SynthesisRequest, SynthesisError>) {
        (self.kind(), self.into_payload().into_request())
    }
}

/// Canonical request handed to the invocation adapter.
///
/// `voice_reference` is still in its base64 transport encoding; the adapter
/// decodes it so a malformed value never reaches the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice_reference: String,
    pub language: String,
}

impl SynthesisRequest {
    pub fn new(
        text: impl Into<String>,
        voice_reference: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            voice_reference: voice_reference.into(),
            language: language.into(),
        }
    }

    /// Number of characters, as reported in `text_length`.
    pub fn text_length(&self) -> usize {
        self.text.chars().count()
    }

    pub(crate) fn validate(&self) -> Result<(), SynthesisError> {
        if self.text.is_empty() {
            return Err(SynthesisError::MissingField("text"));
        }
        if self.voice_reference.is_empty() {
            return Err(SynthesisError::MissingField("voice_reference"));
        }
        Ok(())
    }
}
