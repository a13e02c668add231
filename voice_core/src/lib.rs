//! Voice-cloning speech synthesis behind a transport-neutral request contract.
//!
//! The HTTP server and the serverless worker both go through the same path:
//! [`Envelope`] detection, [`VoiceCloner::synthesize`] and the shared
//! [`SynthesisError`] taxonomy. The neural model itself sits behind
//! [`SpeechSynthesizer`].

pub mod adapter;
pub mod backend;
pub mod config;
pub mod envelope;
pub mod error;
pub mod model;
pub mod serverless;
pub mod wav;

pub use adapter::{SynthesisResult, VoiceCloner};
pub use config::{BackendKind, DevicePreference, ModelConfig};
pub use envelope::{Envelope, EnvelopeKind, Payload, SynthesisRequest};
pub use error::SynthesisError;
pub use model::{Device, ModelHandle, SpeechSynthesizer};
pub use serverless::{handle_event, InvocationOutput};
