//! One synthesis request end to end: decode, stage, synthesize, inspect, read back.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use base64::{engine::general_purpose, Engine as _};
use tempfile::TempPath;
use tracing::info;

use crate::config::ModelConfig;
use crate::envelope::SynthesisRequest;
use crate::error::SynthesisError;
use crate::model::ModelHandle;
use crate::wav;

/// Output of a successful synthesis.
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    /// WAV file bytes as written by the model.
    pub audio: Vec<u8>,
    /// Frames over sample rate, read from the output header.
    pub duration_secs: f64,
    /// Wall-clock time spent inside the model.
    pub generation_secs: f64,
}

impl SynthesisResult {
    pub fn audio_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.audio)
    }

    /// Seconds of audio per second of compute; 0 when generation time is 0.
    pub fn realtime_factor(&self) -> f64 {
        if self.generation_secs > 0.0 {
            self.duration_secs / self.generation_secs
        } else {
            0.0
        }
    }
}

/// The loaded model plus the scratch directory requests are staged in.
/// Shared by every transport for the lifetime of the process.
#[derive(Debug)]
pub struct VoiceCloner {
    model: ModelHandle,
    scratch_dir: PathBuf,
}

impl VoiceCloner {
    pub fn new(model: ModelHandle, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            model,
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Load the configured model. Blocking; fails fast on any load error.
    pub fn load(config: &ModelConfig) -> Result<Self, SynthesisError> {
        std::fs::create_dir_all(&config.scratch_dir)
            .map_err(|e| SynthesisError::ModelLoadFailure(format!(
                "scratch directory {} is unusable: {e}",
                config.scratch_dir.display()
            )))?;
        let model = ModelHandle::load(config)?;
        Ok(Self::new(model, config.scratch_dir.clone()))
    }

    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Synthesize `request.text` in the voice of the base64 reference audio.
    ///
    /// Both scratch files are removed when this returns, whatever the outcome.
    /// Nothing touches the filesystem until the request has been validated and
    /// the reference decoded.
    pub fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisResult, SynthesisError> {
        request.validate()?;
        let reference = decode_reference(&request.voice_reference)?;

        info!(
            "Generating speech: {} chars, language={}",
            request.text_length(),
            request.language
        );

        let ref_path = self.stage_reference(&reference)?;
        let out_path = self.scratch_file("xtts-out-")?;

        let started = Instant::now();
        self.model
            .synthesize_to_file(&request.text, &ref_path, &request.language, &out_path)?;
        let generation_secs = started.elapsed().as_secs_f64();

        let info = wav::inspect_file(&out_path)
            .map_err(|e| SynthesisError::OutputCorrupt(format!("{e:#}")))?;
        let audio = std::fs::read(&out_path)
            .map_err(|e| SynthesisError::OutputCorrupt(format!("{}: {e}", out_path.display())))?;

        let result = SynthesisResult {
            audio,
            duration_secs: info.duration_secs(),
            generation_secs,
        };
        info!(
            "Generated {:.2}s audio in {:.2}s ({:.1}x realtime)",
            result.duration_secs,
            result.generation_secs,
            result.realtime_factor()
        );
        Ok(result)
    }

    fn stage_reference(&self, bytes: &[u8]) -> Result<TempPath, SynthesisError> {
        let mut file = tempfile::Builder::new()
            .prefix("xtts-ref-")
            .suffix(".wav")
            .tempfile_in(&self.scratch_dir)?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(file.into_temp_path())
    }

    /// Reserve a uniquely named, empty file for the model to overwrite.
    fn scratch_file(&self, prefix: &str) -> Result<TempPath, SynthesisError> {
        let file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(".wav")
            .tempfile_in(&self.scratch_dir)?;
        Ok(file.into_temp_path())
    }
}

/// Decode the transport encoding of the reference audio. Line breaks and other
/// ASCII whitespace are ignored so wrapped `base64` output is accepted.
fn decode_reference(encoded: &str) -> Result<Vec<u8>, SynthesisError> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| SynthesisError::InvalidEncoding(e.to_string()))
}
