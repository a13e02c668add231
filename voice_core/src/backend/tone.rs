//! Deterministic stand-in for the neural model.
//!
//! It behaves like XTTS at the edges (unreadable reference audio and unknown
//! languages are rejected, output is a WAV whose length follows the text) so
//! the transports can be exercised without a GPU or model download.

use std::path::Path;

use anyhow::Context;

use crate::model::SpeechSynthesizer;
use crate::wav;

/// Languages accepted by XTTS v2.
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "en", "es", "fr", "de", "it", "pt", "pl", "tr", "ru", "nl", "cs", "ar", "zh-cn", "hu", "ko",
    "ja", "hi",
];

#[derive(Debug, Clone)]
pub struct ToneSynthesizer {
    pub sample_rate: u32,
    /// Output audio per input character.
    pub secs_per_char: f64,
}

impl Default for ToneSynthesizer {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
            secs_per_char: 0.06,
        }
    }
}

impl ToneSynthesizer {
    /// Exact number of output frames for `text`.
    pub fn frames_for(&self, text: &str) -> usize {
        let secs = text.chars().count() as f64 * self.secs_per_char;
        (secs * self.sample_rate as f64).round() as usize
    }
}

impl SpeechSynthesizer for ToneSynthesizer {
    fn synthesize_to_file(
        &self,
        text: &str,
        speaker_wav: &Path,
        language: &str,
        out_path: &Path,
    ) -> anyhow::Result<()> {
        if !SUPPORTED_LANGUAGES.contains(&language) {
            anyhow::bail!(
                "Language {language} is not supported. Supported languages are {:?}",
                SUPPORTED_LANGUAGES
            );
        }
        wav::inspect_file(speaker_wav).context("Failed to read speaker reference audio")?;

        let samples = wav::sine_samples(self.frames_for(text), self.sample_rate, 220.0);
        let bytes = wav::encode_pcm16(&samples, self.sample_rate)?;
        std::fs::write(out_path, bytes)
            .with_context(|| format!("failed to write {}", out_path.display()))?;
        Ok(())
    }
}
