//! The synthesis capability and the process-wide handle that owns it.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::process::Command;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::backend::{CoquiCli, ToneSynthesizer};
use crate::config::{BackendKind, DevicePreference, ModelConfig};
use crate::error::SynthesisError;

/// A voice-cloning speech model.
///
/// Implementations write a WAV file to `out_path` spoken in the voice of the
/// WAV at `speaker_wav`. Errors carry the model's own message.
pub trait SpeechSynthesizer: Send {
    /// One-time warm-up (download, weights, device placement). Called once
    /// before the first request.
    fn load(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn synthesize_to_file(
        &self,
        text: &str,
        speaker_wav: &Path,
        language: &str,
        out_path: &Path,
    ) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cuda,
    Cpu,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Cuda => "cuda",
            Device::Cpu => "cpu",
        }
    }

    pub fn select(preference: DevicePreference) -> Self {
        match preference {
            DevicePreference::Cpu => Device::Cpu,
            DevicePreference::Cuda => Device::Cuda,
            DevicePreference::Auto => {
                if nvidia_gpu_present() {
                    Device::Cuda
                } else {
                    Device::Cpu
                }
            }
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn nvidia_gpu_present() -> bool {
    match Command::new("nvidia-smi").arg("-L").output() {
        Ok(out) if out.status.success() => {
            let listing = String::from_utf8_lossy(&out.stdout);
            for gpu in listing.lines().filter(|l| l.starts_with("GPU")) {
                info!("   {}", gpu.trim());
            }
            listing.lines().any(|l| l.starts_with("GPU"))
        }
        Ok(_) => false,
        Err(e) => {
            warn!("nvidia-smi not available ({e}), assuming no GPU");
            false
        }
    }
}

/// The loaded model plus its compute device, created once per process.
///
/// Calls into the model are serialized: the underlying runtimes are not
/// known to be reentrant.
pub struct ModelHandle {
    synth: Mutex<Box<dyn SpeechSynthesizer>>,
    device: Device,
    model_name: String,
    load_time: Duration,
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("synth", &"<SpeechSynthesizer>")
            .field("device", &self.device)
            .field("model_name", &self.model_name)
            .field("load_time", &self.load_time)
            .finish()
    }
}

impl ModelHandle {
    /// Wrap an already loaded synthesizer.
    pub fn new(
        synth: Box<dyn SpeechSynthesizer>,
        device: Device,
        model_name: impl Into<String>,
        load_time: Duration,
    ) -> Self {
        Self {
            synth: Mutex::new(synth),
            device,
            model_name: model_name.into(),
            load_time,
        }
    }

    /// Select the device, build the configured backend and warm it up.
    /// Blocks for as long as the model takes to load.
    pub fn load(config: &ModelConfig) -> Result<Self, SynthesisError> {
        info!("Loading {} model...", config.model_name);
        let start = Instant::now();

        let device = Device::select(config.device);
        info!("Using device: {device}");

        let mut synth: Box<dyn SpeechSynthesizer> = match config.backend {
            BackendKind::Coqui => Box::new(CoquiCli::new(
                config.tts_program.clone(),
                config.model_name.clone(),
                device,
            )),
            BackendKind::Tone => Box::new(ToneSynthesizer::default()),
        };
        synth
            .load()
            .map_err(|e| SynthesisError::ModelLoadFailure(format!("{e:#}")))?;

        let load_time = start.elapsed();
        info!("Model loaded successfully in {:.2}s", load_time.as_secs_f64());

        Ok(Self::new(synth, device, config.short_model_name(), load_time))
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn load_time(&self) -> Duration {
        self.load_time
    }

    /// Run one synthesis. Any model error becomes `SynthesisFailure` with the
    /// model's message unchanged; a panicking backend is reported the same way.
    pub fn synthesize_to_file(
        &self,
        text: &str,
        speaker_wav: &Path,
        language: &str,
        out_path: &Path,
    ) -> Result<(), SynthesisError> {
        // The synthesizer keeps no state a panic could leave half-updated.
        let synth = self.synth.lock().unwrap_or_else(PoisonError::into_inner);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            synth.synthesize_to_file(text, speaker_wav, language, out_path)
        }));
        match outcome {
            Ok(result) => result.map_err(|e| SynthesisError::SynthesisFailure(format!("{e:#}"))),
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                warn!("Synthesizer panicked: {msg}");
                Err(SynthesisError::SynthesisFailure(format!("Synthesizer panicked: {msg}")))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_strings() {
        assert_eq!(Device::Cuda.as_str(), "cuda");
        assert_eq!(Device::Cpu.to_string(), "cpu");
        assert_eq!(Device::select(DevicePreference::Cpu), Device::Cpu);
        assert_eq!(Device::select(DevicePreference::Cuda), Device::Cuda);
    }

    #[test]
    fn test_load_tone_backend() {
        let config = ModelConfig {
            backend: BackendKind::Tone,
            device: DevicePreference::Cpu,
            ..ModelConfig::default()
        };
        let handle = ModelHandle::load(&config).unwrap();
        assert_eq!(handle.device(), Device::Cpu);
        assert_eq!(handle.model_name(), "tone");
    }

    /// Panics on texts starting with "boom", writes nothing otherwise.
    struct Explosive;

    impl SpeechSynthesizer for Explosive {
        fn synthesize_to_file(&self, text: &str, _: &Path, _: &str, _: &Path) -> anyhow::Result<()> {
            if text.starts_with("boom") {
                panic!("kernel exploded on {text:?}");
            }
            Ok(())
        }
    }

    #[test]
    fn test_backend_panic_is_contained() {
        let handle = ModelHandle::new(Box::new(Explosive), Device::Cpu, "xtts_v2", Duration::ZERO);
        let path = Path::new("unused.wav");

        let err = handle.synthesize_to_file("boom", path, "en", path).unwrap_err();
        match err {
            SynthesisError::SynthesisFailure(msg) => {
                assert!(msg.starts_with("Synthesizer panicked"), "{msg}");
                assert!(msg.contains("kernel exploded"), "{msg}");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Later calls still reach the model
        handle.synthesize_to_file("hello", path, "en", path).unwrap();
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let handle = ModelHandle::new(Box::new(Explosive), Device::Cpu, "xtts_v2", Duration::ZERO);
        let _ = std::panic::catch_unwind(AssertUnwindSafe(|| {
            let _guard = handle.synth.lock().unwrap();
            panic!("poison the lock");
        }));
        assert!(handle.synth.is_poisoned());

        let path = Path::new("unused.wav");
        handle.synthesize_to_file("hello", path, "en", path).unwrap();
    }

    #[test]
    fn test_missing_coqui_program_fails_to_load() {
        let config = ModelConfig {
            tts_program: "/nonexistent/bin/tts".into(),
            device: DevicePreference::Cpu,
            ..ModelConfig::default()
        };
        let err = ModelHandle::load(&config).unwrap_err();
        assert!(matches!(err, SynthesisError::ModelLoadFailure(_)));
    }
}
