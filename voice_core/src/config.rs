// Model configuration, read once at process start

use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "tts_models/multilingual/multi-dataset/xtts_v2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Coqui `tts` command-line program.
    Coqui,
    /// In-process sine tone generator for smoke runs and tests.
    Tone,
}

impl BackendKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "coqui" | "xtts" => Some(Self::Coqui),
            "tone" | "mock" => Some(Self::Tone),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DevicePreference {
    #[default]
    Auto,
    Cpu,
    Cuda,
}

impl DevicePreference {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "cpu" => Self::Cpu,
            "cuda" | "gpu" | "nvidia" => Self::Cuda,
            _ => Self::Auto,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub backend: BackendKind,
    pub model_name: String,
    pub tts_program: PathBuf,
    pub device: DevicePreference,
    pub scratch_dir: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Coqui,
            model_name: DEFAULT_MODEL.to_string(),
            tts_program: PathBuf::from("tts"),
            device: DevicePreference::Auto,
            scratch_dir: std::env::temp_dir(),
        }
    }
}

impl ModelConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let backend = lookup("XTTS_BACKEND")
            .and_then(|v| BackendKind::parse(&v))
            .unwrap_or(defaults.backend);

        let model_name = lookup("XTTS_MODEL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.model_name);

        let tts_program = lookup("XTTS_TTS_BIN")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.tts_program);

        let device = lookup("XTTS_DEVICE")
            .map(|v| DevicePreference::parse(&v))
            .unwrap_or(defaults.device);

        let scratch_dir = lookup("XTTS_SCRATCH_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.scratch_dir);

        Self {
            backend,
            model_name,
            tts_program,
            device,
            scratch_dir,
        }
    }

    /// Short model name for responses, e.g. `xtts_v2`.
    pub fn short_model_name(&self) -> String {
        match self.backend {
            BackendKind::Tone => "tone".to_string(),
            BackendKind::Coqui => self
                .model_name
                .rsplit('/')
                .next()
                .unwrap_or(&self.model_name)
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ModelConfig::from_lookup(lookup(&[]));
        assert_eq!(config.backend, BackendKind::Coqui);
        assert_eq!(config.model_name, DEFAULT_MODEL);
        assert_eq!(config.device, DevicePreference::Auto);
        assert_eq!(config.short_model_name(), "xtts_v2");
    }

    #[test]
    fn test_overrides() {
        let config = ModelConfig::from_lookup(lookup(&[
            ("XTTS_BACKEND", "tone"),
            ("XTTS_DEVICE", "GPU"),
            ("XTTS_SCRATCH_DIR", "/var/tmp/xtts"),
        ]));
        assert_eq!(config.backend, BackendKind::Tone);
        assert_eq!(config.device, DevicePreference::Cuda);
        assert_eq!(config.scratch_dir, PathBuf::from("/var/tmp/xtts"));
        assert_eq!(config.short_model_name(), "tone");
    }

    #[test]
    fn test_unknown_backend_falls_back() {
        let config = ModelConfig::from_lookup(lookup(&[("XTTS_BACKEND", "piper")]));
        assert_eq!(config.backend, BackendKind::Coqui);
    }
}
