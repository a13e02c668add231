//! Coqui XTTS through the `tts` command-line program.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::Context;
use tracing::{debug, info};

use crate::model::{Device, SpeechSynthesizer};

/// Accepts the Coqui model license so the program never stops at the
/// interactive prompt, which would hang a non-interactive process.
const LICENSE_ENV: (&str, &str) = ("COQUI_TOS_AGREED", "1");

#[derive(Debug, Clone)]
pub struct CoquiCli {
    program: PathBuf,
    model_name: String,
    device: Device,
}

impl CoquiCli {
    pub fn new(program: PathBuf, model_name: String, device: Device) -> Self {
        Self {
            program,
            model_name,
            device,
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.env(LICENSE_ENV.0, LICENSE_ENV.1)
            .arg("--model_name")
            .arg(&self.model_name);
        if self.device == Device::Cuda {
            cmd.arg("--use_cuda").arg("true");
        }
        cmd
    }

    fn run(&self, mut cmd: Command) -> anyhow::Result<Output> {
        debug!("Running {:?}", cmd);
        let output = cmd
            .output()
            .with_context(|| format!("failed to start {}", self.program.display()))?;
        if !output.status.success() {
            anyhow::bail!(
                "{}",
                last_error_line(&output.stderr)
                    .unwrap_or_else(|| format!("{} exited with {}", self.program.display(), output.status))
            );
        }
        Ok(output)
    }
}

impl SpeechSynthesizer for CoquiCli {
    fn load(&mut self) -> anyhow::Result<()> {
        info!("Downloading model (this may take 2-5 minutes on first run)...");
        let mut cmd = self.command();
        cmd.arg("--list_language_idxs");
        let output = self.run(cmd)?;
        let listing = String::from_utf8_lossy(&output.stdout);
        if let Some(langs) = listing.lines().rev().find(|l| !l.trim().is_empty()) {
            info!("Supported languages: {}", langs.trim());
        }
        Ok(())
    }

    fn synthesize_to_file(
        &self,
        text: &str,
        speaker_wav: &Path,
        language: &str,
        out_path: &Path,
    ) -> anyhow::Result<()> {
        let mut cmd = self.command();
        cmd.arg("--text")
            .arg(text)
            .arg("--speaker_wav")
            .arg(speaker_wav)
            .arg("--language_idx")
            .arg(language)
            .arg("--out_path")
            .arg(out_path);
        self.run(cmd).map(|_| ())
    }
}

/// The last non-empty stderr line. Python tracebacks end with the exception
/// message, which is what callers want to see.
fn last_error_line(stderr: &[u8]) -> Option<String> {
    String::from_utf8_lossy(stderr)
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_owned)
}
