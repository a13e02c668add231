//! Serverless worker entry point.
//!
//! Loads the model once, then answers invocation events read from stdin.
//! Logs go to stderr; stdout carries only results.

use tracing::{error, info};
use voice_core::{ModelConfig, VoiceCloner};

fn main() -> anyhow::Result<()> {
    server::init_tracing();

    let _ = dotenv::dotenv();

    info!("Starting serverless worker...");
    let config = ModelConfig::from_env();
    let cloner = VoiceCloner::load(&config).map_err(|e| {
        error!("FATAL: {e}");
        e
    })?;

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let handled = server::worker::run(&cloner, stdin.lock(), stdout.lock())?;
    info!("Input closed after {handled} event(s)");
    Ok(())
}
