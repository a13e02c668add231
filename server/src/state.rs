//! Shared application state and model readiness.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use tokio::sync::watch;
use voice_core::VoiceCloner;

use crate::config::ServerConfig;

/// Lifecycle of the model behind the server: `Starting -> Loading -> Ready`,
/// or `Loading -> Failed`, after which the process exits.
#[derive(Debug, Clone)]
pub enum Readiness {
    Starting,
    Loading,
    Ready(Arc<VoiceCloner>),
    Failed(String),
}

impl Readiness {
    pub fn label(&self) -> &'static str {
        match self {
            Readiness::Starting => "starting",
            Readiness::Loading => "loading",
            Readiness::Ready(_) => "ready",
            Readiness::Failed(_) => "failed",
        }
    }

    pub fn cloner(&self) -> Option<&Arc<VoiceCloner>> {
        match self {
            Readiness::Ready(cloner) => Some(cloner),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub readiness: watch::Receiver<Readiness>,
    pub request_count: Arc<AtomicU64>,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(config: ServerConfig, readiness: watch::Receiver<Readiness>) -> Self {
        Self {
            readiness,
            request_count: Arc::new(AtomicU64::new(0)),
            config,
        }
    }

    /// State that is ready from the start, for an already loaded model.
    pub fn ready(config: ServerConfig, cloner: Arc<VoiceCloner>) -> Self {
        let (_tx, rx) = watch::channel(Readiness::Ready(cloner));
        Self::new(config, rx)
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness.borrow().clone()
    }
}
