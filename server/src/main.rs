use std::{net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

use server::config::ServerConfig;
use server::state::{AppState, Readiness};
use voice_core::VoiceCloner;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    server::init_tracing();

    let _ = dotenv::dotenv();

    async_main().await
}

async fn async_main() -> anyhow::Result<()> {
    info!("Starting XTTS server...");

    let config = ServerConfig::from_env();
    info!(
        "Server configuration loaded: port={}, backend={:?}, request_timeout={}s",
        config.port, config.model.backend, config.request_timeout.as_secs()
    );

    let (readiness_tx, readiness_rx) = watch::channel(Readiness::Starting);
    let state = AppState::new(config.clone(), readiness_rx);
    let app = server::build_router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        anyhow::anyhow!("Failed to bind {addr}: {e}. Try a different PORT.")
    })?;

    info!("Server listening on http://{addr}");
    info!("   Endpoints available:");
    info!("   - GET  /           (server info)");
    info!("   - GET  /health     (health check)");
    info!("   - GET  /test       (simple test)");
    info!("   - POST /v1/audio/speech (generate TTS)");

    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    });

    // The listener is already answering /health with 503 while this runs.
    readiness_tx.send_replace(Readiness::Loading);
    let model_config = config.model.clone();
    let loading = tokio::task::spawn_blocking(move || VoiceCloner::load(&model_config));

    tokio::select! {
        loaded = loading => match loaded? {
            Ok(cloner) => {
                readiness_tx.send_replace(Readiness::Ready(Arc::new(cloner)));
                info!("Ready to serve requests!");
            }
            Err(e) => {
                error!("FATAL: {e}");
                readiness_tx.send_replace(Readiness::Failed(e.to_string()));
                server.abort();
                return Err(e.into());
            }
        },
        served = &mut server => {
            served??;
            info!("Server stopped before the model finished loading");
            return Ok(());
        }
    }

    server.await??;
    info!("Server stopped");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
