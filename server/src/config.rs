// Configuration constants for the server

use std::time::Duration;

use voice_core::ModelConfig;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub model: ModelConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            // first requests on CPU can take minutes
            request_timeout: Duration::from_secs(600),
            max_body_bytes: 50 * 1024 * 1024,
            cors_allowed_origins: None,
            model: ModelConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port);

        let request_timeout = std::env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let max_body_bytes = std::env::var("MAX_BODY_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_body_bytes);

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .ok()
            .map(|origins| parse_origins(&origins));

        Self {
            port,
            request_timeout,
            max_body_bytes,
            cors_allowed_origins,
            model: ModelConfig::from_env(),
        }
    }
}

fn parse_origins(origins: &str) -> Vec<String> {
    origins
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
