use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_CANVAS_BASE_URL: &str = "https://canvas.instructure.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";

/// Which `DataProvider` backs the API. Chosen once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    Live,
    Sample,
}

impl ProviderKind {
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "live" | "canvas" => Ok(ProviderKind::Live),
            "sample" | "fixed" => Ok(ProviderKind::Sample),
            other => Err(AppError::Config(format!(
                "DATA_PROVIDER must be 'live' or 'sample', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CanvasConfig {
    /// Host root, e.g. `https://canvas.instructure.com`. The REST prefix is added by the client.
    pub base_url: String,
    /// Token used when the request carries none and no session is stored.
    pub default_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl CanvasConfig {
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn oauth_token_url(&self) -> String {
        format!("{}/login/oauth2/token", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub provider: ProviderKind,
    pub canvas: CanvasConfig,
    /// `None` disables completion; summaries then fall back to the placeholder.
    pub gemini: Option<GeminiConfig>,
    pub summary_timeout: Duration,
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("BIND_ADDR is invalid: {}", e)))?;

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://canvas_assistant.db?mode=rwc".to_string());

        let provider = match env::var("DATA_PROVIDER") {
            Ok(value) => ProviderKind::parse(&value)?,
            Err(_) => ProviderKind::Live,
        };

        let canvas = CanvasConfig {
            base_url: env::var("CANVAS_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_CANVAS_BASE_URL.to_string()),
            default_token: non_empty_var("CANVAS_API_TOKEN"),
            client_id: non_empty_var("CANVAS_CLIENT_ID"),
            client_secret: non_empty_var("CANVAS_CLIENT_SECRET"),
        };

        let gemini = non_empty_var("GEMINI_API_KEY").map(|api_key| GeminiConfig {
            api_key,
            model: env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
        });

        let summary_timeout_secs = match env::var("SUMMARY_TIMEOUT_SECS") {
            Ok(value) => value
                .parse::<u64>()
                .map_err(|_| AppError::Config("SUMMARY_TIMEOUT_SECS must be an integer".to_string()))?,
            Err(_) => 30,
        };

        Ok(Self {
            bind_addr,
            database_url,
            provider,
            canvas,
            gemini,
            summary_timeout: Duration::from_secs(summary_timeout_secs),
        })
    }

    /// Config for tests and the sample provider: no network credentials.
    pub fn sample() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            database_url: "sqlite::memory:".to_string(),
            provider: ProviderKind::Sample,
            canvas: CanvasConfig {
                base_url: DEFAULT_CANVAS_BASE_URL.to_string(),
                default_token: None,
                client_id: None,
                client_secret: None,
            },
            gemini: None,
            summary_timeout: Duration::from_secs(30),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
