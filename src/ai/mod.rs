pub mod gemini;
pub mod summarize;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::AppError;

pub use gemini::GeminiCompleter;
pub use summarize::{NO_DESCRIPTION, SUMMARY_UNAVAILABLE, summarize_content};

pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub prompt: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AppError>;
}

/// Used when no model credentials are configured. Every call fails, so
/// summaries fall back to the placeholder.
pub struct DisabledCompleter;

#[async_trait]
impl Completer for DisabledCompleter {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, AppError> {
        Err(AppError::Config("GEMINI_API_KEY is not set".to_string()))
    }
}

pub fn from_config(config: &AppConfig) -> Result<Arc<dyn Completer>, AppError> {
    let completer: Arc<dyn Completer> = match &config.gemini {
        Some(gemini) => Arc::new(GeminiCompleter::new(gemini.clone())?),
        None => {
            tracing::warn!("GEMINI_API_KEY is not set; completions are disabled");
            Arc::new(DisabledCompleter)
        }
    };
    Ok(completer)
}
