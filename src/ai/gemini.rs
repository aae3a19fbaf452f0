use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{Completer, CompletionRequest};
use crate::config::GeminiConfig;
use crate::error::AppError;

const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiCompleter {
    client: Client,
    config: GeminiConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GeminiCompleter {
    pub fn new(config: GeminiConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }
}

fn first_text(response: GenerateResponse) -> Option<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .map(|p| p.text)
        .collect();
    if text.trim().is_empty() { None } else { Some(text) }
}

#[async_trait]
impl Completer for GeminiCompleter {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AppError> {
        let url = format!("{}/models/{}:generateContent", GEMINI_API_BASE_URL, self.config.model);

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: request.prompt.clone() }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        };

        let response = self.client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            // Model auth failures are ours, not the student's.
            return Err(AppError::Upstream {
                status: reqwest::StatusCode::BAD_GATEWAY.as_u16(),
                message: format!("Gemini API error {}: {}", status, body),
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        first_text(parsed).ok_or_else(|| AppError::Upstream {
            status: reqwest::StatusCode::BAD_GATEWAY.as_u16(),
            message: "Gemini returned no text".to_string(),
        })
    }
}
