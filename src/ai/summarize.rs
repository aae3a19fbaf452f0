use super::{Completer, CompletionRequest};
use crate::error::AppError;

pub const NO_DESCRIPTION: &str = "No description available";
pub const SUMMARY_UNAVAILABLE: &str = "Summary unavailable";

/// Descriptions shorter than this are returned as-is.
const MIN_SUMMARIZE_CHARS: usize = 100;
const SUMMARY_MAX_TOKENS: u32 = 512;
const SUMMARY_TEMPERATURE: f32 = 0.3;

/// Canvas descriptions are HTML; the model only needs the text.
pub fn strip_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    let decoded = out
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub async fn summarize_content(completer: &dyn Completer, content: &str) -> Result<String, AppError> {
    let text = strip_html(content);
    if text.chars().count() < MIN_SUMMARIZE_CHARS {
        return Ok(text);
    }

    let request = CompletionRequest {
        prompt: format!(
            "Summarize the following assignment description concisely, highlighting key requirements and deadlines:\n\n{}",
            text
        ),
        max_tokens: SUMMARY_MAX_TOKENS,
        temperature: SUMMARY_TEMPERATURE,
    };
    let summary = completer.complete(&request).await?;
    Ok(summary.trim().to_string())
}
