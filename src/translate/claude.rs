//! Claude-based translation using the Anthropic messages API.

use crate::error::{Result, VidsubError};
use crate::translate::Translator;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Marker used to join batch entries in the prompt and split them back out of
/// the response. Chosen to be unlikely in subtitle text.
const SEPARATOR: &str = "---SEPARATOR---";

/// Translator backed by the Claude messages API.
pub struct ClaudeTranslator {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    base_url: String,
}

impl ClaudeTranslator {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: "claude-3-haiku-20240307".to_string(),
            max_tokens: 4096,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Set a different model (e.g. "claude-3-5-sonnet-latest").
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Point the client at a different endpoint. Used by tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_prompt(&self, texts: &[&str], target_language: &str) -> String {
        let joined = texts.join(&format!("\n{SEPARATOR}\n"));
        format!(
            r#"Translate the following subtitle entries to {target_language}.

INSTRUCTIONS:
1. Translate each entry separately
2. Return exactly the same number of entries as the input
3. Keep translations natural and readable
4. Separate each translation with {SEPARATOR}
5. Do not add explanations or extra text

Entries to translate:
{joined}"#
        )
    }

    /// Token cap scaled to batch size, clamped to the configured maximum.
    fn response_budget(&self, batch_len: usize) -> u32 {
        self.max_tokens.min(2000 + batch_len as u32 * 30)
    }
}

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize, Debug)]
struct MessagesResponse {
    content: Option<Vec<ContentBlock>>,
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize, Debug)]
struct ContentBlock {
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorBody {
    message: String,
}

#[async_trait]
impl Translator for ClaudeTranslator {
    async fn translate_batch(&self, texts: &[&str], target_language: &str) -> Result<Vec<String>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        debug!(
            "Translating {} entr(ies) to {} with {}",
            texts.len(),
            target_language,
            self.model
        );

        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.response_budget(texts.len()),
            temperature: 0.1,
            messages: vec![Message {
                role: "user",
                content: self.build_prompt(texts, target_language),
            }],
        };

        let url = format!("{}/v1/messages", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| VidsubError::Api(format!("Translation request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| VidsubError::Api(format!("Failed to read response: {e}")))?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(VidsubError::Auth(format!(
                "Provider rejected credentials ({status}): {body}"
            )));
        }
        if !status.is_success() {
            // 429 and 5xx land here; the adapter treats Api errors as
            // transient and retries them.
            return Err(VidsubError::Api(format!(
                "Translation API error ({status}): {body}"
            )));
        }

        let parsed: MessagesResponse = serde_json::from_str(&body)
            .map_err(|e| VidsubError::Api(format!("Unexpected response shape: {e}")))?;

        if let Some(error) = parsed.error {
            return Err(VidsubError::Api(format!("Provider error: {}", error.message)));
        }

        let text = parsed
            .content
            .and_then(|blocks| blocks.into_iter().next())
            .and_then(|block| block.text)
            .ok_or_else(|| VidsubError::Api("Response carried no text content".to_string()))?;

        let translations: Vec<String> = text
            .split(SEPARATOR)
            .map(|t| t.trim().to_string())
            .collect();

        if translations.len() != texts.len() {
            return Err(VidsubError::Api(format!(
                "Response entry count mismatch: expected {}, got {}",
                texts.len(),
                translations.len()
            )));
        }

        Ok(translations)
    }

    fn name(&self) -> &'static str {
        "claude"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translator_creation() {
        let translator = ClaudeTranslator::new("sk-ant-test".to_string());
        assert_eq!(translator.name(), "claude");
        assert_eq!(translator.model, "claude-3-haiku-20240307");
    }

    #[test]
    fn test_with_model() {
        let translator =
            ClaudeTranslator::new("sk-ant-test".to_string()).with_model("claude-3-5-sonnet-latest");
        assert_eq!(translator.model, "claude-3-5-sonnet-latest");
    }

    #[test]
    fn test_build_prompt_contains_entries_and_language() {
        let translator = ClaudeTranslator::new("sk-ant-test".to_string());
        let prompt = translator.build_prompt(&["Hello", "World"], "Vietnamese");
        assert!(prompt.contains("Vietnamese"));
        assert!(prompt.contains("Hello"));
        assert!(prompt.contains(SEPARATOR));
    }

    #[test]
    fn test_response_budget_scales_and_clamps() {
        let translator = ClaudeTranslator::new("sk-ant-test".to_string()).with_max_tokens(2500);
        assert_eq!(translator.response_budget(1), 2030);
        assert_eq!(translator.response_budget(100), 2500);
    }
}
