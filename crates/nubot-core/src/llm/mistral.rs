//! Mistral API provider implementation.

use async_trait::async_trait;

use super::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmProvider, TokenUsage,
};
use crate::error::{Error, Result};

const MISTRAL_API_URL: &str = "https://api.mistral.ai/v1/chat/completions";

/// LLM provider using Mistral's chat completions API.
pub struct MistralProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl MistralProvider {
    /// Creates a new Mistral provider.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Mistral API key
    /// * `model` - Model ID (e.g., "mistral-large-latest")
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }

    /// The model ID requests are sent to.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmProvider for MistralProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let mut body = serde_json::json!({
            "model": self.model,
            "max_tokens": request.max_tokens,
            "messages": request.messages,
        });

        if let Some(temp) = request.temperature {
            body["temperature"] = serde_json::json!(temp);
        }

        let response = self
            .client
            .post(MISTRAL_API_URL)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::llm_with_source("Failed to call Mistral API", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::llm(format!(
                "Mistral API error {}: {}",
                status, error_text
            )));
        }

        let response_body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::llm_with_source("Failed to parse Mistral response", e))?;

        let choice = &response_body["choices"][0];

        let content = choice["message"]["content"]
            .as_str()
            .ok_or_else(|| Error::llm("Missing content in Mistral response"))?
            .to_string();

        let usage = response_body["usage"]
            .as_object()
            .ok_or_else(|| Error::llm("Missing usage data in Mistral response"))?;

        let input_tokens = usage["prompt_tokens"]
            .as_u64()
            .ok_or_else(|| Error::llm("Invalid prompt_tokens"))?;
        let output_tokens = usage["completion_tokens"]
            .as_u64()
            .ok_or_else(|| Error::llm("Invalid completion_tokens"))?;

        let finish_reason_str = choice["finish_reason"]
            .as_str()
            .ok_or_else(|| Error::llm("Missing finish_reason"))?;

        let finish_reason = match finish_reason_str {
            "stop" => FinishReason::Stop,
            "length" => FinishReason::Length,
            other => return Err(Error::llm(format!("Unknown finish reason: {}", other))),
        };

        Ok(CompletionResponse {
            content,
            tokens_used: TokenUsage {
                input: input_tokens,
                output: output_tokens,
            },
            finish_reason,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::llm::Message;

    #[test]
    fn test_mistral_provider_construction() {
        let provider = MistralProvider::new("test-key", "mistral-large-latest");
        assert_eq!(provider.api_key, "test-key");
        assert_eq!(provider.model(), "mistral-large-latest");
    }

    // Integration test (requires API key, run manually)
    #[tokio::test]
    #[ignore]
    #[allow(clippy::expect_used)]
    async fn test_mistral_provider_integration() {
        let api_key = std::env::var("MISTRAL_API_KEY")
            .expect("MISTRAL_API_KEY must be set for integration tests");

        let provider = MistralProvider::new(api_key, "mistral-large-latest");

        let request = CompletionRequest::new(vec![Message::user("Say hello")]).with_max_tokens(100);

        let response = provider.complete(request).await.unwrap();

        assert!(!response.content.is_empty());
        assert!(response.tokens_used.output > 0);
    }
}
