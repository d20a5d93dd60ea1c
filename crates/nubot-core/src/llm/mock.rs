//! Mock LLM provider for testing.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmProvider, TokenUsage,
};
use crate::error::{Error, Result};

/// Mock LLM provider that returns canned responses.
///
/// Useful for testing without making actual API calls. Responses are
/// returned in order and cycle back to the first once exhausted. Every
/// request is recorded and can be inspected afterwards.
#[derive(Clone)]
pub struct MockLlmProvider {
    state: Arc<Mutex<MockState>>,
}

struct MockState {
    canned: Vec<String>,
    index: usize,
    requests: Vec<CompletionRequest>,
    fail_with: Option<String>,
}

impl MockLlmProvider {
    /// Creates a new mock provider with canned responses.
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                canned: responses,
                index: 0,
                requests: Vec::new(),
                fail_with: None,
            })),
        }
    }

    /// Creates a mock provider with a single response.
    pub fn with_response(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }

    /// Creates a mock provider whose every completion fails.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                canned: Vec::new(),
                index: 0,
                requests: Vec::new(),
                fail_with: Some(message.into()),
            })),
        }
    }

    /// The requests this provider has received, in order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.state
            .lock()
            .map(|s| s.requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| Error::llm(format!("mock state poisoned: {e}")))?;

        state.requests.push(request);

        if let Some(message) = &state.fail_with {
            return Err(Error::llm(message.clone()));
        }

        if state.canned.is_empty() {
            return Err(Error::llm("mock provider has no canned responses"));
        }

        let content = state.canned[state.index].clone();
        state.index = (state.index + 1) % state.canned.len();

        Ok(CompletionResponse {
            content,
            tokens_used: TokenUsage {
                input: 10, // Mock values
                output: 20,
            },
            finish_reason: FinishReason::Stop,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::llm::Message;

    #[tokio::test]
    async fn test_mock_provider_single_response() {
        let provider = MockLlmProvider::with_response("Test response");

        let request = CompletionRequest::new(vec![Message::user("Hello")]);

        let response = provider.complete(request).await.unwrap();
        assert_eq!(response.content, "Test response");
    }

    #[tokio::test]
    async fn test_mock_provider_cycles_responses() {
        let provider = MockLlmProvider::new(vec!["First".to_string(), "Second".to_string()]);

        let request = CompletionRequest::new(vec![Message::user("Test")]);

        assert_eq!(
            provider.complete(request.clone()).await.unwrap().content,
            "First"
        );
        assert_eq!(
            provider.complete(request.clone()).await.unwrap().content,
            "Second"
        );
        // Cycles back
        assert_eq!(
            provider.complete(request).await.unwrap().content,
            "First"
        );
    }

    #[tokio::test]
    async fn test_mock_provider_records_requests() {
        let provider = MockLlmProvider::with_response("ok");

        let request = CompletionRequest::new(vec![Message::user("What is Khoury?")]);
        provider.complete(request).await.unwrap();

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages[0].content, "What is Khoury?");
    }

    #[tokio::test]
    async fn test_mock_provider_failing() {
        let provider = MockLlmProvider::failing("quota exceeded");

        let request = CompletionRequest::new(vec![Message::user("Test")]);
        let err = provider.complete(request).await.unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));

        // The failed request is still recorded
        assert_eq!(provider.requests().len(), 1);
    }
}
