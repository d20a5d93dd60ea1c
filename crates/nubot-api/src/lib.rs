//! HTTP service boundary for NuBot.
//!
//! Exposes the pipeline behind a single endpoint: `POST /query` with a
//! JSON body `{"query": string}` returns `200 {"answer": string}` on
//! success and `500 {"error": string}` on pipeline failure. No partial
//! or degraded answer is ever returned for a failed invocation.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use nubot_core::Result;
use nubot_pipeline::RagPipeline;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Request body for the query endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryRequest {
    /// The free-text question.
    pub query: String,
}

/// Success envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// The pipeline's answer.
    pub answer: String,
}

/// Error envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stringified failure description.
    pub error: String,
}

/// Failure response mapped to HTTP 500.
#[derive(Debug)]
pub struct ApiError(nubot_core::Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "query failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

/// Build the service router.
pub fn router(pipeline: Arc<RagPipeline>) -> Router {
    Router::new()
        .route("/query", post(answer_query))
        .with_state(pipeline)
}

/// `POST /query` handler.
async fn answer_query(
    State(pipeline): State<Arc<RagPipeline>>,
    Json(request): Json<QueryRequest>,
) -> std::result::Result<Json<QueryResponse>, ApiError> {
    let answer = pipeline.answer(&request.query).await.map_err(ApiError)?;
    Ok(Json(QueryResponse { answer }))
}

/// Bind and run the service until the process is stopped.
pub async fn serve(pipeline: Arc<RagPipeline>, host: &str, port: u16) -> Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "query service listening");

    axum::serve(listener, router(pipeline)).await?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nubot_core::NubotConfig;
    use nubot_core::llm::MockLlmProvider;
    use nubot_core::prompt::PromptTemplate;
    use nubot_index::{MockEmbeddingProvider, RetrievedDocument, SearchBackend};
    use nubot_pipeline::PipelineResources;
    use nubot_tracking::RecordingTracker;

    struct StubBackend {
        documents: Vec<RetrievedDocument>,
    }

    #[async_trait]
    impl SearchBackend for StubBackend {
        async fn search(&self, _query: &str) -> Result<Vec<RetrievedDocument>> {
            Ok(self.documents.clone())
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl SearchBackend for FailingBackend {
        async fn search(&self, _query: &str) -> Result<Vec<RetrievedDocument>> {
            Err(nubot_core::Error::search("index backend offline"))
        }
    }

    fn test_pipeline(backend: Arc<dyn SearchBackend>, reply: &str) -> Arc<RagPipeline> {
        let resources = PipelineResources::new(NubotConfig::default())
            .with_llm(Arc::new(MockLlmProvider::with_response(reply)))
            .with_prompt(Arc::new(PromptTemplate::rag_default()))
            .with_embeddings(Arc::new(MockEmbeddingProvider::new(16)));

        Arc::new(RagPipeline::new(
            backend,
            Arc::new(RecordingTracker::new()),
            Arc::new(resources),
        ))
    }

    #[tokio::test]
    async fn test_answer_query_success() {
        let backend = Arc::new(StubBackend {
            documents: vec![RetrievedDocument::new("Khoury is a college.")],
        });
        let pipeline = test_pipeline(backend, "It is a college.");

        let response = answer_query(
            State(pipeline),
            Json(QueryRequest {
                query: "What is Khoury?".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.0.answer, "It is a college.");
    }

    #[tokio::test]
    async fn test_answer_query_failure_maps_to_500() {
        let pipeline = test_pipeline(Arc::new(FailingBackend), "unused");

        let err = answer_query(
            State(pipeline),
            Json(QueryRequest {
                query: "x".to_string(),
            }),
        )
        .await
        .err()
        .unwrap();

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_request_envelope_shape() {
        let request: QueryRequest =
            serde_json::from_str(r#"{"query": "What is Khoury?"}"#).unwrap();
        assert_eq!(request.query, "What is Khoury?");
    }

    #[test]
    fn test_response_envelope_shape() {
        let json = serde_json::to_string(&QueryResponse {
            answer: "hello".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"answer":"hello"}"#);

        let json = serde_json::to_string(&ErrorResponse {
            error: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"error":"boom"}"#);
    }

    #[test]
    fn test_router_builds() {
        let backend = Arc::new(StubBackend { documents: vec![] });
        let _router = router(test_pipeline(backend, "ok"));
    }
}
