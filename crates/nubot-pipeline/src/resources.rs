//! Process-wide pipeline resources.
//!
//! The generation model handle, the prompt template, and the embedding
//! provider are expensive to construct (network, model downloads), so
//! each lives in a guarded lazy cell: constructed at most once per
//! process, identical handle on every later access, construction failure
//! not cached. Stages receive this object explicitly instead of reaching
//! for ambient globals, so tests can preseed any handle.

use std::sync::Arc;

use nubot_core::cache::CachedResource;
use nubot_core::llm::{LlmProvider, MistralProvider, RetryWrapper};
use nubot_core::{Error, NubotConfig, PromptTemplate, Result};
use nubot_index::{EmbeddingProvider, MockEmbeddingProvider};

/// Embedding dimension of the mock provider, matching the index fixtures.
const MOCK_EMBEDDING_DIMENSION: usize = 384;

/// Lazily-constructed shared handles for one pipeline configuration.
pub struct PipelineResources {
    config: NubotConfig,
    llm: CachedResource<dyn LlmProvider>,
    prompt: CachedResource<PromptTemplate>,
    embeddings: CachedResource<dyn EmbeddingProvider>,
}

impl PipelineResources {
    /// Create resources whose handles are built from `config` on first use.
    pub fn new(config: NubotConfig) -> Self {
        Self {
            config,
            llm: CachedResource::new(),
            prompt: CachedResource::new(),
            embeddings: CachedResource::new(),
        }
    }

    /// Preseed the generation model handle.
    pub fn with_llm(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.llm = CachedResource::preset(provider);
        self
    }

    /// Preseed the prompt template.
    pub fn with_prompt(mut self, prompt: Arc<PromptTemplate>) -> Self {
        self.prompt = CachedResource::preset(prompt);
        self
    }

    /// Preseed the embedding provider.
    pub fn with_embeddings(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embeddings = CachedResource::preset(provider);
        self
    }

    /// The configuration these resources were built from.
    pub fn config(&self) -> &NubotConfig {
        &self.config
    }

    /// The model identifier logged with every generation.
    pub fn model_name(&self) -> &str {
        &self.config.llm.model
    }

    /// The generation model handle, constructed on first access.
    ///
    /// Requires `llm.api_key`; the provider is wrapped with exponential
    /// backoff retry for transient backend failures.
    pub async fn llm(&self) -> Result<Arc<dyn LlmProvider>> {
        self.llm
            .get_or_try_init(|| async {
                let api_key = self
                    .config
                    .llm
                    .api_key
                    .as_deref()
                    .ok_or_else(|| Error::config("llm.api_key is not configured"))?;

                let provider = MistralProvider::new(api_key, &self.config.llm.model);
                Ok(Arc::new(RetryWrapper::new(Arc::new(provider))) as Arc<dyn LlmProvider>)
            })
            .await
    }

    /// The prompt template, constructed on first access.
    pub async fn prompt(&self) -> Result<Arc<PromptTemplate>> {
        self.prompt
            .get_or_try_init(|| async { Ok(Arc::new(PromptTemplate::rag_default())) })
            .await
    }

    /// The embedding provider, constructed on first access.
    ///
    /// Selected by `index.provider`: `"mock"` is always available;
    /// `"fastembed"` requires the `index-fastembed` feature.
    pub async fn embeddings(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        self.embeddings
            .get_or_try_init(|| async {
                match self.config.index.provider.as_str() {
                    "mock" => Ok(Arc::new(MockEmbeddingProvider::new(MOCK_EMBEDDING_DIMENSION))
                        as Arc<dyn EmbeddingProvider>),

                    #[cfg(feature = "index-fastembed")]
                    "fastembed" => {
                        let model = self.config.index.model.clone();
                        let cache = self.config.index.cache_path.clone();
                        // Model init downloads files and is CPU-bound
                        let provider = tokio::task::spawn_blocking(move || {
                            nubot_index::FastEmbedProvider::new(&model, cache.as_deref())
                        })
                        .await
                        .map_err(|e| Error::search(format!("embedding init task failed: {e}")))??;
                        Ok(Arc::new(provider) as Arc<dyn EmbeddingProvider>)
                    }

                    #[cfg(not(feature = "index-fastembed"))]
                    "fastembed" => Err(Error::config(
                        "index.provider 'fastembed' requires the index-fastembed feature",
                    )),

                    other => Err(Error::config(format!(
                        "unknown embedding provider '{other}'; expected 'fastembed' or 'mock'"
                    ))),
                }
            })
            .await
    }
}

impl std::fmt::Debug for PipelineResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineResources")
            .field("model", &self.config.llm.model)
            .field("embedding_provider", &self.config.index.provider)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
