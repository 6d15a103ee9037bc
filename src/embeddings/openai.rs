//! OpenAI-compatible remote embedding provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::EmbeddingProvider;
use crate::config::{Credentials, DEFAULT_EMBEDDING_MODEL};
use crate::types::PipelineError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Calls an OpenAI-compatible `/v1/embeddings` endpoint.
///
/// Failed requests are retried at most `max_retries` times (one by default);
/// after that the failure propagates to the caller unmodified.
pub struct OpenAiEmbeddingProvider {
    client: Client,
    credentials: Credentials,
    model: String,
    base_url: String,
    max_retries: u32,
}

impl OpenAiEmbeddingProvider {
    pub fn new(credentials: Credentials) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .use_rustls_tls()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            credentials,
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: 1,
        })
    }

    /// Builds a provider with credentials sourced from the environment.
    pub fn from_env() -> Result<Self, PipelineError> {
        Self::new(Credentials::from_env())
    }

    /// Selects the embedding model identifier sent with each request.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Points the provider at a different OpenAI-compatible endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the automatic retry count.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn request(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: inputs,
        };

        let mut request = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .json(&body);
        if let Some(api_key) = &self.credentials.api_key {
            request = request.bearer_auth(api_key);
        }
        if let Some(organization) = &self.credentials.organization {
            request = request.header("OpenAI-Organization", organization);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(PipelineError::Embedding(format!("{status}: {detail}")));
        }

        let mut parsed: EmbeddingResponse = response.json().await?;
        if parsed.data.len() != inputs.len() {
            return Err(PipelineError::Embedding(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                parsed.data.len()
            )));
        }

        // The API may answer out of order; the index field restores it.
        parsed.data.sort_by_key(|item| item.index);
        Ok(parsed.data.into_iter().map(|item| item.embedding).collect())
    }

    async fn request_with_retry(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        let mut attempt = 0u32;
        loop {
            match self.request(inputs).await {
                Ok(vectors) => return Ok(vectors),
                Err(err) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(%err, attempt, "embedding request failed; retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
    index: usize,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed(&self, input: &str) -> Result<Vec<f32>, PipelineError> {
        let inputs = [input.to_string()];
        let mut vectors = self.request_with_retry(&inputs).await?;
        vectors
            .pop()
            .ok_or_else(|| PipelineError::Embedding("empty embedding response".to_string()))
    }

    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        self.request_with_retry(inputs).await
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
