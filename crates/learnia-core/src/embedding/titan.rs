//! AWS Bedrock Titan text-embedding client.
//!
//! Wraps `InvokeModel` with bounded timeouts, an outer retry loop with
//! exponential backoff and jitter on transport failures, and a per-process
//! LRU cache keyed by exact query text. Embeddings for a given text never
//! change, so cached entries are never stale.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_bedrockruntime::error::DisplayErrorContext;
use aws_sdk_bedrockruntime::primitives::Blob;
use aws_smithy_types::timeout::TimeoutConfig;
use lru::LruCache;
use rand::Rng;
use serde::Deserialize;

use crate::config::EmbeddingConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::{Error, Result};

const MAX_ATTEMPTS: u32 = 4;

pub struct TitanEmbedding {
    client: aws_sdk_bedrockruntime::Client,
    model_id: String,
    dimensions: usize,
    cache: Mutex<LruCache<String, Vec<f32>>>,
}

#[derive(Deserialize)]
struct TitanResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

impl TitanEmbedding {
    pub async fn new(config: EmbeddingConfig) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .retry_config(RetryConfig::standard().with_max_attempts(3))
            .timeout_config(
                TimeoutConfig::builder()
                    .connect_timeout(Duration::from_secs(5))
                    .read_timeout(Duration::from_secs(25))
                    .build(),
            )
            .load()
            .await;

        let capacity = NonZeroUsize::new(config.cache_capacity).unwrap_or(NonZeroUsize::MIN);

        Self {
            client: aws_sdk_bedrockruntime::Client::new(&shared),
            model_id: config.model_id,
            dimensions: config.dimensions,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    async fn invoke_with_retry(&self, text: &str) -> Result<Vec<f32>> {
        let payload = serde_json::json!({ "inputText": text }).to_string();
        let mut last_error = Error::Embedding("bedrock request failed".to_string());

        for attempt in 0..MAX_ATTEMPTS {
            let sent = self
                .client
                .invoke_model()
                .model_id(&self.model_id)
                .content_type("application/json")
                .accept("application/json")
                .body(Blob::new(payload.clone()))
                .send()
                .await;

            match sent {
                // Response-shape failures are not transient; fail immediately.
                Ok(output) => return parse_embedding(output.body().as_ref(), self.dimensions),
                Err(e) => {
                    let detail = DisplayErrorContext(&e).to_string();
                    let delay = backoff_delay(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        error = %detail,
                        delay_s = delay.as_secs_f64(),
                        "bedrock request failed, backing off"
                    );
                    last_error = Error::Embedding(detail);
                    tokio::time::sleep(delay).await;
                }
            }
        }
        Err(last_error)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TitanEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        {
            let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(hit) = cache.get(text) {
                return Ok(hit.clone());
            }
        }

        let vector = self.invoke_with_retry(text).await?;

        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .put(text.to_string(), vector.clone());
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Exponential backoff (2^attempt seconds) scaled by jitter in [0.75, 1.25].
fn backoff_delay(attempt: u32) -> Duration {
    let jitter = rand::thread_rng().gen_range(0.75..=1.25);
    Duration::from_secs_f64(f64::from(1u32 << attempt) * jitter)
}

fn parse_embedding(bytes: &[u8], expected_dim: usize) -> Result<Vec<f32>> {
    let response: TitanResponse = serde_json::from_slice(bytes)
        .map_err(|e| Error::Embedding(format!("malformed bedrock response: {e}")))?;
    normalize(response.embedding, expected_dim)
}

/// Validate and L2-normalize a raw embedding vector.
fn normalize(embedding: Vec<f32>, expected_dim: usize) -> Result<Vec<f32>> {
    if embedding.is_empty() {
        return Err(Error::Embedding(
            "bedrock response missing 'embedding' field".to_string(),
        ));
    }
    if embedding.len() != expected_dim {
        return Err(Error::Embedding(format!(
            "unexpected embedding dimension: {} (expected {expected_dim})",
            embedding.len()
        )));
    }
    let norm = embedding
        .iter()
        .map(|v| f64::from(*v).powi(2))
        .sum::<f64>()
        .sqrt();
    if norm == 0.0 {
        return Err(Error::Embedding("embedding norm is zero".to_string()));
    }
    Ok(embedding
        .into_iter()
        .map(|v| (f64::from(v) / norm) as f32)
        .collect())
}
