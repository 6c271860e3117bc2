pub mod titan;

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::Result;

#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Produce a unit-norm embedding vector for `text`.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
    fn dimensions(&self) -> usize;
}

/// Deterministic in-process provider for tests. Derives the vector from the
/// query bytes and counts invocations so tests can assert whether the
/// collaborator was reached.
pub struct StubEmbedding {
    dimensions: usize,
    calls: AtomicUsize,
}

impl StubEmbedding {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for StubEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let bytes = text.as_bytes();
        let mut vector: Vec<f32> = (0..self.dimensions)
            .map(|i| {
                let byte = bytes.get(i % bytes.len().max(1)).copied().unwrap_or(1);
                f32::from(byte) + 1.0
            })
            .collect();
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        for v in &mut vector {
            *v /= norm;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
