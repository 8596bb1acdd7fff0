//! Offline embedding provider based on feature hashing.
//!
//! [`HashingEmbeddingProvider`] maps lower-cased word unigrams and bigrams into a fixed number
//! of signed buckets and L2-normalises the result. It needs no network or model weights, is
//! fully deterministic, and gives lexical-overlap similarity that is good enough for a single
//! research run. It is also the provider used throughout the test suites.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;

use crate::embedding::{EmbeddingProvider, l2_normalize};
use crate::error::Result;

/// Weight of a bigram relative to a unigram.
const BIGRAM_WEIGHT: f32 = 0.5;

/// A deterministic bag-of-words embedding provider.
///
/// # Example
///
/// ```rust,ignore
/// use atlas_rag::HashingEmbeddingProvider;
///
/// let provider = HashingEmbeddingProvider::new(384);
/// let v = provider.embed("rust async runtimes").await?;
/// assert_eq!(v.len(), 384);
/// ```
#[derive(Debug, Clone)]
pub struct HashingEmbeddingProvider {
    dimensions: usize,
}

impl HashingEmbeddingProvider {
    /// Create a provider producing vectors of `dimensions` buckets (at least one).
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions: dimensions.max(1) }
    }

    fn bucket(&self, feature: &str) -> (usize, f32) {
        let mut hasher = DefaultHasher::new();
        feature.hash(&mut hasher);
        let hash = hasher.finish();
        let index = (hash % self.dimensions as u64) as usize;
        // The top bit picks the sign so colliding features tend to cancel rather than pile up.
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        (index, sign)
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let tokens: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .collect();

        for token in &tokens {
            let (index, sign) = self.bucket(token);
            vector[index] += sign;
        }
        for pair in tokens.windows(2) {
            let (index, sign) = self.bucket(&format!("{} {}", pair[0], pair[1]));
            vector[index] += sign * BIGRAM_WEIGHT;
        }

        l2_normalize(&mut vector);
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectorize(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.vectorize(text)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "Hashing"
    }
}
