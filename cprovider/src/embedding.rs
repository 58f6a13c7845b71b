//! Embedding collaborator contract used by semantic tool selection.
//!
//! ```rust
//! use cprovider::cosine_similarity;
//!
//! assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
//! assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
//! assert_eq!(cosine_similarity(&[], &[]), 0.0);
//! ```

use crate::{ProviderError, ProviderFuture};

pub type Embedding = Vec<f32>;

pub trait EmbeddingProvider: Send + Sync {
    fn embed<'a>(&'a self, text: &'a str) -> ProviderFuture<'a, Result<Embedding, ProviderError>>;

    /// Higher is more similar.
    fn similarity(&self, left: &[f32], right: &[f32]) -> f32 {
        cosine_similarity(left, right)
    }
}

/// Cosine similarity; zero for mismatched lengths or zero-norm vectors.
pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f32 {
    if left.len() != right.len() || left.is_empty() {
        return 0.0;
    }

    let (mut dot, mut left_norm, mut right_norm) = (0.0_f32, 0.0_f32, 0.0_f32);
    for (a, b) in left.iter().zip(right) {
        dot += a * b;
        left_norm += a * a;
        right_norm += b * b;
    }

    if left_norm == 0.0 || right_norm == 0.0 {
        return 0.0;
    }

    dot / (left_norm.sqrt() * right_norm.sqrt())
}
