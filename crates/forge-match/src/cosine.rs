//! Cosine similarity between embedding vectors.

use forge_core::{Error, Result};

/// Cosine similarity between two vectors: `dot(a,b) / (‖a‖·‖b‖)`.
///
/// Returns a dimension-mismatch error when the vectors differ in length.
/// A zero-norm input yields 0.0 rather than dividing by zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a * norm_b))
}
