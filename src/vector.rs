//! Vector math kernel — pure functions on dense float vectors.

use crate::types::{GraphError, GraphResult};

/// Cosine similarity between two vectors. Returns 0.0 (not NaN) when either
/// norm is zero; the result is clamped to [-1, 1].
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for i in 0..a.len().min(b.len()) {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        (dot / denom).clamp(-1.0, 1.0)
    }
}

/// Cosine similarity with a dimension precondition. Callers at the public
/// boundary use this form; silent truncation is never acceptable there.
pub fn try_cosine_similarity(a: &[f32], b: &[f32]) -> GraphResult<f32> {
    check_dimensions(a, b)?;
    Ok(cosine_similarity(a, b))
}

/// Euclidean distance between two vectors.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    let mut sum = 0.0f32;
    for i in 0..a.len().min(b.len()) {
        let d = a[i] - b[i];
        sum += d * d;
    }
    sum.sqrt()
}

/// Euclidean distance with a dimension precondition.
pub fn try_euclidean_distance(a: &[f32], b: &[f32]) -> GraphResult<f32> {
    check_dimensions(a, b)?;
    Ok(euclidean_distance(a, b))
}

/// L2-normalize a vector. A zero vector normalizes to the zero vector.
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        return v.to_vec();
    }
    v.iter().map(|x| x / norm).collect()
}

/// Arithmetic-mean centroid of a set of vectors. Empty input yields an
/// empty vector. All inputs must share the first vector's dimension.
pub fn centroid(vectors: &[&[f32]]) -> GraphResult<Vec<f32>> {
    let Some(first) = vectors.first() else {
        return Ok(Vec::new());
    };
    let dim = first.len();
    let mut sum = vec![0.0f32; dim];
    for v in vectors {
        if v.len() != dim {
            return Err(GraphError::DimensionMismatch {
                expected: dim,
                got: v.len(),
            });
        }
        for (acc, x) in sum.iter_mut().zip(v.iter()) {
            *acc += x;
        }
    }
    let count = vectors.len() as f32;
    for x in &mut sum {
        *x /= count;
    }
    Ok(sum)
}

/// Whether every entry of the vector is finite.
pub fn is_valid_vector(v: &[f32]) -> bool {
    v.iter().all(|x| x.is_finite())
}

fn check_dimensions(a: &[f32], b: &[f32]) -> GraphResult<()> {
    if a.len() != b.len() {
        return Err(GraphError::DimensionMismatch {
            expected: a.len(),
            got: b.len(),
        });
    }
    Ok(())
}
