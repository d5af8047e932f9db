//! Vector similarity and distance.
//!
//! | Function | Range | Identical vectors |
//! |----------|-------|-------------------|
//! | [`cosine_similarity`] | [-1, 1] | 1 |
//! | [`euclidean_distance`] | [0, ∞) | 0 |
//!
//! Accumulation is done in `f64` so long embeddings (768–4096 dims) do not
//! lose precision.

use crate::error::{Error, Result};

/// Cosine similarity between two equal-length vectors.
///
/// A zero vector has no direction; its similarity to anything is 0.
///
/// ```rust
/// use raptor::similarity::cosine_similarity;
///
/// let a = [1.0, 0.0];
/// let b = [0.0, 1.0];
/// assert!(cosine_similarity(&a, &a).unwrap() > 0.999);
/// assert!(cosine_similarity(&a, &b).unwrap().abs() < 1e-9);
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64> {
    check_dims(a, b)?;

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

/// Euclidean (L2) distance between two equal-length vectors.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> Result<f64> {
    check_dims(a, b)?;
    Ok(a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let diff = f64::from(x) - f64::from(y);
            diff * diff
        })
        .sum::<f64>()
        .sqrt())
}

fn check_dims(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            found: b.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_similarity_is_one() {
        let v = [0.3, -1.2, 4.5, 0.0];
        assert!((cosine_similarity(&v, &v).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_opposite_vectors() {
        let a = [1.0, 2.0];
        let b = [-1.0, -2.0];
        assert!((cosine_similarity(&a, &b).unwrap() + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_vector_similarity() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        assert_eq!(
            cosine_similarity(&[1.0], &[1.0, 2.0]),
            Err(Error::DimensionMismatch {
                expected: 1,
                found: 2
            })
        );
        assert!(euclidean_distance(&[1.0, 2.0, 3.0], &[1.0]).is_err());
    }

    #[test]
    fn test_euclidean_345() {
        let d = euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]).unwrap();
        assert!((d - 5.0).abs() < 1e-9);
        assert_eq!(euclidean_distance(&[1.5, 2.5], &[1.5, 2.5]).unwrap(), 0.0);
    }
}
