//! Embedding provider seam.
//!
//! The crate never computes embeddings itself. A host plugs in any model by
//! implementing [`Embedder`] (or wrapping a closure with [`from_fn`]).
//! Output is checked before it reaches clustering: one vector per input, in
//! input order, all of one non-zero dimension.

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{EmbeddedUnit, TextUnit};

/// Turns texts into fixed-length vectors.
pub trait Embedder {
    /// Embed `texts`. Must return one vector per text, in order.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

impl<E: Embedder + ?Sized> Embedder for &E {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        (**self).embed(texts)
    }
}

/// A closure-based embedder.
#[derive(Clone)]
pub struct FnEmbedder<F> {
    f: F,
}

impl<F> FnEmbedder<F> {
    /// Create an embedder from a function.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Embedder for FnEmbedder<F>
where
    F: Fn(&[String]) -> Result<Vec<Vec<f32>>>,
{
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        (self.f)(texts)
    }
}

/// Create an embedder from a closure.
pub fn from_fn<F>(f: F) -> FnEmbedder<F>
where
    F: Fn(&[String]) -> Result<Vec<Vec<f32>>>,
{
    FnEmbedder::new(f)
}

/// Check that every vector shares the first vector's non-zero dimension.
///
/// Returns that dimension, or 0 for an empty batch.
pub fn validate_embeddings<V: AsRef<[f32]>>(vectors: &[V]) -> Result<usize> {
    let Some(first) = vectors.first() else {
        return Ok(0);
    };
    let dim = first.as_ref().len();
    if dim == 0 {
        return Err(Error::InvalidInput("embedding 0 is empty".into()));
    }
    for (i, v) in vectors.iter().enumerate().skip(1) {
        let found = v.as_ref().len();
        if found != dim {
            return Err(Error::InvalidInput(format!(
                "embedding {i} has dimension {found}, expected {dim}"
            )));
        }
    }
    Ok(dim)
}

/// Embed `units` and attach the vectors.
///
/// Every failure, from the provider or from a malformed batch, is reported
/// as [`Error::Embedding`].
pub fn embed_units<E: Embedder + ?Sized>(
    embedder: &E,
    units: &[TextUnit],
) -> Result<Vec<EmbeddedUnit>> {
    let texts: Vec<String> = units.iter().map(|u| u.text.clone()).collect();
    let vectors = embedder.embed(&texts).map_err(|e| match e {
        Error::Embedding(_) => e,
        other => Error::Embedding(other.to_string()),
    })?;
    if vectors.len() != units.len() {
        return Err(Error::Embedding(format!(
            "provider returned {} vectors for {} texts",
            vectors.len(),
            units.len()
        )));
    }
    let dim = validate_embeddings(&vectors)
        .map_err(|e| Error::Embedding(format!("malformed batch: {e}")))?;
    debug!(units = units.len(), dim, "embedded units");

    Ok(units
        .iter()
        .zip(vectors)
        .map(|(unit, vector)| EmbeddedUnit::new(unit.id, unit.text.clone(), vector))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(texts: &[&str]) -> Vec<TextUnit> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| TextUnit::new(i, *t))
            .collect()
    }

    #[test]
    fn test_embed_units_preserves_order_and_ids() {
        let embedder = from_fn(|texts: &[String]| {
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        });
        let out = embed_units(&embedder, &units(&["a", "bbb"])).unwrap();
        assert_eq!(out[0].id, 0);
        assert_eq!(out[0].vector, vec![1.0, 1.0]);
        assert_eq!(out[1].text, "bbb");
        assert_eq!(out[1].vector, vec![3.0, 1.0]);
    }

    #[test]
    fn test_wrong_count_is_embedding_error() {
        let embedder = from_fn(|_: &[String]| Ok(vec![vec![1.0]]));
        let result = embed_units(&embedder, &units(&["a", "b"]));
        assert!(matches!(result, Err(Error::Embedding(_))));
    }

    #[test]
    fn test_provider_error_propagates() {
        let embedder = from_fn(|_: &[String]| Err(Error::Embedding("unreachable".into())));
        let result = embed_units(&embedder, &units(&["a"]));
        assert_eq!(result, Err(Error::Embedding("unreachable".into())));
    }

    #[test]
    fn test_malformed_batch_is_recoverable_embedding_error() {
        let embedder = from_fn(|_: &[String]| Ok(vec![vec![1.0, 2.0], vec![3.0]]));
        let err = embed_units(&embedder, &units(&["a", "b"])).unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
        assert!(err.to_string().contains("embedding 1"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_foreign_provider_error_becomes_embedding_error() {
        let embedder = from_fn(|_: &[String]| Err(Error::InvalidInput("bad token".into())));
        let err = embed_units(&embedder, &units(&["a"])).unwrap_err();
        assert_eq!(err, Error::Embedding("invalid input: bad token".into()));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_validate_embeddings() {
        let empty: Vec<Vec<f32>> = Vec::new();
        assert_eq!(validate_embeddings(&empty), Ok(0));
        assert_eq!(validate_embeddings(&[vec![1.0, 2.0], vec![3.0, 4.0]]), Ok(2));
        assert!(validate_embeddings(&[Vec::<f32>::new()]).is_err());

        let err = validate_embeddings(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(err.to_string().contains("embedding 1"));
    }
}
