//! Property-based tests for splitting, similarity and clustering.
//!
//! These tests verify invariants that must hold for any input:
//! - Chunks are non-empty and, without overlap, cover the input exactly
//! - Cosine similarity is symmetric and 1 for a vector with itself
//! - Model selection stays within `1 ≤ k ≤ min(K, N - 1)`
//! - Global buckets partition the input ids
//! - Post-processing never adds clusters and never loses texts

use proptest::prelude::*;
use raptor::cluster::{ClusterPostProcessor, GlobalClusterer, ModelSelector};
use raptor::config::ClusteringConfig;
use raptor::model::{Cluster, EmbeddedUnit};
use raptor::similarity::cosine_similarity;
use raptor::split::{SplitConfig, TextChunker};

// =============================================================================
// Test Generators
// =============================================================================

/// Text with words, sentences, line breaks and paragraphs.
fn document_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        (
            prop::string::string_regex("[A-Za-z]{1,12}").unwrap(),
            prop::sample::select(vec![" ", " ", " ", ", ", ". ", "! ", "\n", "\n\n", "; "]),
        ),
        1..120,
    )
    .prop_map(|words| {
        let mut text = String::new();
        for (word, sep) in words {
            text.push_str(&word);
            text.push_str(sep);
        }
        text
    })
}

/// Arbitrary printable text, including long unbroken runs.
fn arbitrary_text() -> impl Strategy<Value = String> {
    prop::string::string_regex("[ -~\n]{1,400}")
        .unwrap()
        .prop_filter("non-blank", |s| !s.trim().is_empty())
}

fn vector(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-10.0f32..10.0, dim)
}

/// A batch of `n` vectors sharing one dimension.
fn batch() -> impl Strategy<Value = Vec<Vec<f32>>> {
    (1usize..4, 1usize..14)
        .prop_flat_map(|(dim, n)| prop::collection::vec(vector(dim), n))
}

fn units(vectors: Vec<Vec<f32>>) -> Vec<EmbeddedUnit> {
    vectors
        .into_iter()
        .enumerate()
        .map(|(i, v)| EmbeddedUnit::new(i, format!("unit {i}"), v))
        .collect()
}

// =============================================================================
// Invariant Helpers
// =============================================================================

fn non_ws(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

// =============================================================================
// Chunker Tests
// =============================================================================

proptest! {
    #[test]
    fn chunks_are_non_empty(text in document_text(), size in 1usize..60) {
        let chunker = TextChunker::with_chunk_size(size).unwrap();
        let chunks = chunker.split(&text).unwrap();
        prop_assert!(!chunks.is_empty());
        for chunk in &chunks {
            prop_assert!(!chunk.trim().is_empty());
        }
    }

    #[test]
    fn chunks_reconstruct_without_overlap(text in document_text(), size in 1usize..60) {
        let chunker = TextChunker::new(SplitConfig::new(size).without_overlap()).unwrap();
        let chunks = chunker.split(&text).unwrap();
        prop_assert_eq!(non_ws(&chunks.concat()), non_ws(&text));
    }

    #[test]
    fn separator_path_reconstructs(text in arbitrary_text(), size in 1usize..40) {
        let config = SplitConfig::new(size)
            .without_overlap()
            .with_preserve_sentences(false);
        let chunks = TextChunker::new(config).unwrap().split(&text).unwrap();
        prop_assert_eq!(non_ws(&chunks.concat()), non_ws(&text));
    }

    #[test]
    fn overlap_never_drops_chunk_content(text in document_text(), size in 4usize..60) {
        let base = TextChunker::new(SplitConfig::new(size).without_overlap()).unwrap();
        let overlapped = TextChunker::new(SplitConfig::new(size).with_overlap_ratio(0.25)).unwrap();
        let plain = base.split(&text).unwrap();
        let with_overlap = overlapped.split(&text).unwrap();
        prop_assert_eq!(plain.len(), with_overlap.len());
        for (p, o) in plain.iter().zip(&with_overlap) {
            prop_assert!(o.ends_with(p.as_str()));
        }
    }
}

// =============================================================================
// Similarity Tests
// =============================================================================

proptest! {
    #[test]
    fn cosine_is_symmetric((a, b) in (1usize..32).prop_flat_map(|d| (vector(d), vector(d)))) {
        let ab = cosine_similarity(&a, &b).unwrap();
        let ba = cosine_similarity(&b, &a).unwrap();
        prop_assert!((ab - ba).abs() < 1e-12);
        prop_assert!((-1.0 - 1e-9..=1.0 + 1e-9).contains(&ab));
    }

    #[test]
    fn cosine_with_self_is_one(
        v in (1usize..32)
            .prop_flat_map(vector)
            .prop_filter("non-zero", |v| v.iter().any(|x| x.abs() > 1e-3))
    ) {
        let s = cosine_similarity(&v, &v).unwrap();
        prop_assert!((s - 1.0).abs() < 1e-9, "self similarity {}", s);
    }
}

// =============================================================================
// Clustering Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn selector_stays_in_bounds(data in batch(), max_k in 0usize..8, seed in 0u64..1000) {
        let selection = ModelSelector::new(seed).select(&data, max_k, None);
        let n = data.len();
        if n <= 1 || max_k <= 1 {
            prop_assert_eq!(selection.n_components, 1);
        } else {
            prop_assert!(selection.n_components >= 1);
            prop_assert!(selection.n_components <= max_k.min(n - 1));
        }
    }

    #[test]
    fn global_buckets_partition_input(data in batch(), threshold in 0.0f64..=1.0) {
        let config = ClusteringConfig {
            cluster_threshold: threshold,
            ..ClusteringConfig::default()
        };
        let n = data.len();
        let clusters = GlobalClusterer::from_config(&config)
            .cluster(&units(data), None)
            .unwrap();
        let mut ids: Vec<usize> = clusters
            .iter()
            .flat_map(|c| c.members.iter().map(|u| u.id))
            .collect();
        ids.sort_unstable();
        prop_assert_eq!(ids, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn post_processing_preserves_texts(
        sizes in prop::collection::vec(0usize..6, 0..12),
        min_size in 0usize..5,
    ) {
        let mut next = 0;
        let clusters: Vec<Cluster> = sizes
            .iter()
            .enumerate()
            .map(|(id, &size)| {
                let member_ids: Vec<usize> = (next..next + size).collect();
                next += size;
                Cluster {
                    id,
                    texts: member_ids.iter().map(|m| format!("t{m}")).collect(),
                    member_ids,
                    merged_from: Vec::new(),
                }
            })
            .collect();

        let before = clusters.len();
        let out = ClusterPostProcessor::new(min_size).process(clusters);
        prop_assert!(out.len() <= before);
        prop_assert_eq!(out.iter().map(Cluster::len).sum::<usize>(), next);
        for c in &out {
            prop_assert_eq!(c.texts.len(), c.member_ids.len());
            prop_assert!(!c.is_empty());
        }
    }
}
