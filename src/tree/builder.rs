//! Level-by-level tree construction.
//!
//! ```text
//! text ─▶ chunks ─┬─▶ embed ─▶ cluster ─▶ summarize ─▶ LevelResult(1)
//!                 │                                        │ summaries
//!                 └──────────── next level ◀───────────────┘
//! ```
//!
//! Recursion stops after `max_levels` levels (never more than
//! [`MAX_LEVEL_CEILING`]) or as soon as a level yields at most one summary.
//!
//! Failures degrade instead of aborting:
//!
//! | Failure | Outcome |
//! |---------|---------|
//! | generator fails for one cluster | that summary becomes [`SUMMARY_FAILED`] |
//! | a level fails to embed or cluster | one fallback cluster, [`LEVEL_FAILED`], recursion stops |
//!
//! Only errors for which [`Error::is_recoverable`] holds are absorbed.

use tracing::{debug, info, warn};

use super::raptor::RaptorTree;
use crate::cluster::ClusteringEngine;
use crate::config::RaptorConfig;
use crate::embed::{embed_units, Embedder};
use crate::error::{Error, Result};
use crate::model::{Cluster, ClusterSummary, LevelResult, TextUnit};
use crate::split::{SplitConfig, TextChunker};
use crate::summarize::{PromptSummarizer, Summarizer, TextGenerator};

/// Hard cap on levels, whatever `max_levels` asks for.
pub const MAX_LEVEL_CEILING: usize = 16;

/// Placeholder summary when the generator fails for a cluster.
pub const SUMMARY_FAILED: &str = "Summary generation failed for this cluster.";

/// Summary of a level that was replaced by the fallback.
pub const LEVEL_FAILED: &str = "Processing failed for this level.";

/// Builds [`RaptorTree`]s from text.
#[derive(Debug)]
pub struct TreeBuilder<E, S> {
    config: RaptorConfig,
    embedder: E,
    summarizer: S,
    engine: ClusteringEngine,
}

impl<E, G> TreeBuilder<E, PromptSummarizer<G>>
where
    E: Embedder,
    G: TextGenerator,
{
    /// Builder that summarizes by prompting `generator`.
    pub fn new(config: RaptorConfig, embedder: E, generator: G) -> Result<Self> {
        Self::with_summarizer(config, embedder, PromptSummarizer::new(generator))
    }
}

impl<E, S> TreeBuilder<E, S>
where
    E: Embedder,
    S: Summarizer,
{
    /// Builder with a custom summarizer.
    pub fn with_summarizer(config: RaptorConfig, embedder: E, summarizer: S) -> Result<Self> {
        config.validate()?;
        let engine = ClusteringEngine::new(&config.clustering);
        Ok(Self {
            config,
            embedder,
            summarizer,
            engine,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &RaptorConfig {
        &self.config
    }

    /// The clustering engine, including its model cache.
    pub fn engine(&self) -> &ClusteringEngine {
        &self.engine
    }

    /// Split `text` into chunks of about `chunk_size` tokens and build up to
    /// `max_levels` summary levels over them.
    pub fn process_text(
        &self,
        text: &str,
        chunk_size: usize,
        max_levels: usize,
    ) -> Result<RaptorTree> {
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("text cannot be blank".into()));
        }
        let chars = text.chars().count();
        if chars > self.config.processing.max_text_length {
            return Err(Error::InvalidInput(format!(
                "text has {chars} characters, limit is {}",
                self.config.processing.max_text_length
            )));
        }
        if max_levels == 0 {
            return Err(Error::InvalidParameter {
                name: "max_levels",
                message: "must be > 0",
            });
        }

        info!(chars, chunk_size, max_levels, "processing text");
        let chunker = TextChunker::new(SplitConfig::from_processing(
            chunk_size,
            &self.config.processing,
        ))?;
        let chunks = chunker.split(text)?;
        info!(chunks = chunks.len(), stats = %chunker.stats(&chunks), "split text");

        self.process_chunks(chunks, max_levels)
    }

    /// [`process_text`](Self::process_text) with the configured chunk size
    /// and level count.
    pub fn process_text_default(&self, text: &str) -> Result<RaptorTree> {
        self.process_text(
            text,
            self.config.processing.default_chunk_size,
            self.config.processing.default_max_levels,
        )
    }

    /// Build summary levels over pre-split chunks.
    pub fn process_chunks(&self, chunks: Vec<String>, max_levels: usize) -> Result<RaptorTree> {
        if chunks.is_empty() {
            return Err(Error::Processing("no chunks to process".into()));
        }

        let ceiling = max_levels.min(MAX_LEVEL_CEILING);
        if ceiling < max_levels {
            warn!(max_levels, ceiling, "level count capped");
        }

        let mut levels = Vec::new();
        let mut current = chunks.clone();

        for level in 1..=ceiling {
            let units: Vec<TextUnit> = current
                .into_iter()
                .enumerate()
                .map(|(id, text)| TextUnit::new(id, text))
                .collect();

            let result = absorb_level_error(level, &units, self.process_level(level, &units))?;

            let summaries = result.summaries.len();
            info!(
                level,
                units = units.len(),
                clusters = result.clusters.len(),
                summaries,
                "level complete"
            );

            let stop = result.fallback || summaries <= 1;
            current = result.summary_texts();
            levels.push(result);
            if stop {
                break;
            }
        }

        info!(levels = levels.len(), "tree complete");
        Ok(RaptorTree::new(chunks, levels))
    }

    fn process_level(&self, level: usize, units: &[TextUnit]) -> Result<LevelResult> {
        debug!(level, units = units.len(), "embedding");
        let embeddings = embed_units(&self.embedder, units)?;

        debug!(level, "clustering");
        let clusters = self.engine.cluster(&embeddings)?;

        debug!(level, clusters = clusters.len(), "summarizing");
        let summaries = clusters
            .iter()
            .map(|cluster| self.summarize_cluster(level, cluster))
            .collect();

        Ok(LevelResult {
            level,
            embeddings,
            clusters,
            summaries,
            fallback: false,
        })
    }

    fn summarize_cluster(&self, level: usize, cluster: &Cluster) -> ClusterSummary {
        let (summary, failed) = match self.summarizer.summarize(&cluster.texts) {
            Ok(summary) => (summary, false),
            Err(e) => {
                warn!(
                    level,
                    cluster = cluster.id,
                    error = %e,
                    "summary failed, using placeholder"
                );
                (SUMMARY_FAILED.to_string(), true)
            }
        };
        ClusterSummary {
            cluster_id: cluster.id,
            level,
            summary,
            source_ids: cluster.member_ids.clone(),
            failed,
        }
    }
}

/// Replace a recoverable level failure with the fallback level.
fn absorb_level_error(
    level: usize,
    units: &[TextUnit],
    result: Result<LevelResult>,
) -> Result<LevelResult> {
    match result {
        Ok(result) => Ok(result),
        Err(e) if e.is_recoverable() => {
            warn!(
                level,
                units = units.len(),
                error = %e,
                "level failed, using fallback"
            );
            Ok(fallback_level(level, units))
        }
        Err(e) => Err(e),
    }
}

/// One cluster over every unit and one failed summary.
fn fallback_level(level: usize, units: &[TextUnit]) -> LevelResult {
    let cluster = Cluster {
        id: 0,
        texts: units.iter().map(|u| u.text.clone()).collect(),
        member_ids: units.iter().map(|u| u.id).collect(),
        merged_from: Vec::new(),
    };
    let summary = ClusterSummary {
        cluster_id: 0,
        level,
        summary: LEVEL_FAILED.to_string(),
        source_ids: cluster.member_ids.clone(),
        failed: true,
    };
    LevelResult {
        level,
        embeddings: Vec::new(),
        clusters: vec![cluster],
        summaries: vec![summary],
        fallback: true,
    }
}
