//! Summarization of clusters through a text generator.
//!
//! The generator itself (an LLM call, usually) is supplied by the host via
//! [`TextGenerator`] or a closure wrapped with [`from_fn`], keeping this
//! crate free of any model client.
//!
//! [`PromptSummarizer`] joins a cluster's member texts with
//! [`CONTEXT_SEPARATOR`], substitutes them into [`SUMMARY_PROMPT`], and
//! returns the generator's answer trimmed.

use tracing::debug;

use crate::error::{Error, Result};

/// Prompt template; `{context}` is replaced with the joined member texts.
pub const SUMMARY_PROMPT: &str = "Here is a subset of documentation that needs to be \
    summarized.\n\n\
    The documentation provides detailed information about a specific topic.\n\n\
    Give a detailed summary of the documentation provided, maintaining key concepts \
    and important details.\n\n\
    Documentation:\n{context}\n\nSummary:\n";

/// Separator placed between member texts in the prompt.
pub const CONTEXT_SEPARATOR: &str = "\n--- --- \n --- --- \n";

/// Produces text from a prompt.
pub trait TextGenerator {
    /// Generate a completion for `prompt`.
    fn generate(&self, prompt: &str) -> Result<String>;
}

impl<G: TextGenerator + ?Sized> TextGenerator for &G {
    fn generate(&self, prompt: &str) -> Result<String> {
        (**self).generate(prompt)
    }
}

/// Trait for summarization strategies.
///
/// Implementors condense the texts of one cluster into a summary.
pub trait Summarizer {
    /// Summarize a group of texts.
    fn summarize(&self, texts: &[String]) -> Result<String>;
}

/// A function-based text generator.
#[derive(Clone)]
pub struct FnGenerator<F> {
    f: F,
}

impl<F> FnGenerator<F> {
    /// Create a generator from a function.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> TextGenerator for FnGenerator<F>
where
    F: Fn(&str) -> Result<String>,
{
    fn generate(&self, prompt: &str) -> Result<String> {
        (self.f)(prompt)
    }
}

/// Create a text generator from a closure.
pub fn from_fn<F>(f: F) -> FnGenerator<F>
where
    F: Fn(&str) -> Result<String>,
{
    FnGenerator::new(f)
}

/// Render the summary prompt for `texts`.
pub fn build_prompt<S: AsRef<str>>(texts: &[S]) -> String {
    let context = texts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR);
    SUMMARY_PROMPT.replace("{context}", &context)
}

/// Summarizer that prompts a [`TextGenerator`] with [`SUMMARY_PROMPT`].
#[derive(Debug, Clone)]
pub struct PromptSummarizer<G> {
    generator: G,
}

impl<G: TextGenerator> PromptSummarizer<G> {
    /// Wrap a generator.
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// The wrapped generator.
    pub fn generator(&self) -> &G {
        &self.generator
    }
}

impl<G: TextGenerator> Summarizer for PromptSummarizer<G> {
    fn summarize(&self, texts: &[String]) -> Result<String> {
        let prompt = build_prompt(texts);
        debug!(members = texts.len(), prompt_chars = prompt.len(), "generating summary");
        let summary = self
            .generator
            .generate(&prompt)
            .map_err(|e| match e {
                Error::Summarization(_) => e,
                other => Error::Summarization(other.to_string()),
            })?;
        Ok(summary.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_joined_members() {
        let prompt = build_prompt(&["first", "second"]);
        assert!(prompt.starts_with("Here is a subset of documentation"));
        let context = "Documentation:\nfirst\n--- --- \n --- --- \nsecond\n\nSummary:\n";
        assert!(prompt.contains(context));
        assert!(!prompt.contains("{context}"));
    }

    #[test]
    fn test_prompt_summarizer_trims_output() {
        let summarizer = PromptSummarizer::new(from_fn(|_: &str| Ok("  short  \n".to_string())));
        let out = summarizer.summarize(&["a".to_string()]).unwrap();
        assert_eq!(out, "short");
    }

    #[test]
    fn test_generator_sees_prompt() {
        let summarizer = PromptSummarizer::new(from_fn(|prompt: &str| {
            Ok(prompt.lines().filter(|l| l.starts_with("alpha")).count().to_string())
        }));
        let out = summarizer
            .summarize(&["alpha one".to_string(), "alpha two".to_string()])
            .unwrap();
        assert_eq!(out, "2");
    }

    #[test]
    fn test_failures_become_summarization_errors() {
        let summarizer =
            PromptSummarizer::new(from_fn(|_: &str| Err(Error::Processing("timeout".into()))));
        let err = summarizer.summarize(&["x".to_string()]).unwrap_err();
        assert!(matches!(err, Error::Summarization(m) if m.contains("timeout")));
    }
}
