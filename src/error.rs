/// Result alias for `raptor`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by splitting, clustering and tree-building.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Input was empty.
    #[error("empty input provided")]
    EmptyInput,

    /// Caller-supplied input was rejected (blank text, inconsistent embeddings).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Vector dimension mismatch.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// Mixture fit produced non-finite state.
    #[error("numerical failure: {0}")]
    NumericalFailure(String),

    /// A clustering attempt failed as a whole.
    #[error("clustering failed: {0}")]
    Clustering(String),

    /// The embedding provider failed or returned a malformed batch.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// The text generator failed.
    #[error("summarization failed: {0}")]
    Summarization(String),

    /// Unexpected failure surfaced to the caller.
    #[error("failed to process text: {0}")]
    Processing(String),
}

impl Error {
    /// Whether a tree level absorbs this error with a fallback level.
    ///
    /// `TreeBuilder` replaces a level that fails with a recoverable error
    /// and returns any other error to the caller. Provider failures reach
    /// the level as [`Error::Embedding`] or [`Error::Summarization`].
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::NumericalFailure(_)
                | Error::Clustering(_)
                | Error::Embedding(_)
                | Error::Summarization(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_cause() {
        let err = Error::Processing("chunker produced nothing".into());
        assert_eq!(
            err.to_string(),
            "failed to process text: chunker produced nothing"
        );
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(Error::Summarization("timeout".into()).is_recoverable());
        assert!(Error::NumericalFailure("nan".into()).is_recoverable());
        assert!(!Error::InvalidInput("blank".into()).is_recoverable());
        assert!(!Error::Processing("x".into()).is_recoverable());
    }
}
