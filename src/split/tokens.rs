//! Approximate token counting.
//!
//! No tokenizer is bundled. Sizes are estimated from character counts:
//!
//! ```text
//! tokens = ceil(chars / 4 + 0.3 × punctuation)    (min 1, blank = 0)
//! ```
//!
//! Whitespace runs are collapsed before counting, so layout does not
//! inflate the estimate. Punctuation is penalised because BPE vocabularies
//! usually spend a token on each mark.

/// Heuristic token estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenEstimator {
    chars_per_token: f64,
    punctuation_weight: f64,
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self {
            chars_per_token: 4.0,
            punctuation_weight: 0.3,
        }
    }
}

impl TokenEstimator {
    /// Create an estimator with the default ratios.
    pub fn new() -> Self {
        Self::default()
    }

    /// Estimated token count of `text`. Blank text is 0, anything else at least 1.
    pub fn estimate(&self, text: &str) -> usize {
        let mut chars = 0usize;
        let mut punctuation = 0usize;
        for (i, word) in text.split_whitespace().enumerate() {
            if i > 0 {
                chars += 1;
            }
            for c in word.chars() {
                chars += 1;
                if !c.is_alphanumeric() {
                    punctuation += 1;
                }
            }
        }
        if chars == 0 {
            return 0;
        }

        let base = chars as f64 / self.chars_per_token;
        let estimate = (base + punctuation as f64 * self.punctuation_weight).ceil() as usize;
        estimate.max(1)
    }

    /// Approximate character budget for `tokens` tokens.
    pub fn approx_char_size(&self, tokens: usize) -> usize {
        (tokens as f64 * self.chars_per_token) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_is_zero() {
        let est = TokenEstimator::new();
        assert_eq!(est.estimate(""), 0);
        assert_eq!(est.estimate("  \n\t "), 0);
    }

    #[test]
    fn test_minimum_one() {
        assert_eq!(TokenEstimator::new().estimate("a"), 1);
    }

    #[test]
    fn test_whitespace_collapsed() {
        let est = TokenEstimator::new();
        assert_eq!(est.estimate("abcd    efgh"), est.estimate("abcd efgh"));
        assert_eq!(est.estimate("  abcd efgh\n"), est.estimate("abcd efgh"));
    }

    #[test]
    fn test_punctuation_penalty() {
        let est = TokenEstimator::new();
        // 8 chars -> 2.0, no punctuation
        assert_eq!(est.estimate("abcdefgh"), 2);
        // 8 chars -> 2.0, plus 2 × 0.3 -> ceil(2.6) = 3
        assert_eq!(est.estimate("abcdef.!"), 3);
    }

    #[test]
    fn test_approx_char_size() {
        assert_eq!(TokenEstimator::new().approx_char_size(10), 40);
    }
}
