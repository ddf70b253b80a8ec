use serde::{Deserialize, Serialize};

/// Token bounds handed to the summarization model, derived from a word count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LengthBudget {
    pub desired_words: usize,
    pub max_length_tokens: usize,
    pub min_length_tokens: usize,
}

impl LengthBudget {
    /// `max = min(hard_cap, round(words * 1.3))`, `min = max / 3`.
    ///
    /// Rounding is half-up and done in integers so 1.3 never drifts.
    pub fn compute(desired_words: usize, hard_cap: usize) -> Self {
        let scaled = desired_words.saturating_mul(13).saturating_add(5) / 10;
        let max_length_tokens = scaled.min(hard_cap);

        Self {
            desired_words,
            max_length_tokens,
            min_length_tokens: max_length_tokens / 3,
        }
    }

    pub fn exceeds(&self, available_words: usize) -> bool {
        self.desired_words > available_words
    }
}
