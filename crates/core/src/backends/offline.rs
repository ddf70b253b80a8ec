use crate::budget::LengthBudget;
use crate::chunking::normalize_whitespace;
use crate::models::GenerationTask;
use crate::traits::{ItemGenerator, Summarizer};
use crate::GenerationError;
use async_trait::async_trait;
use regex::Regex;

const SENTENCE_PATTERN: &str = r"[^.!?]+[.!?]*";

/// Rough words-per-token ratio matching the budget's 1.3 tokens per word.
fn words_for_tokens(tokens: usize) -> usize {
    (tokens * 10 / 13).max(1)
}

/// Sentence boundary matcher, compiled once per backend.
#[derive(Debug, Clone)]
struct SentenceSplitter {
    pattern: Regex,
}

impl SentenceSplitter {
    fn new() -> Result<Self, GenerationError> {
        let pattern = Regex::new(SENTENCE_PATTERN)
            .map_err(|error| GenerationError::Request(error.to_string()))?;
        Ok(Self { pattern })
    }

    fn sentences(&self, text: &str) -> Vec<String> {
        let normalized = normalize_whitespace(text);

        self.pattern
            .find_iter(&normalized)
            .map(|found| found.as_str().trim().to_string())
            .filter(|sentence| !sentence.is_empty())
            .collect()
    }
}

fn truncate_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extractive summarizer: keeps leading sentences until the word budget is spent.
#[derive(Debug, Clone)]
pub struct LeadSentenceSummarizer {
    splitter: SentenceSplitter,
}

impl LeadSentenceSummarizer {
    pub fn new() -> Result<Self, GenerationError> {
        Ok(Self {
            splitter: SentenceSplitter::new()?,
        })
    }
}

#[async_trait]
impl Summarizer for LeadSentenceSummarizer {
    async fn summarize(
        &self,
        text: &str,
        budget: &LengthBudget,
    ) -> Result<String, GenerationError> {
        let sentences = self.splitter.sentences(text);
        if sentences.is_empty() {
            return Err(GenerationError::EmptyInput);
        }

        let max_words = words_for_tokens(budget.max_length_tokens);
        let mut kept = Vec::new();
        let mut used = 0usize;

        for sentence in sentences {
            let words = sentence.split_whitespace().count();
            if used > 0 && used + words > max_words {
                break;
            }
            used += words;
            kept.push(sentence);
        }

        Ok(truncate_words(&kept.join(" "), max_words))
    }
}

/// Builds flashcards and questions from the first sentence of a chunk.
#[derive(Debug, Clone)]
pub struct FirstSentenceGenerator {
    splitter: SentenceSplitter,
}

impl FirstSentenceGenerator {
    pub fn new() -> Result<Self, GenerationError> {
        Ok(Self {
            splitter: SentenceSplitter::new()?,
        })
    }
}

#[async_trait]
impl ItemGenerator for FirstSentenceGenerator {
    async fn generate(
        &self,
        task: GenerationTask,
        text: &str,
        max_new_tokens: usize,
    ) -> Result<String, GenerationError> {
        let sentence = self
            .splitter
            .sentences(text)
            .into_iter()
            .next()
            .ok_or(GenerationError::EmptyInput)?;

        let topic = sentence
            .split_whitespace()
            .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
            .max_by_key(|word| word.chars().count())
            .unwrap_or_default()
            .to_string();

        let item = match task {
            GenerationTask::Flashcard => format!("Q: What is said about {topic}? A: {sentence}"),
            GenerationTask::QuizQuestion => {
                format!("Which statement about {topic} does the text support?")
            }
            GenerationTask::Summary => sentence,
        };

        Ok(truncate_words(&item, words_for_tokens(max_new_tokens)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn summary_keeps_leading_sentences_within_budget() -> Result<(), GenerationError> {
        let text = "Cells are the unit of life. They divide by mitosis. \
                    Mitosis has four phases. Each phase is distinct.";
        let budget = LengthBudget::compute(10, 1024);

        let summary = LeadSentenceSummarizer::new()?.summarize(text, &budget).await?;
        assert_eq!(summary, "Cells are the unit of life. They divide by mitosis.");
        Ok(())
    }

    #[tokio::test]
    async fn long_first_sentence_is_truncated_to_budget() -> Result<(), GenerationError> {
        let text = "one two three four five six seven eight nine ten eleven twelve.";
        let budget = LengthBudget::compute(10, 1024);

        let summary = LeadSentenceSummarizer::new()?.summarize(text, &budget).await?;
        assert_eq!(summary, "one two three four five six seven eight nine ten");
        Ok(())
    }

    #[tokio::test]
    async fn blank_chunks_fail() -> Result<(), GenerationError> {
        let budget = LengthBudget::compute(10, 1024);
        let result = LeadSentenceSummarizer::new()?
            .summarize("   \n ", &budget)
            .await;
        assert!(matches!(result, Err(GenerationError::EmptyInput)));

        let item = FirstSentenceGenerator::new()?
            .generate(GenerationTask::Flashcard, "", 64)
            .await;
        assert!(matches!(item, Err(GenerationError::EmptyInput)));
        Ok(())
    }

    #[tokio::test]
    async fn flashcards_quote_the_first_sentence() -> Result<(), GenerationError> {
        let generator = FirstSentenceGenerator::new()?;
        let card = generator
            .generate(
                GenerationTask::Flashcard,
                "Chlorophyll absorbs light. Plants are green.",
                64,
            )
            .await?;
        assert_eq!(
            card,
            "Q: What is said about Chlorophyll? A: Chlorophyll absorbs light."
        );

        let question = generator
            .generate(GenerationTask::QuizQuestion, "Chlorophyll absorbs light.", 64)
            .await?;
        assert_eq!(
            question,
            "Which statement about Chlorophyll does the text support?"
        );
        Ok(())
    }

    #[tokio::test]
    async fn one_summarizer_serves_every_chunk() -> Result<(), GenerationError> {
        let summarizer = LeadSentenceSummarizer::new()?;
        let budget = LengthBudget::compute(5, 1024);

        let first = summarizer
            .summarize("Atoms bond. Molecules form.", &budget)
            .await?;
        let second = summarizer
            .summarize("Ions carry charge! Salts dissolve in water.", &budget)
            .await?;

        assert_eq!(first, "Atoms bond. Molecules form.");
        assert_eq!(second, "Ions carry charge!");
        Ok(())
    }
}
