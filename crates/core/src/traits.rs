use crate::budget::LengthBudget;
use crate::models::GenerationTask;
use crate::GenerationError;
use async_trait::async_trait;

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        text: &str,
        budget: &LengthBudget,
    ) -> Result<String, GenerationError>;
}

/// Produces one flashcard or quiz question from a short chunk, greedily
/// (no sampling) and bounded by `max_new_tokens`.
#[async_trait]
pub trait ItemGenerator: Send + Sync {
    async fn generate(
        &self,
        task: GenerationTask,
        text: &str,
        max_new_tokens: usize,
    ) -> Result<String, GenerationError>;
}
