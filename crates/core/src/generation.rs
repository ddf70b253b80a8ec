use crate::budget::LengthBudget;
use crate::models::{Chunk, ChunkFailure, GenerationResult, GenerationTask};
use crate::traits::{ItemGenerator, Summarizer};
use crate::GenerationError;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct SummaryReport {
    pub summary: String,
    pub outcomes: Vec<GenerationResult<String>>,
    pub failures: Vec<ChunkFailure>,
}

#[derive(Debug, Clone, Default)]
pub struct ItemReport {
    pub items: Vec<String>,
    pub attempted: usize,
    pub failures: Vec<ChunkFailure>,
}

fn non_blank(output: Result<String, GenerationError>) -> Result<String, GenerationError> {
    let text = output?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(GenerationError::Request("model returned empty text".to_string()));
    }
    Ok(trimmed.to_string())
}

fn record_failure(task: GenerationTask, chunk: &Chunk, reason: String) -> ChunkFailure {
    warn!(
        task = task.label(),
        chunk = chunk.index,
        start_offset = chunk.start_offset,
        reason = %reason,
        "chunk generation failed, skipping"
    );
    ChunkFailure {
        task,
        index: chunk.index,
        reason,
    }
}

/// Summarizes every chunk in order, one at a time. Failed chunks are recorded
/// and left out; the rest are joined with single spaces in chunk order.
pub async fn summarize_chunks<I>(
    summarizer: &dyn Summarizer,
    chunks: I,
    budget: &LengthBudget,
) -> SummaryReport
where
    I: IntoIterator<Item = Chunk>,
{
    let mut report = SummaryReport::default();
    let mut parts = Vec::new();

    for chunk in chunks {
        debug!(
            chunk = chunk.index,
            chars = chunk.text.chars().count(),
            "summarizing chunk"
        );
        let outcome: GenerationResult<String> =
            non_blank(summarizer.summarize(&chunk.text, budget).await).into();

        match &outcome {
            GenerationResult::Ok(text) => parts.push(text.clone()),
            GenerationResult::Failed(reason) => report.failures.push(record_failure(
                GenerationTask::Summary,
                &chunk,
                reason.clone(),
            )),
        }
        report.outcomes.push(outcome);
    }

    report.summary = parts.join(" ");
    report
}

/// Generates items from the first `count` chunks only. A failed chunk still
/// uses up its slot, so the result holds at most `count` items.
pub async fn generate_items<I>(
    generator: &dyn ItemGenerator,
    chunks: I,
    count: usize,
    task: GenerationTask,
    max_new_tokens: usize,
) -> ItemReport
where
    I: IntoIterator<Item = Chunk>,
{
    let mut report = ItemReport::default();

    for chunk in chunks.into_iter().take(count) {
        report.attempted += 1;
        debug!(task = task.label(), chunk = chunk.index, "generating item");

        match non_blank(generator.generate(task, &chunk.text, max_new_tokens).await) {
            Ok(item) => report.items.push(item),
            Err(error) => report
                .failures
                .push(record_failure(task, &chunk, error.to_string())),
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::{chunk_text, ChunkingConfig};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Echoes chunk text in brackets, failing on chosen chunk texts.
    #[derive(Default)]
    struct ScriptedModel {
        fail_on: Vec<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn failing_on(fail_on: Vec<&'static str>) -> Self {
            Self {
                fail_on,
                ..Default::default()
            }
        }

        fn respond(&self, text: &str) -> Result<String, GenerationError> {
            self.calls
                .lock()
                .map_err(|_| GenerationError::Request("poisoned".to_string()))?
                .push(text.to_string());
            if self.fail_on.iter().any(|failing| *failing == text) {
                return Err(GenerationError::Request(format!("cannot handle {text}")));
            }
            Ok(format!("[{}]", text.trim()))
        }

        fn call_count(&self) -> usize {
            self.calls.lock().map(|calls| calls.len()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl Summarizer for ScriptedModel {
        async fn summarize(
            &self,
            text: &str,
            _budget: &LengthBudget,
        ) -> Result<String, GenerationError> {
            self.respond(text)
        }
    }

    #[async_trait]
    impl ItemGenerator for ScriptedModel {
        async fn generate(
            &self,
            _task: GenerationTask,
            text: &str,
            _max_new_tokens: usize,
        ) -> Result<String, GenerationError> {
            self.respond(text)
        }
    }

    fn chunks(text: &str, width: usize) -> Vec<Chunk> {
        chunk_text(text, ChunkingConfig::long(width)).collect()
    }

    #[tokio::test]
    async fn failed_summary_chunk_is_skipped_and_named() {
        let model = ScriptedModel::failing_on(vec!["ccc"]);
        let budget = LengthBudget::compute(10, 1024);

        let report = summarize_chunks(&model, chunks("aaabbbcccddd", 3), &budget).await;

        assert_eq!(report.summary, "[aaa] [bbb] [ddd]");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 2);
        assert_eq!(report.failures[0].task, GenerationTask::Summary);
        assert!(report.failures[0].reason.contains("cannot handle ccc"));
        assert_eq!(report.outcomes.len(), 4);
        assert!(matches!(report.outcomes[2], GenerationResult::Failed(_)));
        assert_eq!(model.call_count(), 4);
    }

    #[tokio::test]
    async fn all_chunks_failing_gives_empty_summary() {
        let model = ScriptedModel::failing_on(vec!["ab", "cd"]);
        let budget = LengthBudget::compute(10, 1024);

        let report = summarize_chunks(&model, chunks("abcd", 2), &budget).await;

        assert!(report.summary.is_empty());
        assert_eq!(report.failures.len(), 2);
    }

    #[tokio::test]
    async fn item_generation_touches_only_the_first_n_chunks() {
        let model = ScriptedModel::default();

        let report = generate_items(
            &model,
            chunks("aabbccdd", 2),
            2,
            GenerationTask::Flashcard,
            64,
        )
        .await;

        assert_eq!(report.items, vec!["[aa]", "[bb]"]);
        assert_eq!(report.attempted, 2);
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn fewer_chunks_than_requested_is_not_an_error() {
        let model = ScriptedModel::default();

        let report = generate_items(
            &model,
            chunks("aabb", 2),
            3,
            GenerationTask::QuizQuestion,
            64,
        )
        .await;

        assert_eq!(report.attempted, 2);
        assert_eq!(report.items.len(), 2);
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn failed_item_consumes_its_slot() {
        let model = ScriptedModel::failing_on(vec!["bb"]);

        let report = generate_items(
            &model,
            chunks("aabbccdd", 2),
            3,
            GenerationTask::Flashcard,
            64,
        )
        .await;

        assert_eq!(report.items, vec!["[aa]", "[cc]"]);
        assert_eq!(report.attempted, 3);
        assert_eq!(report.failures[0].index, 1);
        assert_eq!(report.failures[0].task, GenerationTask::Flashcard);
    }

    #[tokio::test]
    async fn blank_model_output_counts_as_failure() {
        struct Silent;

        #[async_trait]
        impl Summarizer for Silent {
            async fn summarize(
                &self,
                _text: &str,
                _budget: &LengthBudget,
            ) -> Result<String, GenerationError> {
                Ok("   ".to_string())
            }
        }

        let budget = LengthBudget::compute(10, 1024);
        let report = summarize_chunks(&Silent, chunks("abc", 5), &budget).await;
        assert!(report.summary.is_empty());
        assert_eq!(report.failures.len(), 1);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if let Ok(mut logs) = self.0.lock() {
                logs.extend_from_slice(buf);
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn chunk_log_counts_characters_not_bytes() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(logs.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let budget = LengthBudget::compute(10, 1024);
        summarize_chunks(&ScriptedModel::default(), chunks("éééé", 4), &budget).await;

        let output = logs
            .0
            .lock()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default();
        assert!(output.contains("chars=4"), "{output}");
    }
}
