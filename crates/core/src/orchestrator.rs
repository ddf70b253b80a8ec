use crate::assembler::assemble;
use crate::budget::LengthBudget;
use crate::chunking::{chunk_text, ChunkingConfig};
use crate::extractor::extract;
use crate::generation::{generate_items, summarize_chunks};
use crate::models::{
    Document, DocumentFormat, GenerationTask, OversizedSummaryPolicy, PipelineMode,
    PipelineOptions, PipelineWarning, StudyPackOutcome, StudyParameters,
};
use crate::registry::ModelRegistry;
use crate::{PipelineError, Result};
use chrono::Utc;
use serde::Serialize;
use std::fmt;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Uploaded,
    Extracted,
    ParametersSet,
    Generating,
    Complete,
    Error,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Uploaded => "uploaded",
            Self::Extracted => "extracted",
            Self::ParametersSet => "parameters_set",
            Self::Generating => "generating",
            Self::Complete => "complete",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
struct Upload {
    filename: String,
    bytes: Vec<u8>,
    format: DocumentFormat,
}

/// One upload-to-download run. Transitions are linear and each runs at most
/// once; a fatal error parks the pipeline in `Error` with no artifact.
pub struct StudyPackPipeline {
    run_id: Uuid,
    options: PipelineOptions,
    state: PipelineState,
    upload: Option<Upload>,
    document: Option<Document>,
    parameters: Option<StudyParameters>,
    outcome: Option<StudyPackOutcome>,
}

impl StudyPackPipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            options,
            state: PipelineState::Idle,
            upload: None,
            document: None,
            parameters: None,
            outcome: None,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn outcome(&self) -> Option<&StudyPackOutcome> {
        self.outcome.as_ref()
    }

    pub fn upload(&mut self, filename: &str, bytes: Vec<u8>) -> Result<()> {
        self.require(PipelineState::Idle, "upload a file")?;

        let format = match DocumentFormat::from_filename(filename) {
            Ok(format) => format,
            Err(error) => return Err(self.fail(error.into())),
        };

        info!(run_id = %self.run_id, filename, %format, bytes = bytes.len(), "file uploaded");
        self.upload = Some(Upload {
            filename: filename.to_string(),
            bytes,
            format,
        });
        self.state = PipelineState::Uploaded;
        Ok(())
    }

    pub fn extract(&mut self) -> Result<&Document> {
        self.require(PipelineState::Uploaded, "extract text")?;
        let Some(upload) = self.upload.take() else {
            return Err(self.invalid_transition("extract text"));
        };

        let text = match extract(&upload.bytes, upload.format) {
            Ok(text) => text,
            Err(error) => return Err(self.fail(error.into())),
        };

        let document = Document::new(upload.filename, upload.bytes, upload.format, text);
        info!(
            run_id = %self.run_id,
            chars = document.char_count(),
            words = document.word_count(),
            checksum = %document.checksum,
            "text extracted"
        );
        self.state = PipelineState::Extracted;
        Ok(self.document.insert(document))
    }

    pub fn set_parameters(&mut self, parameters: StudyParameters) -> Result<()> {
        self.require(PipelineState::Extracted, "set parameters")?;
        self.parameters = Some(parameters);
        self.state = PipelineState::ParametersSet;
        Ok(())
    }

    pub async fn generate(&mut self, registry: &ModelRegistry) -> Result<&StudyPackOutcome> {
        self.require(PipelineState::ParametersSet, "generate")?;
        let (Some(document), Some(parameters)) = (self.document.as_ref(), self.parameters) else {
            return Err(self.invalid_transition("generate"));
        };

        self.state = PipelineState::Generating;
        let generated =
            generate_outcome(self.run_id, &self.options, document, parameters, registry).await;

        match generated {
            Ok(outcome) => {
                info!(
                    run_id = %self.run_id,
                    warnings = outcome.warnings.len(),
                    "study pack complete"
                );
                self.state = PipelineState::Complete;
                Ok(self.outcome.insert(outcome))
            }
            Err(error) => Err(self.fail(error)),
        }
    }

    fn require(&self, expected: PipelineState, action: &str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.invalid_transition(action))
        }
    }

    fn invalid_transition(&self, action: &str) -> PipelineError {
        PipelineError::InvalidTransition {
            state: self.state.to_string(),
            action: action.to_string(),
        }
    }

    fn fail(&mut self, error: PipelineError) -> PipelineError {
        error!(run_id = %self.run_id, from = %self.state, %error, "pipeline failed");
        self.state = PipelineState::Error;
        error
    }
}

async fn generate_outcome(
    run_id: Uuid,
    options: &PipelineOptions,
    document: &Document,
    parameters: StudyParameters,
    registry: &ModelRegistry,
) -> Result<StudyPackOutcome> {
    let mut warnings = Vec::new();
    let text = document.extracted_text.as_str();

    if text.trim().is_empty() {
        warn!(run_id = %run_id, filename = %document.filename, "document has no text");
        warnings.push(PipelineWarning::EmptyDocument {
            filename: document.filename.clone(),
        });
    }

    let budget = LengthBudget::compute(parameters.desired_words, options.hard_cap_tokens);
    let available = document.word_count();
    if budget.exceeds(available) {
        warn!(
            run_id = %run_id,
            requested = budget.desired_words,
            available,
            "summary length exceeds document length"
        );
        if options.oversized_summary == OversizedSummaryPolicy::Block {
            return Err(PipelineError::SummaryLengthExceedsDocument {
                requested: budget.desired_words,
                available,
            });
        }
        warnings.push(PipelineWarning::SummaryLengthExceedsDocument {
            requested: budget.desired_words,
            available,
        });
    }

    info!(
        run_id = %run_id,
        max_length = budget.max_length_tokens,
        min_length = budget.min_length_tokens,
        "summarizing"
    );
    let summarizer = registry
        .summarizer()
        .await
        .map_err(PipelineError::ModelUnavailable)?;
    let summary = summarize_chunks(
        summarizer,
        chunk_text(text, ChunkingConfig::long(options.long_chunk_chars)),
        &budget,
    )
    .await;
    warnings.extend(summary.failures.into_iter().map(PipelineWarning::ChunkFailed));

    let (flashcards, quiz_questions, include_quiz) = match options.mode {
        PipelineMode::SummaryOnly => (None, Vec::new(), false),
        PipelineMode::StudyPack => {
            let generator = registry
                .item_generator()
                .await
                .map_err(PipelineError::ModelUnavailable)?;
            let short_chunks = ChunkingConfig::short(options.short_chunk_chars);

            let flashcards = generate_items(
                generator,
                chunk_text(text, short_chunks),
                parameters.num_flashcards,
                GenerationTask::Flashcard,
                options.item_max_tokens,
            )
            .await;
            warnings.extend(flashcards.failures.into_iter().map(PipelineWarning::ChunkFailed));

            let mut quiz_questions = Vec::new();
            if parameters.generate_quiz {
                let quiz = generate_items(
                    generator,
                    chunk_text(text, short_chunks),
                    parameters.num_quiz,
                    GenerationTask::QuizQuestion,
                    options.item_max_tokens,
                )
                .await;
                warnings.extend(quiz.failures.into_iter().map(PipelineWarning::ChunkFailed));
                quiz_questions = quiz.items;
            }

            (Some(flashcards.items), quiz_questions, parameters.generate_quiz)
        }
    };

    Ok(StudyPackOutcome {
        run_id,
        generated_at: Utc::now(),
        source: document.filename.clone(),
        budget,
        pack: assemble(&summary.summary, flashcards, quiz_questions, include_quiz),
        warnings,
    })
}

/// Runs every transition back to back for a single upload.
pub async fn run_pipeline(
    options: PipelineOptions,
    filename: &str,
    bytes: Vec<u8>,
    parameters: StudyParameters,
    registry: &ModelRegistry,
) -> Result<StudyPackOutcome> {
    let mut pipeline = StudyPackPipeline::new(options);
    pipeline.upload(filename, bytes)?;
    pipeline.extract()?;
    pipeline.set_parameters(parameters)?;
    let outcome = pipeline.generate(registry).await?;
    Ok(outcome.clone())
}
