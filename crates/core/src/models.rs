use crate::budget::LengthBudget;
use crate::error::ExtractError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

pub const DEFAULT_LONG_CHUNK_CHARS: usize = 1_000;
pub const DEFAULT_SHORT_CHUNK_CHARS: usize = 300;
pub const DEFAULT_HARD_CAP_TOKENS: usize = 1_024;
pub const DEFAULT_ITEM_MAX_TOKENS: usize = 64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Txt,
}

impl DocumentFormat {
    pub fn from_extension(extension: &str) -> Result<Self, ExtractError> {
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "txt" => Ok(Self::Txt),
            other => Err(ExtractError::UnsupportedFormat(format!(".{other}"))),
        }
    }

    /// Infers the format from the extension of an uploaded file name.
    pub fn from_filename(filename: &str) -> Result<Self, ExtractError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| {
                ExtractError::UnsupportedFormat(format!("{filename} has no file extension"))
            })?;

        Self::from_extension(extension)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Txt => "txt",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub filename: String,
    pub raw_bytes: Vec<u8>,
    pub declared_format: DocumentFormat,
    pub extracted_text: String,
    pub checksum: String,
}

impl Document {
    pub fn new(
        filename: impl Into<String>,
        raw_bytes: Vec<u8>,
        declared_format: DocumentFormat,
        extracted_text: String,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(&raw_bytes);
        Self {
            filename: filename.into(),
            checksum: format!("{:x}", hasher.finalize()),
            raw_bytes,
            declared_format,
            extracted_text,
        }
    }

    pub fn word_count(&self) -> usize {
        self.extracted_text.split_whitespace().count()
    }

    pub fn char_count(&self) -> usize {
        self.extracted_text.chars().count()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChunkPolicy {
    Long,
    Short,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    /// Offset of the first character, counted in chars rather than bytes.
    pub start_offset: usize,
    pub text: String,
    pub policy: ChunkPolicy,
}

/// Per-chunk capability outcome. Failures are kept as values so no error
/// crosses an invocation loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult<T> {
    Ok(T),
    Failed(String),
}

impl<T, E: fmt::Display> From<Result<T, E>> for GenerationResult<T> {
    fn from(value: Result<T, E>) -> Self {
        match value {
            Ok(output) => Self::Ok(output),
            Err(error) => Self::Failed(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GenerationTask {
    Summary,
    Flashcard,
    QuizQuestion,
}

impl GenerationTask {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Flashcard => "flashcard",
            Self::QuizQuestion => "quiz question",
        }
    }

    /// Frames a short chunk for the item generation model.
    pub fn prompt(&self, text: &str) -> String {
        match self {
            Self::Summary => text.to_string(),
            Self::Flashcard => {
                format!("Generate a flashcard question and answer from this text: {text}")
            }
            Self::QuizQuestion => format!("Generate a quiz question from this text: {text}"),
        }
    }
}

impl fmt::Display for GenerationTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkFailure {
    pub task: GenerationTask,
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineWarning {
    EmptyDocument { filename: String },
    SummaryLengthExceedsDocument { requested: usize, available: usize },
    ChunkFailed(ChunkFailure),
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDocument { filename } => {
                write!(f, "{filename} contains no extractable text")
            }
            Self::SummaryLengthExceedsDocument {
                requested,
                available,
            } => write!(
                f,
                "requested {requested} summary words but the document only has {available}"
            ),
            Self::ChunkFailed(failure) => write!(
                f,
                "{} chunk {} failed: {}",
                failure.task, failure.index, failure.reason
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudyPack {
    pub summary: String,
    /// `None` when flashcards were not requested (summary-only runs).
    pub flashcards: Option<Vec<String>>,
    /// `None` when quiz generation was not requested.
    pub quiz_questions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudyParameters {
    pub desired_words: usize,
    pub num_flashcards: usize,
    pub generate_quiz: bool,
    pub num_quiz: usize,
}

impl Default for StudyParameters {
    fn default() -> Self {
        Self {
            desired_words: 100,
            num_flashcards: 5,
            generate_quiz: false,
            num_quiz: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipelineMode {
    SummaryOnly,
    #[default]
    StudyPack,
}

/// What to do when more summary words are requested than the document holds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OversizedSummaryPolicy {
    #[default]
    Warn,
    Block,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub mode: PipelineMode,
    pub long_chunk_chars: usize,
    pub short_chunk_chars: usize,
    pub hard_cap_tokens: usize,
    pub item_max_tokens: usize,
    pub oversized_summary: OversizedSummaryPolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            mode: PipelineMode::default(),
            long_chunk_chars: DEFAULT_LONG_CHUNK_CHARS,
            short_chunk_chars: DEFAULT_SHORT_CHUNK_CHARS,
            hard_cap_tokens: DEFAULT_HARD_CAP_TOKENS,
            item_max_tokens: DEFAULT_ITEM_MAX_TOKENS,
            oversized_summary: OversizedSummaryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StudyPackOutcome {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub budget: LengthBudget,
    pub pack: StudyPack,
    pub warnings: Vec<PipelineWarning>,
}

impl StudyPackOutcome {
    pub fn render(&self) -> String {
        crate::assembler::render(&self.pack)
    }
}
