pub mod assembler;
pub mod backends;
pub mod budget;
pub mod chunking;
pub mod error;
pub mod extractor;
pub mod generation;
pub mod models;
pub mod orchestrator;
pub mod registry;
pub mod traits;

pub use assembler::{assemble, render};
pub use backends::{
    FirstSentenceGenerator, HuggingFaceConfig, HuggingFaceGenerator, HuggingFaceSummarizer,
    LeadSentenceSummarizer,
};
pub use budget::LengthBudget;
pub use chunking::{chunk_count, chunk_text, normalize_whitespace, ChunkingConfig, Chunks};
pub use error::{ExtractError, GenerationError, PipelineError, Result};
pub use extractor::{
    extract, normalize_extracted_text, read_upload, DocxExtractor, LopdfExtractor,
    PlainTextExtractor, TextExtractor,
};
pub use generation::{generate_items, summarize_chunks, ItemReport, SummaryReport};
pub use models::{
    Chunk, ChunkFailure, ChunkPolicy, Document, DocumentFormat, GenerationResult, GenerationTask,
    OversizedSummaryPolicy, PipelineMode, PipelineOptions, PipelineWarning, StudyPack,
    StudyPackOutcome, StudyParameters,
};
pub use orchestrator::{run_pipeline, PipelineState, StudyPackPipeline};
pub use registry::{ModelConfig, ModelRegistry};
pub use traits::{ItemGenerator, Summarizer};
