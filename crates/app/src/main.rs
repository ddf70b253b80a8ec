use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use study_pack_core::backends::huggingface::{
    DEFAULT_ENDPOINT, DEFAULT_GENERATOR_MODEL, DEFAULT_SUMMARIZER_MODEL,
};
use study_pack_core::models::{
    DEFAULT_HARD_CAP_TOKENS, DEFAULT_ITEM_MAX_TOKENS, DEFAULT_LONG_CHUNK_CHARS,
    DEFAULT_SHORT_CHUNK_CHARS,
};
use study_pack_core::{
    extract, read_upload, run_pipeline, DocumentFormat, HuggingFaceConfig, ModelConfig,
    ModelRegistry, OversizedSummaryPolicy, PipelineMode, PipelineOptions, StudyParameters,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const PREVIEW_CHARS: usize = 1_000;

#[derive(Parser)]
#[command(name = "study-pack", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Model backend used for summaries and flashcards
    #[arg(long, value_enum, env = "STUDY_PACK_BACKEND", default_value = "offline")]
    backend: Backend,

    /// Hugging Face inference endpoint
    #[arg(long, env = "HF_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    hf_endpoint: String,

    /// Hugging Face API token
    #[arg(long, env = "HF_API_TOKEN", hide_env_values = true)]
    hf_api_token: Option<String>,

    /// Summarization model
    #[arg(long, env = "HF_SUMMARIZER_MODEL", default_value = DEFAULT_SUMMARIZER_MODEL)]
    summarizer_model: String,

    /// Flashcard and quiz question model
    #[arg(long, env = "HF_GENERATOR_MODEL", default_value = DEFAULT_GENERATOR_MODEL)]
    generator_model: String,

    /// Per-request timeout for hosted models, in seconds
    #[arg(long, default_value = "120")]
    timeout_secs: u64,
}

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    Offline,
    Huggingface,
}

#[derive(Subcommand)]
enum Command {
    /// Extract a document and preview its text.
    Inspect {
        /// PDF, DOCX, or TXT file.
        #[arg(long)]
        file: PathBuf,
    },
    /// Build a study pack and write it as a text file.
    Generate(GenerateArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// PDF, DOCX, or TXT file.
    #[arg(long)]
    file: PathBuf,

    /// Desired summary length in words.
    #[arg(long, default_value = "100")]
    words: usize,

    /// Number of flashcards to attempt.
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u8).range(1..=10))]
    flashcards: u8,

    /// Also generate quiz questions.
    #[arg(long, default_value_t = false)]
    quiz: bool,

    /// Number of quiz questions to attempt.
    #[arg(long, default_value = "3", value_parser = clap::value_parser!(u8).range(1..=10))]
    quiz_count: u8,

    /// Only produce the summary section.
    #[arg(long, default_value_t = false)]
    summary_only: bool,

    /// Refuse to summarize when more words are requested than the document has.
    #[arg(long, default_value_t = false)]
    block_oversized: bool,

    /// Where to write the study pack.
    #[arg(long, default_value = "study_pack.txt")]
    output: PathBuf,

    /// Print the run report as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Characters per summarization chunk.
    #[arg(long, default_value_t = DEFAULT_LONG_CHUNK_CHARS)]
    long_chunk_chars: usize,

    /// Characters per flashcard/quiz chunk.
    #[arg(long, default_value_t = DEFAULT_SHORT_CHUNK_CHARS)]
    short_chunk_chars: usize,

    /// Upper bound on summary max_length tokens.
    #[arg(long, default_value_t = DEFAULT_HARD_CAP_TOKENS)]
    hard_cap_tokens: usize,

    /// Token limit for each flashcard or question.
    #[arg(long, default_value_t = DEFAULT_ITEM_MAX_TOKENS)]
    item_max_tokens: usize,
}

impl GenerateArgs {
    fn mode(&self) -> PipelineMode {
        if self.summary_only {
            PipelineMode::SummaryOnly
        } else {
            PipelineMode::StudyPack
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        let range = match self.mode() {
            PipelineMode::SummaryOnly => 10..=1_000,
            PipelineMode::StudyPack => 50..=280,
        };
        if !range.contains(&self.words) {
            anyhow::bail!(
                "--words must be between {} and {} in this mode, got {}",
                range.start(),
                range.end(),
                self.words
            );
        }
        if self.long_chunk_chars == 0 || self.short_chunk_chars == 0 {
            anyhow::bail!("chunk widths must be greater than zero");
        }
        Ok(())
    }

    fn options(&self) -> PipelineOptions {
        PipelineOptions {
            mode: self.mode(),
            long_chunk_chars: self.long_chunk_chars,
            short_chunk_chars: self.short_chunk_chars,
            hard_cap_tokens: self.hard_cap_tokens,
            item_max_tokens: self.item_max_tokens,
            oversized_summary: if self.block_oversized {
                OversizedSummaryPolicy::Block
            } else {
                OversizedSummaryPolicy::Warn
            },
        }
    }

    fn parameters(&self) -> StudyParameters {
        StudyParameters {
            desired_words: self.words,
            num_flashcards: usize::from(self.flashcards),
            generate_quiz: self.quiz,
            num_quiz: usize::from(self.quiz_count),
        }
    }
}

impl Cli {
    fn model_config(&self) -> ModelConfig {
        match self.backend {
            Backend::Offline => ModelConfig::Offline,
            Backend::Huggingface => ModelConfig::HuggingFace(HuggingFaceConfig {
                endpoint: self.hf_endpoint.clone(),
                api_token: self.hf_api_token.clone(),
                summarizer_model: self.summarizer_model.clone(),
                generator_model: self.generator_model.clone(),
                timeout_secs: self.timeout_secs,
            }),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let model_config = cli.model_config();
    info!(
        version = app_version,
        backend = model_config.name(),
        started_at = %Utc::now().to_rfc3339(),
        "study-pack boot"
    );

    match cli.command {
        Command::Inspect { file } => {
            let (filename, bytes) = read_upload(&file)?;
            let format = DocumentFormat::from_filename(&filename)?;
            let text = extract(&bytes, format)?;

            println!("✅ Extracted {} characters.", text.chars().count());
            println!("words: {}", text.split_whitespace().count());
            let preview: String = text.chars().take(PREVIEW_CHARS).collect();
            println!("{preview}");
        }
        Command::Generate(args) => {
            args.validate()?;
            let registry = ModelRegistry::from_config(model_config);
            let (filename, bytes) = read_upload(&args.file)?;

            let outcome = run_pipeline(
                args.options(),
                &filename,
                bytes,
                args.parameters(),
                &registry,
            )
            .await?;

            for warning in &outcome.warnings {
                warn!(run_id = %outcome.run_id, %warning, "study pack warning");
                println!("⚠️ {warning}");
            }

            tokio::fs::write(&args.output, outcome.render()).await?;
            println!(
                "Using max_length={}, min_length={}",
                outcome.budget.max_length_tokens, outcome.budget.min_length_tokens
            );
            println!(
                "study pack written to {} at {}",
                args.output.display(),
                outcome.generated_at.to_rfc3339()
            );

            if args.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            }
        }
    }

    Ok(())
}
