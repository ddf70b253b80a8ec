use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("{format} extraction failed: {details}")]
    Extraction { format: String, details: String },

    #[error("text is not valid utf-8 (first invalid byte at offset {valid_up_to}): {details}")]
    Decoding { valid_up_to: usize, details: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("generation request failed: {0}")]
    Request(String),

    #[error("input text is empty")]
    EmptyInput,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("cannot {action} while pipeline is {state}")]
    InvalidTransition { state: String, action: String },

    #[error("requested {requested} summary words but the document only has {available}")]
    SummaryLengthExceedsDocument { requested: usize, available: usize },

    #[error("model unavailable: {0}")]
    ModelUnavailable(GenerationError),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
