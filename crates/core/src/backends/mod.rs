pub mod huggingface;
pub mod offline;

pub use huggingface::{HuggingFaceConfig, HuggingFaceGenerator, HuggingFaceSummarizer};
pub use offline::{FirstSentenceGenerator, LeadSentenceSummarizer};
