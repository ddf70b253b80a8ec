use crate::backends::{
    FirstSentenceGenerator, HuggingFaceConfig, HuggingFaceGenerator, HuggingFaceSummarizer,
    LeadSentenceSummarizer,
};
use crate::traits::{ItemGenerator, Summarizer};
use crate::GenerationError;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

type SummarizerFactory =
    Box<dyn Fn() -> Result<Arc<dyn Summarizer>, GenerationError> + Send + Sync>;
type GeneratorFactory =
    Box<dyn Fn() -> Result<Arc<dyn ItemGenerator>, GenerationError> + Send + Sync>;

#[derive(Debug, Clone)]
pub enum ModelConfig {
    Offline,
    HuggingFace(HuggingFaceConfig),
}

impl ModelConfig {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::HuggingFace(_) => "huggingface",
        }
    }
}

/// Process-wide model handles, each constructed on first use and reused for
/// every later run. A failed construction leaves the cell empty so the next
/// run tries again.
pub struct ModelRegistry {
    summarizer: OnceCell<Arc<dyn Summarizer>>,
    generator: OnceCell<Arc<dyn ItemGenerator>>,
    summarizer_factory: SummarizerFactory,
    generator_factory: GeneratorFactory,
}

impl ModelRegistry {
    pub fn from_config(config: ModelConfig) -> Self {
        match config {
            ModelConfig::Offline => Self::from_factories(
                || Ok(Arc::new(LeadSentenceSummarizer::new()?) as Arc<dyn Summarizer>),
                || Ok(Arc::new(FirstSentenceGenerator::new()?) as Arc<dyn ItemGenerator>),
            ),
            ModelConfig::HuggingFace(hf) => {
                let generator_config = hf.clone();
                Self::from_factories(
                    move || Ok(Arc::new(HuggingFaceSummarizer::new(&hf)?) as Arc<dyn Summarizer>),
                    move || {
                        Ok(Arc::new(HuggingFaceGenerator::new(&generator_config)?)
                            as Arc<dyn ItemGenerator>)
                    },
                )
            }
        }
    }

    pub fn from_factories<S, G>(summarizer_factory: S, generator_factory: G) -> Self
    where
        S: Fn() -> Result<Arc<dyn Summarizer>, GenerationError> + Send + Sync + 'static,
        G: Fn() -> Result<Arc<dyn ItemGenerator>, GenerationError> + Send + Sync + 'static,
    {
        Self {
            summarizer: OnceCell::new(),
            generator: OnceCell::new(),
            summarizer_factory: Box::new(summarizer_factory),
            generator_factory: Box::new(generator_factory),
        }
    }

    pub async fn summarizer(&self) -> Result<&dyn Summarizer, GenerationError> {
        let model = self
            .summarizer
            .get_or_try_init(|| async {
                info!("loading summarization model");
                (self.summarizer_factory)()
            })
            .await?;
        Ok(model.as_ref())
    }

    pub async fn item_generator(&self) -> Result<&dyn ItemGenerator, GenerationError> {
        let model = self
            .generator
            .get_or_try_init(|| async {
                info!("loading item generation model");
                (self.generator_factory)()
            })
            .await?;
        Ok(model.as_ref())
    }

    pub fn is_summarizer_loaded(&self) -> bool {
        self.summarizer.initialized()
    }

    pub fn is_item_generator_loaded(&self) -> bool {
        self.generator.initialized()
    }
}
