use crate::budget::LengthBudget;
use crate::models::GenerationTask;
use crate::traits::{ItemGenerator, Summarizer};
use crate::GenerationError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_SUMMARIZER_MODEL: &str = "facebook/bart-large-cnn";
pub const DEFAULT_GENERATOR_MODEL: &str = "google/flan-t5-base";

const BACKEND: &str = "huggingface";

#[derive(Debug, Clone)]
pub struct HuggingFaceConfig {
    pub endpoint: String,
    pub api_token: Option<String>,
    pub summarizer_model: String,
    pub generator_model: String,
    pub timeout_secs: u64,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_token: None,
            summarizer_model: DEFAULT_SUMMARIZER_MODEL.to_string(),
            generator_model: DEFAULT_GENERATOR_MODEL.to_string(),
            timeout_secs: 120,
        }
    }
}

/// One hosted model behind the Hugging Face inference API.
struct InferenceModel {
    url: Url,
    api_token: Option<String>,
    client: Client,
}

impl InferenceModel {
    fn new(config: &HuggingFaceConfig, model: &str) -> Result<Self, GenerationError> {
        if model.trim().is_empty() {
            return Err(GenerationError::Request("model name is empty".to_string()));
        }

        let url = Url::parse(&format!(
            "{}/models/{}",
            config.endpoint.trim_end_matches('/'),
            model.trim()
        ))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let api_token = config
            .api_token
            .as_ref()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        Ok(Self {
            url,
            api_token,
            client,
        })
    }

    async fn infer(&self, payload: &Value) -> Result<Value, GenerationError> {
        let mut request = self.client.post(self.url.clone()).json(payload);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let raw = response.text().await?;
        let body = serde_json::from_str::<Value>(&raw).unwrap_or(Value::String(raw));

        if !status.is_success() {
            let details = body
                .pointer("/error")
                .and_then(Value::as_str)
                .map(|error| format!("{status}: {error}"))
                .unwrap_or_else(|| status.to_string());
            return Err(GenerationError::BackendResponse {
                backend: BACKEND.to_string(),
                details,
            });
        }

        Ok(body)
    }
}

pub struct HuggingFaceSummarizer {
    model: InferenceModel,
}

impl HuggingFaceSummarizer {
    pub fn new(config: &HuggingFaceConfig) -> Result<Self, GenerationError> {
        Ok(Self {
            model: InferenceModel::new(config, &config.summarizer_model)?,
        })
    }
}

#[async_trait]
impl Summarizer for HuggingFaceSummarizer {
    async fn summarize(
        &self,
        text: &str,
        budget: &LengthBudget,
    ) -> Result<String, GenerationError> {
        if text.trim().is_empty() {
            return Err(GenerationError::EmptyInput);
        }

        let payload = json!({
            "inputs": text,
            "parameters": {
                "max_length": budget.max_length_tokens,
                "min_length": budget.min_length_tokens,
                "do_sample": false,
            },
        });

        let body = self.model.infer(&payload).await?;
        read_output_field(&body, "summary_text")
    }
}

pub struct HuggingFaceGenerator {
    model: InferenceModel,
}

impl HuggingFaceGenerator {
    pub fn new(config: &HuggingFaceConfig) -> Result<Self, GenerationError> {
        Ok(Self {
            model: InferenceModel::new(config, &config.generator_model)?,
        })
    }
}

#[async_trait]
impl ItemGenerator for HuggingFaceGenerator {
    async fn generate(
        &self,
        task: GenerationTask,
        text: &str,
        max_new_tokens: usize,
    ) -> Result<String, GenerationError> {
        if text.trim().is_empty() {
            return Err(GenerationError::EmptyInput);
        }

        let payload = json!({
            "inputs": task.prompt(text),
            "parameters": {
                "max_new_tokens": max_new_tokens,
                "do_sample": false,
            },
        });

        let body = self.model.infer(&payload).await?;
        read_output_field(&body, "generated_text")
    }
}

/// Pipelines answer `[{"<field>": "..."}]`; some deployments drop the array.
fn read_output_field(body: &Value, field: &str) -> Result<String, GenerationError> {
    if let Some(error) = body.pointer("/error").and_then(Value::as_str) {
        return Err(GenerationError::BackendResponse {
            backend: BACKEND.to_string(),
            details: error.to_string(),
        });
    }

    let first = match body {
        Value::Array(items) => items.first(),
        other => Some(other),
    };

    first
        .and_then(|item| item.get(field))
        .and_then(Value::as_str)
        .map(|text| text.trim().to_string())
        .ok_or_else(|| GenerationError::BackendResponse {
            backend: BACKEND.to_string(),
            details: format!("response has no {field}"),
        })
}
