use async_trait::async_trait;
use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::ChatMessage;

use planner_core::Settings;

use crate::{GenerateError, Generator};

/// Gemini-backed [`Generator`] using the `llm` crate's Google backend.
#[derive(Debug, Clone)]
pub struct GeminiGenerator {
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl GeminiGenerator {
    pub fn new(settings: &Settings) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let llm = LLMBuilder::new()
            .backend(LLMBackend::Google)
            .api_key(&self.api_key)
            .model(&self.model)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(|e| GenerateError::Build(e.to_string()))?;

        let messages = vec![ChatMessage::user().content(prompt).build()];

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "sending prompt");
        let response = llm
            .chat(&messages)
            .await
            .map_err(|e| GenerateError::Request(e.to_string()))?;

        match response.text() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(GenerateError::Empty),
        }
    }
}
