//! services/api/src/adapters/category_llm.rs
//!
//! Adapter for the category-extraction LLM, implementing the
//! `CategoryService` port.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use idea_polisher_core::domain::DEFAULT_CATEGORY;
use idea_polisher_core::ports::{CategoryService, PortError, PortResult};

const SYSTEM_PROMPT: &str = "You are a classification assistant. Classify the given project \
outline into exactly one of these categories: Business, Technology, Creative, Personal, \
Education, Health, General. Respond with ONLY the category label, no quotes, no explanation.";

/// An adapter that implements `CategoryService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiCategoryAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiCategoryAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl CategoryService for OpenAiCategoryAdapter {
    /// Classifies the polished outline into a single category label.
    async fn classify(&self, polished_outline: &str) -> PortResult<String> {
        let preview = polished_outline.chars().take(1000).collect::<String>();

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_PROMPT)
                .build()
                .map_err(|e| PortError::Service(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(format!("Classify this outline:\n\n{}", preview))
                .build()
                .map_err(|e| PortError::Service(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_tokens(10u32)
            .build()
            .map_err(|e| PortError::Service(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Service(e.to_string()))?;

        let label = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default();

        if label.is_empty() {
            Ok(DEFAULT_CATEGORY.to_string())
        } else {
            Ok(label)
        }
    }
}
