//! services/api/src/adapters/expansion_llm.rs
//!
//! Adapter for the expansion-suggestion LLM, implementing the
//! `ExpansionService` port.

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
use idea_polisher_core::ports::{ExpansionService, PortError, PortResult};

const SYSTEM_PROMPT: &str = "You are a strategic advisor. Given a polished project outline, \
suggest ways the idea could be expanded: adjacent markets, partnerships, follow-on features \
or growth angles. Respond with a short markdown bullet list (3 to 6 bullets), nothing else.";

/// An adapter that implements `ExpansionService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiExpansionAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiExpansionAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl ExpansionService for OpenAiExpansionAdapter {
    /// Derives expansion suggestions from the polished outline.
    async fn expand(&self, polished_outline: &str) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_PROMPT)
                .build()
                .map_err(|e| PortError::Service(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(format!(
                    "Suggest expansion opportunities for this outline:\n\n{}",
                    polished_outline
                ))
                .build()
                .map_err(|e| PortError::Service(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Service(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Service(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Service("Expansion LLM returned no text content.".to_string())
            })
    }
}
