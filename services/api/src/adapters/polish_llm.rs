//! services/api/src/adapters/polish_llm.rs
//!
//! This module contains the adapter for the note-polishing LLM.
//! It implements the `PolishingService` port from the `core` crate.

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
use idea_polisher_core::ports::{PolishingService, PortError, PortResult};

const SYSTEM_PROMPT: &str = "You are an expert editor who turns messy, stream-of-consciousness \
notes into a clean, structured project outline. Rewrite the user's notes as markdown: begin \
with a single '# ' title line naming the project, then organized sections with concise bullet \
points. Preserve every concrete detail from the notes and do not invent facts. Respond with \
the markdown document only, no commentary.";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `PolishingService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiPolishAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiPolishAdapter {
    /// Creates a new `OpenAiPolishAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `PolishingService` Trait Implementation
//=========================================================================================

#[async_trait]
impl PolishingService for OpenAiPolishAdapter {
    /// Reformats the raw notes into a structured markdown outline.
    async fn polish(&self, raw_notes: &str) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_PROMPT)
                .build()
                .map_err(|e| PortError::Service(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(raw_notes.to_string())
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

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Service(e.to_string()))?;

        // Extract the text content from the first choice in the response.
        if let Some(choice) = response.choices.into_iter().next() {
            if let Some(content) = choice.message.content {
                Ok(content)
            } else {
                Err(PortError::Service(
                    "Polishing LLM response contained no text content.".to_string(),
                ))
            }
        } else {
            Err(PortError::Service(
                "Polishing LLM returned no choices in its response.".to_string(),
            ))
        }
    }
}
