// Content generator - turns an admin's topic prompt into draft post text.
//
// The provider is a trait so the HTTP layer and tests can swap OpenRouter
// for a stub. Provider failures are logged here and reach callers only as
// a generic upstream error.

use super::models::{AiConfig, AiMessage, AiProviderResponse};
use async_trait::async_trait;
use std::error::Error;
use thiserror::Error;

/// Instruction appended to every topic prompt.
const GENERATION_SUFFIX: &str = "Generate a blog content for this topic in simple text format";

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Prompt is required")]
    EmptyPrompt,

    #[error("Failed to generate content")]
    Upstream,
}

// ============================================================================
// PROVIDER TRAIT (PORT)
// ============================================================================

#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Sends a chat completion request to the AI provider.
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>>;
}

// Lets AiService hold a provider chosen at runtime
#[async_trait]
impl AiProvider for Box<dyn AiProvider> {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>> {
        (**self).chat_complete(messages, config).await
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct AiService<P: AiProvider> {
    provider: P,
    system_prompt: String,
    config: AiConfig,
}

impl<P: AiProvider> AiService<P> {
    pub fn new(provider: P, system_prompt: String, config: AiConfig) -> Self {
        Self {
            provider,
            system_prompt,
            config,
        }
    }

    /// Generate post text for a topic.
    pub async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }

        let messages = [
            AiMessage::system(self.system_prompt.clone()),
            AiMessage::user(format!("{} {}", prompt, GENERATION_SUFFIX)),
        ];

        let response = self
            .provider
            .chat_complete(&messages, &self.config)
            .await
            .map_err(|e| {
                tracing::error!(model = %self.config.model, error = %e, "Content generation failed");
                GenerationError::Upstream
            })?;

        let content = response.content.trim();
        if content.is_empty() {
            tracing::warn!(model = %self.config.model, "Provider returned empty content");
            return Err(GenerationError::Upstream);
        }

        tracing::info!(model = %self.config.model, chars = content.len(), "Content generated");
        Ok(content.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================
