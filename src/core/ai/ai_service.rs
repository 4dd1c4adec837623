use super::models::{AiConfig, AiMessage, AiProviderResponse};
use async_trait::async_trait;
use std::error::Error;

#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Sends a chat completion request to the AI provider.
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>>;
}

// Lets AppState hold whichever provider configuration picked.
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

pub struct AiService<P: AiProvider> {
    provider: P,
    config: AiConfig,
}

impl<P: AiProvider> AiService<P> {
    pub fn new(provider: P, config: AiConfig) -> Self {
        Self { provider, config }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// One system prompt, one user prompt, one answer. No retries.
    pub async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        let messages = [AiMessage::system(system_prompt), AiMessage::user(user_prompt)];

        let response = self.provider.chat_complete(&messages, &self.config).await?;
        if let Some(tokens) = response.total_tokens {
            tracing::debug!(model = self.config.model.as_str(), tokens, "AI completion");
        }

        let content = response.content.trim();
        if content.is_empty() {
            return Err("AI provider returned an empty completion".into());
        }
        Ok(content.to_string())
    }
}
