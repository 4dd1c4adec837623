use crate::core::ai::{
    models::{AiConfig, AiMessage, AiProviderResponse},
    AiProvider,
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::error::Error;
use std::time::Duration;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: &str) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AiProvider for OpenAiClient {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut payload = json!({
            "model": config.model,
            "messages": messages,
            "temperature": config.temperature,
        });
        if let Some(max_tokens) = config.max_tokens {
            payload["max_tokens"] = json!(max_tokens);
        }
        if config.json_mode {
            payload["response_format"] = json!({ "type": "json_object" });
        }

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(format!("OpenAI API error: {} - {}", status, text).into());
        }

        let response_json: serde_json::Value = response.json().await?;

        let content = response_json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or("Failed to parse response content")?
            .to_string();
        let total_tokens = response_json["usage"]["total_tokens"]
            .as_u64()
            .map(|t| t as u32);

        Ok(AiProviderResponse {
            content,
            total_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    #[tokio::test]
    async fn posts_chat_completion_and_reads_content() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .header("authorization", "Bearer sk-test")
                .body_includes("\"response_format\"")
                .body_includes("gpt-4o-mini");
            then.status(200).json_body(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"summary\":\"ok\"}"}}],
                "usage": {"total_tokens": 77}
            }));
        });

        let client = OpenAiClient::new("sk-test".to_string(), &server.base_url()).unwrap();
        let response = client
            .chat_complete(
                &[AiMessage::user("hello")],
                &AiConfig::for_model("gpt-4o-mini"),
            )
            .await
            .unwrap();

        mock.assert();
        assert_eq!(response.content, "{\"summary\":\"ok\"}");
        assert_eq!(response.total_tokens, Some(77));
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(429).body("rate limited");
        });

        let client = OpenAiClient::new("sk-test".to_string(), &server.base_url()).unwrap();
        let err = client
            .chat_complete(&[AiMessage::user("hi")], &AiConfig::for_model("m"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("429"));
    }
}
