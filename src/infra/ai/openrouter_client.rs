// OpenRouter chat completions, used to draft blog articles.

use crate::core::ai::{AiConfig, AiMessage, AiProvider, AiProviderResponse};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error;

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
/// Shown on the OpenRouter dashboard next to our usage.
const APP_TITLE: &str = "Blog Moderation API";

pub struct OpenRouterClient {
    client: Client,
    api_key: String,
}

impl OpenRouterClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [AiMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl<'a> CompletionRequest<'a> {
    fn new(messages: &'a [AiMessage], config: &'a AiConfig) -> Self {
        Self {
            model: &config.model,
            messages,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl CompletionResponse {
    /// Text of the first choice, if the model produced any.
    fn into_article(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
    }
}

#[async_trait]
impl AiProvider for OpenRouterClient {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>> {
        let response = self
            .client
            .post(OPENROUTER_URL)
            .bearer_auth(&self.api_key)
            .header("X-Title", APP_TITLE)
            .json(&CompletionRequest::new(messages, config))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(format!("OpenRouter returned {} for {}: {}", status, config.model, text).into());
        }

        let completion: CompletionResponse = response.json().await?;
        let content = completion
            .into_article()
            .ok_or("OpenRouter returned no article text")?;

        Ok(AiProviderResponse { content })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_carries_generation_settings() {
        let messages = vec![AiMessage::system("sys"), AiMessage::user("Rust")];
        let mut config = AiConfig::new("some/model");
        config.temperature = 0.2;
        config.max_tokens = None;

        let body = serde_json::to_value(CompletionRequest::new(&messages, &config)).unwrap();
        assert_eq!(body["model"], "some/model");
        assert_eq!(body["messages"][1]["content"], "Rust");
        assert!((body["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
        assert!(body.get("max_tokens").is_none());

        let body =
            serde_json::to_value(CompletionRequest::new(&messages, &AiConfig::new("m"))).unwrap();
        assert_eq!(body["max_tokens"], 2048);
    }

    #[test]
    fn test_first_choice_is_the_article() {
        let completion: CompletionResponse = serde_json::from_value(json!({
            "choices": [
                { "message": { "role": "assistant", "content": "Hello" } },
                { "message": { "role": "assistant", "content": "Ignored" } }
            ]
        }))
        .unwrap();
        assert_eq!(completion.into_article().as_deref(), Some("Hello"));
    }

    #[test]
    fn test_missing_or_blank_article() {
        let empty: CompletionResponse = serde_json::from_value(json!({ "error": "quota" })).unwrap();
        assert_eq!(empty.into_article(), None);

        let blank: CompletionResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "content": "  " } }]
        }))
        .unwrap();
        assert_eq!(blank.into_article(), None);

        let null: CompletionResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "content": null } }]
        }))
        .unwrap();
        assert_eq!(null.into_article(), None);
    }
}
