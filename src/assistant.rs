//! Remote assistant responder
//!
//! One blocking chat-completion request per turn. No conversation memory
//! is kept: each turn stands alone.

use async_trait::async_trait;

use crate::daemon::Responder;
use crate::{Error, Result};

/// Default instruction for spoken replies
const DEFAULT_SYSTEM_PROMPT: &str = "You are a voice assistant. Answer immediately and \
concisely in one or two short sentences, with no filler phrases and no emoji. Keep a \
friendly, natural tone.";

#[derive(serde::Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(serde::Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(serde::Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Chat-completion responder
pub struct ChatResponder {
    client: reqwest::Client,
    api_key: String,
    model: String,
    system_prompt: String,
    max_tokens: u32,
    temperature: f32,
}

impl ChatResponder {
    /// Create a responder
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(
        api_key: String,
        model: String,
        system_prompt: Option<String>,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for the assistant".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            system_prompt: system_prompt.unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            max_tokens,
            temperature,
        })
    }
}

#[async_trait(?Send)]
impl Responder for ChatResponder {
    async fn reply(&self, text: &str) -> Result<String> {
        tracing::debug!(model = %self.model, "requesting assistant reply");

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Assistant(format!(
                "chat completion error {status}: {body}"
            )));
        }

        let result: ChatResponse = response.json().await?;

        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(Error::Assistant("empty completion content".to_string()));
        }

        Ok(content)
    }
}
