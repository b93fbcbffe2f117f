//! Model providers.
//!
//! A provider turns a prompt plus conversation history into a response
//! text and an updated history. The core pipeline only ever sees this
//! contract; request shaping, authentication, and retry-on-transient-failure
//! all live inside the provider implementation.

use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};

/// One turn in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system`, `user`, or `assistant`.
    pub role: String,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// A user-role message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// An assistant-role message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Seed a history with the explanation prompt and a primed acknowledgement.
///
/// Every batch request replays this pair so the model keeps the
/// classification instructions in context without resending them verbatim.
pub fn craft_history(user_message: &str, assistant_message: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::user(user_message),
        ChatMessage::assistant(assistant_message),
    ]
}

/// A language model that can be evaluated.
pub trait ModelProvider {
    /// Model identifier, used in file names and metrics rows.
    fn model(&self) -> &str;

    /// Send `prompt` with the given history; return the reply text and the
    /// updated history (history + prompt + reply).
    fn chat(&self, prompt: &str, history: &[ChatMessage]) -> Result<(String, Vec<ChatMessage>)>;
}

/// Chat completion request body (OpenAI-compatible endpoints).
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// Provider for OpenAI-compatible chat completion APIs (OpenAI, Mistral,
/// OpenRouter, and most self-hosted gateways).
#[derive(Debug)]
pub struct OpenAiCompatProvider {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: Option<f32>,
    max_retries: u32,
}

impl OpenAiCompatProvider {
    /// Create a provider for `model` against `base_url` (the API root, e.g.
    /// `https://api.openai.com/v1`).
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
            temperature: None,
            max_retries: 3,
        })
    }

    /// Fix the sampling temperature sent with every request.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set how many times a failed request is retried before giving up.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn request_once(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().unwrap_or_default();
            return Err(EvalError::Provider(format!(
                "{} returned {status}: {text}",
                self.model
            )));
        }

        let parsed: ChatCompletionResponse = response.json()?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| EvalError::Provider(format!("{} returned no choices", self.model)))
    }
}

impl ModelProvider for OpenAiCompatProvider {
    fn model(&self) -> &str {
        &self.model
    }

    fn chat(&self, prompt: &str, history: &[ChatMessage]) -> Result<(String, Vec<ChatMessage>)> {
        let mut messages = history.to_vec();
        messages.push(ChatMessage::user(prompt));

        let mut last_err = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = Duration::from_secs(2u64.saturating_pow(attempt));
                tracing::warn!(
                    model = %self.model,
                    attempt,
                    backoff_secs = backoff.as_secs(),
                    "retrying chat request"
                );
                thread::sleep(backoff);
            }
            match self.request_once(&messages) {
                Ok(reply) => {
                    messages.push(ChatMessage::assistant(reply.clone()));
                    return Ok((reply, messages));
                }
                Err(err) => {
                    tracing::warn!(model = %self.model, error = %err, "chat request failed");
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            EvalError::Provider(format!("{} failed with no recorded error", self.model))
        }))
    }
}
