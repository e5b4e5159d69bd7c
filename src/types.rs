//! OpenAI-style payloads sent to the proxy
//!
//! Request bodies are typed so the exact JSON each endpoint receives is
//! fixed in one place. Most response bodies are kept as `serde_json::Value`
//! because the checks only care about the status code; the completion format
//! check deserializes into [`CompletionResponse`] instead.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body for `/key/generate` and `/user/new`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyRequest {
    pub models: Vec<String>,
    /// `None` serializes as `null`, meaning the key never expires
    pub duration: Option<String>,
}

impl KeyRequest {
    pub fn without_expiry(models: &[String]) -> Self {
        Self {
            models: models.to_vec(),
            duration: None,
        }
    }
}

/// Response from `/key/generate` and `/user/new`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedKey {
    pub key: String,
    /// Everything else the proxy reports about the key (expiry, user id, spend)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// The conversation every chat check sends
pub fn greeting_messages() -> Vec<ChatMessage> {
    vec![
        ChatMessage::system("You are a helpful assistant."),
        ChatMessage::user("Hello!"),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            max_tokens: None,
            temperature: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    pub model: String,
    pub input: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageGenerationRequest {
    pub model: String,
    pub prompt: String,
}

/// Text completion response in the OpenAI wire format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub model: String,
    pub choices: Vec<CompletionChoice>,
    #[serde(default)]
    pub usage: Option<CompletionUsage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionChoice {
    pub text: String,
    pub index: u32,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Result of an image generation call
#[derive(Debug, Clone, PartialEq)]
pub enum ImageOutcome {
    /// 200, with the parsed body when it was JSON
    Generated(Option<Value>),
    /// Non-200 whose body carried the upstream connection-error marker.
    /// Only produced while the tolerance is enabled in the config.
    UpstreamUnavailable { status: u16 },
}

impl ImageOutcome {
    pub fn is_generated(&self) -> bool {
        matches!(self, Self::Generated(_))
    }
}
