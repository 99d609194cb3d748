use serde::{Deserialize, Deserializer, Serialize};

use crate::transform::DEFAULT_MODEL;

/// OpenAI Chat Completions request (the subset this proxy reads)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatRequest {
    /// Conversation history; only the last entry is forwarded
    pub messages: Vec<ChatMessage>,

    /// Public model identifier (e.g., "deepseek-ai/DeepSeek-R1"); absent or null means the default
    #[serde(default = "default_model", deserialize_with = "deserialize_model")]
    pub model: String,

    /// Enable streaming; absent or null means false
    #[serde(default, deserialize_with = "deserialize_stream")]
    pub stream: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatMessage {
    pub role: String,

    /// Either a string or an array of content parts, forwarded as-is
    pub content: serde_json::Value,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn deserialize_model<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_model))
}

fn deserialize_stream<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_default())
}

/// Streaming chunk (`object: "chat.completion.chunk"`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChunkChoice {
    pub delta: ChunkDelta,
    pub index: u32,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChunkDelta {
    pub content: String,
}

/// Non-streaming response (`object: "chat.completion"`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatCompletion {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<CompletionChoice>,
    pub usage: Usage,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompletionChoice {
    pub message: AssistantMessage,
    pub finish_reason: String,
    pub index: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssistantMessage {
    pub role: String,
    pub content: String,
}

/// Token accounting; the backend reports none so every field stays zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelList {
    pub object: String,
    pub data: Vec<ModelCard>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelCard {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub owned_by: String,
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

impl ChatCompletionChunk {
    /// Wrap one text delta in a fresh chunk
    pub fn delta(model: &str, content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            object: "chat.completion.chunk".to_string(),
            created: now_unix(),
            model: model.to_string(),
            choices: vec![ChunkChoice {
                delta: ChunkDelta {
                    content: content.into(),
                },
                index: 0,
                finish_reason: None,
            }],
        }
    }
}

impl ChatCompletion {
    /// Build a finished assistant reply from the full concatenated text
    pub fn assistant(model: &str, content: String) -> Self {
        Self {
            id: new_id(),
            object: "chat.completion".to_string(),
            created: now_unix(),
            model: model.to_string(),
            choices: vec![CompletionChoice {
                message: AssistantMessage {
                    role: "assistant".to_string(),
                    content,
                },
                finish_reason: "stop".to_string(),
                index: 0,
            }],
            usage: Usage::default(),
        }
    }

    pub fn content(&self) -> &str {
        self.choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or_default()
    }
}

impl ModelList {
    pub fn from_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        let created = now_unix();
        Self {
            object: "list".to_string(),
            data: ids
                .into_iter()
                .map(|id| ModelCard {
                    id: id.to_string(),
                    object: "model".to_string(),
                    created,
                    owned_by: "chutes".to_string(),
                })
                .collect(),
        }
    }
}
