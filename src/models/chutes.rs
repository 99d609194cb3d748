use serde::{Deserialize, Serialize};

/// Request envelope accepted by the Chutes chat endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChutesRequest {
    /// Always exactly one message: the last message of the inbound conversation
    pub messages: Vec<ChutesMessage>,

    /// Public model identifier, echoed unchanged
    pub model: String,

    /// Internal deployment name resolved from the model table
    #[serde(rename = "chuteName")]
    pub chute_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChutesMessage {
    pub role: String,
    pub content: serde_json::Value,
    pub id: String,
    /// ISO-8601 UTC with millisecond precision, e.g. `2025-01-30T08:15:42.123Z`
    #[serde(rename = "createdOn")]
    pub created_on: String,
}

/// One `data:` payload of the backend event stream
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChutesStreamChunk {
    #[serde(default)]
    pub choices: Vec<ChutesChoice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChutesChoice {
    #[serde(default)]
    pub delta: Option<ChutesDelta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChutesDelta {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChutesStreamChunk {
    /// Incremental text of the first choice, if it carries any
    pub fn text_delta(&self) -> Option<&str> {
        self.choices
            .first()?
            .delta
            .as_ref()?
            .content
            .as_deref()
            .filter(|text| !text.is_empty())
    }
}
