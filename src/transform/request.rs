use chrono::{DateTime, Utc};

use crate::error::{ProxyError, Result};
use crate::models::chutes::{ChutesMessage, ChutesRequest};
use crate::models::openai::ChatRequest;

use super::map_model_name;

/// Timestamp layout of `createdOn`: UTC, millisecond precision, `Z` suffix
pub const CREATED_ON_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Transform an OpenAI chat request into the Chutes envelope
pub fn transform_request(req: &ChatRequest) -> Result<ChutesRequest> {
    transform_request_at(req, Utc::now())
}

/// Transform with an explicit clock reading
///
/// The backend keeps its own conversation history keyed by message id, so only
/// the newest message is sent.
pub fn transform_request_at(req: &ChatRequest, now: DateTime<Utc>) -> Result<ChutesRequest> {
    let last = req
        .messages
        .last()
        .ok_or_else(|| ProxyError::InvalidRequest("No messages provided".into()))?;

    let chute_name = map_model_name(&req.model);

    tracing::debug!(
        model = %req.model,
        chute = chute_name,
        history_len = req.messages.len(),
        "Transforming chat request"
    );

    Ok(ChutesRequest {
        messages: vec![ChutesMessage {
            role: last.role.clone(),
            content: last.content.clone(),
            id: uuid::Uuid::new_v4().to_string(),
            created_on: now.format(CREATED_ON_FORMAT).to_string(),
        }],
        model: req.model.clone(),
        chute_name: chute_name.to_string(),
    })
}
