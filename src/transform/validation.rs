use crate::error::{ProxyError, Result};
use crate::models::openai::ChatRequest;

/// Validate a chat request before transformation
pub fn validate_chat_request(req: &ChatRequest) -> Result<()> {
    if req.messages.is_empty() {
        return Err(ProxyError::InvalidRequest("No messages provided".into()));
    }

    if req.model.trim().is_empty() {
        return Err(ProxyError::InvalidRequest("Model must not be empty".into()));
    }

    // Only the last message travels upstream, so it is the one that must be well formed
    if let Some(last) = req.messages.last()
        && last.role.trim().is_empty()
    {
        return Err(ProxyError::InvalidRequest(
            "Last message has an empty role".into(),
        ));
    }

    Ok(())
}
