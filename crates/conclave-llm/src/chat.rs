//! Pieces shared by the chat-style HTTP providers

use serde::{Deserialize, Serialize};

use crate::provider::{LlmError, LlmRequest};

/// One role-tagged message in a chat request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: String) -> Self {
        Self {
            role: role.to_string(),
            content,
        }
    }
}

/// System and user messages for a request; a blank system prompt is left out
pub(crate) fn messages(request: &LlmRequest) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);
    if !request.system.trim().is_empty() {
        messages.push(ChatMessage::new("system", request.system.clone()));
    }
    messages.push(ChatMessage::new("user", request.prompt.clone()));
    messages
}

/// Map a non-success HTTP response to an [`LlmError`]
pub(crate) async fn ensure_success(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        tracing::warn!(provider, "Rate limited");
        return Err(LlmError::RateLimited);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(provider, %status, "Request rejected");
    Err(LlmError::RequestFailed(format!("{} returned {}: {}", provider, status, body.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_skip_blank_system() {
        let only_user = messages(&LlmRequest::with_role("  ", "Is it viable?"));
        assert_eq!(only_user, vec![ChatMessage::new("user", "Is it viable?".to_string())]);

        let both = messages(&LlmRequest::with_role("You are a skeptic.", "Is it viable?"));
        assert_eq!(both.len(), 2);
        assert_eq!(both[0].role, "system");
        assert_eq!(both[0].content, "You are a skeptic.");
    }
}
