use crate::domain::types::ChatMessage;
use serde::{Deserialize, Serialize};

/// Inbound chat body. `messages` is taken as raw JSON so the handler can
/// answer shape violations with the service's own error body instead of an
/// extractor rejection.
#[derive(Debug, Deserialize)]
pub struct ChatPayload {
    #[serde(default)]
    pub messages: Option<serde_json::Value>,
    #[serde(default)]
    pub stream: Option<bool>,
}

impl ChatPayload {
    /// Validate `messages` into typed turns. `None` means the payload is a
    /// client error: absent, not an array, empty, or with malformed turns.
    pub fn turns(&self) -> Option<Vec<ChatMessage>> {
        let items = self.messages.as_ref()?.as_array()?;
        if items.is_empty() {
            return None;
        }
        items
            .iter()
            .map(|item| serde_json::from_value(item.clone()).ok())
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub model: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::MessageRole;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> ChatPayload {
        serde_json::from_value(value).expect("payload shape deserializes")
    }

    #[test]
    fn valid_messages_become_turns() {
        let payload = payload(json!({
            "messages": [
                {"role": "user", "content": "hi"},
                {"role": "assistant", "content": "hello"}
            ]
        }));
        let turns = payload.turns().expect("valid");
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, MessageRole::User);
    }

    #[test]
    fn missing_messages_are_rejected() {
        assert!(payload(json!({})).turns().is_none());
    }

    #[test]
    fn non_array_messages_are_rejected() {
        assert!(payload(json!({"messages": "not-an-array"})).turns().is_none());
    }

    #[test]
    fn empty_messages_are_rejected() {
        assert!(payload(json!({"messages": []})).turns().is_none());
    }

    #[test]
    fn malformed_turns_are_rejected() {
        let bad_role = payload(json!({"messages": [{"role": "robot", "content": "x"}]}));
        assert!(bad_role.turns().is_none());
        let no_content = payload(json!({"messages": [{"role": "user"}]}));
        assert!(no_content.turns().is_none());
    }

    #[test]
    fn details_are_omitted_when_absent() {
        let body = serde_json::to_value(ErrorResponse::new("nope")).expect("serializes");
        assert!(body.get("details").is_none());
    }
}
