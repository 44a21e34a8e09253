use serde::{Deserialize, Serialize};

/// Body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's message, exactly as typed.
    pub message: String,

    /// The session the message belongs to.
    pub session_id: String,
}

impl ChatRequest {
    /// Create a new `ChatRequest`.
    pub fn new(message: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: session_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn chat_request_serialization() {
        let request = ChatRequest::new("What is a qubit?", "1b4e28ba-2fa1-4d3b-a3f5-ef19b5a7633b");
        let json = to_value(&request).unwrap();

        assert_eq!(
            json,
            json!({
                "message": "What is a qubit?",
                "session_id": "1b4e28ba-2fa1-4d3b-a3f5-ef19b5a7633b"
            })
        );
    }
}
