use serde::{Deserialize, Deserializer, Serialize};

/// Role of a message in the transcript.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User role.
    User,

    /// Assistant role.
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// One entry of the chat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who wrote the message.
    pub role: MessageRole,

    /// The message text.
    ///
    /// Stored messages may carry their content as a list of parts (plain
    /// strings or `{"type": "text", "text": ...}` blocks). The text parts are
    /// joined in order and parts without text are skipped.
    #[serde(deserialize_with = "deserialize_content")]
    pub content: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireContent {
    Text(String),
    Parts(Vec<WirePart>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WirePart {
    Text(String),
    Block {
        #[serde(default)]
        text: Option<String>,
    },
}

fn deserialize_content<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match WireContent::deserialize(deserializer)? {
        WireContent::Text(text) => text,
        WireContent::Parts(parts) => parts
            .into_iter()
            .filter_map(|part| match part {
                WirePart::Text(text) => Some(text),
                WirePart::Block { text } => text,
            })
            .collect(),
    })
}

impl Message {
    /// Create a new `Message` with the given role and content.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a new user `Message`.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create a new assistant `Message`.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Returns true if the message was written by the assistant.
    pub fn is_assistant(&self) -> bool {
        self.role == MessageRole::Assistant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn message_serialization() {
        let message = Message::user("hi");
        let json = to_value(&message).unwrap();

        assert_eq!(
            json,
            json!({
                "role": "user",
                "content": "hi"
            })
        );
    }

    #[test]
    fn message_deserialization() {
        let json = json!({
            "role": "assistant",
            "content": "hello"
        });

        let message: Message = serde_json::from_value(json).unwrap();
        assert_eq!(message, Message::assistant("hello"));
        assert!(message.is_assistant());
    }

    #[test]
    fn list_content_is_joined() {
        let json = json!({
            "role": "assistant",
            "content": [
                {"type": "text", "text": "Shor's algorithm "},
                {"type": "image_url", "image_url": {"url": "https://example.com/a.png"}},
                "factors integers."
            ]
        });

        let message: Message = serde_json::from_value(json).unwrap();
        assert_eq!(message, Message::assistant("Shor's algorithm factors integers."));
    }

    #[test]
    fn non_text_content_rejected() {
        let json = json!({
            "role": "user",
            "content": 42
        });

        assert!(serde_json::from_value::<Message>(json).is_err());
    }

    #[test]
    fn unknown_role_rejected() {
        let json = json!({
            "role": "system",
            "content": "be brief"
        });

        assert!(serde_json::from_value::<Message>(json).is_err());
    }
}
