use serde::{ Serialize, Deserialize };
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
        }
    }
}

/// A single transcript entry. Never modified after it is appended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub content: String,
    pub role: MessageRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_option_message: bool,
}

impl Message {
    pub fn new(id: i64, role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            role,
            options: None,
            is_option_message: false,
        }
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn as_option_echo(mut self) -> Self {
        self.is_option_message = true;
        self
    }

    pub fn has_options(&self) -> bool {
        self.options.as_ref().map_or(false, |o| !o.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub title: String,
    pub messages: Vec<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_flag_is_omitted_from_json_when_unset() {
        let plain = Message::new(1, MessageRole::User, "hi");
        let json = serde_json::to_value(&plain).unwrap();
        assert_eq!(json["role"], "user");
        assert!(json.get("is_option_message").is_none());
        assert!(json.get("options").is_none());

        let echo = Message::new(2, MessageRole::User, "Share a quote").as_option_echo();
        let json = serde_json::to_value(&echo).unwrap();
        assert_eq!(json["is_option_message"], true);
    }

    #[test]
    fn empty_option_list_does_not_count_as_options() {
        let msg = Message::new(1, MessageRole::Assistant, "x").with_options(Vec::new());
        assert!(!msg.has_options());
    }
}
