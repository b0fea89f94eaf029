use crate::config::responses::ResponseCatalog;
use crate::config::StagingDelays;
use crate::models::chat::{ Message, MessageRole };
use std::time::Duration;

/// A message waiting for its identifier. Identifiers are assigned when the
/// message actually lands in the transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMessage {
    pub role: MessageRole,
    pub content: String,
    pub options: Option<Vec<String>>,
    pub is_option_message: bool,
}

impl PendingMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            options: None,
            is_option_message: false,
        }
    }

    pub fn with_options(mut self, options: &[String]) -> Self {
        self.options = Some(options.to_vec());
        self
    }

    pub fn into_message(self, id: i64) -> Message {
        let mut message = Message::new(id, self.role, self.content);
        if let Some(options) = self.options {
            message = message.with_options(options);
        }
        if self.is_option_message {
            message = message.as_option_echo();
        }
        message
    }
}

/// One timed step. `delay` counts from the previous step of the same exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub delay: Duration,
    pub message: PendingMessage,
}

/// What a single user action puts in the transcript: one message right away,
/// then the staged assistant side.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub immediate: PendingMessage,
    pub staged: Vec<Step>,
}

impl Exchange {
    /// `None` for empty input. Whitespace counts as content.
    pub fn free_text(text: &str, catalog: &ResponseCatalog, delays: &StagingDelays) -> Option<Self> {
        if text.is_empty() {
            return None;
        }
        Some(Self {
            immediate: PendingMessage::new(MessageRole::User, text),
            staged: vec![Step {
                delay: delays.user_response,
                message: PendingMessage::new(
                    MessageRole::Assistant,
                    catalog.text_acknowledgement.as_str()
                ).with_options(&catalog.options),
            }],
        })
    }

    pub fn option(choice: &str, catalog: &ResponseCatalog, delays: &StagingDelays) -> Self {
        let mut echo = PendingMessage::new(MessageRole::User, choice);
        echo.is_option_message = true;

        Self {
            immediate: echo,
            staged: vec![
                Step {
                    delay: delays.option_response,
                    message: PendingMessage::new(MessageRole::Assistant, catalog.reply_for(choice)),
                },
                Step {
                    delay: delays.followup_response,
                    message: PendingMessage::new(
                        MessageRole::Assistant,
                        catalog.follow_up.as_str()
                    ).with_options(&catalog.options),
                }
            ],
        }
    }
}
