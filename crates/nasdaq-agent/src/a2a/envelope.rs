//! A2A message envelope

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(alias = "assistant")]
    Agent,
}

/// Message body; only text is understood
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text { text: String },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct A2aMessage {
    pub role: Role,
    pub content: Content,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_message_id: Option<String>,
}

impl A2aMessage {
    /// Text message from a user, with a fresh message id
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Content::Text { text: text.into() },
            conversation_id: None,
            message_id: Some(Uuid::new_v4().to_string()),
            parent_message_id: None,
        }
    }

    pub fn with_conversation_id(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    pub fn text(&self) -> Option<&str> {
        match &self.content {
            Content::Text { text } => Some(text),
            Content::Unsupported => None,
        }
    }

    /// Agent reply to this message, prefixed with `[agent_id] `
    pub fn reply(&self, agent_id: &str, conversation_id: String, text: &str) -> Self {
        Self {
            role: Role::Agent,
            content: Content::Text {
                text: format!("[{agent_id}] {text}"),
            },
            conversation_id: Some(conversation_id),
            message_id: Some(Uuid::new_v4().to_string()),
            parent_message_id: self.message_id.clone(),
        }
    }
}
