//! Chat messages and conversations.
//!
//! This module provides the value types the step tree is built from:
//! - [`Message`]: a single chat turn with a role, content, optional name and weight
//! - [`Conversation`]: an ordered sequence of messages supporting concatenation
//! - [`ScoreMessage`] / [`TerminalCheckMessage`]: messages with a derived, cached
//!   score or terminal decision extracted from their free-text content
//!
//! The compact dict form (`to_dict`, `to_mmd`, `from_mmd`) omits fields that hold
//! their default value and is the persisted form of a conversation.

mod extract;


pub use extract::*;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::ops::Add;

use crate::error::SchemaError;

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// End-user turn.
    User,
    /// System prompt.
    System,
    /// Model output.
    Assistant,
}

impl Role {
    /// Lowercase wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::System => "system",
            Role::Assistant => "assistant",
        }
    }

    /// Capitalized role name used in Markdown headings.
    pub fn title(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::System => "System",
            Role::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "system" => Ok(Role::System),
            "assistant" => Ok(Role::Assistant),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

const DEFAULT_WEIGHT: i64 = 1;

fn default_weight() -> i64 {
    DEFAULT_WEIGHT
}

fn is_default_weight(weight: &i64) -> bool {
    *weight == DEFAULT_WEIGHT
}

/// A message in a chat-oriented LLM conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    /// Who produced the message.
    pub role: Role,
    /// Message text.
    pub content: String,
    /// Optional participant name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Training weight of the message (default 1).
    #[serde(default = "default_weight", skip_serializing_if = "is_default_weight")]
    pub weight: i64,
}

impl Message {
    /// Create a message with the given role and default name/weight.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
            weight: DEFAULT_WEIGHT,
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Set the participant name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the training weight
    pub fn with_weight(mut self, weight: i64) -> Self {
        self.weight = weight;
        self
    }

    /// Compact dict form: only fields that differ from their defaults.
    pub fn to_dict(&self) -> Map<String, Value> {
        let mut dict = Map::new();
        dict.insert("role".to_string(), Value::from(self.role.as_str()));
        dict.insert("content".to_string(), Value::from(self.content.as_str()));
        if let Some(ref name) = self.name {
            dict.insert("name".to_string(), Value::from(name.as_str()));
        }
        if !is_default_weight(&self.weight) {
            dict.insert("weight".to_string(), Value::from(self.weight));
        }
        dict
    }

    /// Wrap this message in a single-message conversation.
    pub fn to_conversation(self) -> Conversation {
        Conversation::new(vec![self])
    }
}

/// An ordered list of messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    /// Messages in conversation order.
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Create a conversation from messages.
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Validate a list of message dicts into a conversation.
    ///
    /// Every entry must be a mapping with a known `role` and a string `content`;
    /// `name` and `weight` are optional and unknown keys are ignored.
    pub fn from_mmd(message_dicts: &[Value]) -> Result<Self, SchemaError> {
        let messages = message_dicts
            .iter()
            .enumerate()
            .map(|(index, dict)| {
                if !dict.is_object() {
                    return Err(SchemaError::NotAMapping { index });
                }
                Message::deserialize(dict)
                    .map_err(|source| SchemaError::InvalidMessage { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { messages })
    }

    /// Convert the conversation to a list of compact message dicts.
    pub fn to_mmd(&self) -> Vec<Value> {
        self.messages
            .iter()
            .map(|message| Value::Object(message.to_dict()))
            .collect()
    }

    /// Render as `**Role:**` blocks separated by blank lines.
    pub fn to_markdown(&self) -> String {
        self.messages
            .iter()
            .map(|message| format!("**{}:**\n{}", message.role.title(), message.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the conversation has no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Iterate over the messages in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }
}

impl From<Vec<Message>> for Conversation {
    fn from(messages: Vec<Message>) -> Self {
        Self::new(messages)
    }
}

impl FromIterator<Message> for Conversation {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Conversation {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

impl Add<Message> for Conversation {
    type Output = Conversation;

    fn add(mut self, other: Message) -> Conversation {
        self.messages.push(other);
        self
    }
}

impl Add<Conversation> for Conversation {
    type Output = Conversation;

    fn add(mut self, other: Conversation) -> Conversation {
        self.messages.extend(other.messages);
        self
    }
}

impl Add<Conversation> for Message {
    type Output = Conversation;

    fn add(self, other: Conversation) -> Conversation {
        let mut messages = Vec::with_capacity(other.messages.len() + 1);
        messages.push(self);
        messages.extend(other.messages);
        Conversation { messages }
    }
}
