//! Conversation and message data model

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::events::ConversationRole;

/// Format used for default conversation names when none is configured.
pub const DEFAULT_NAME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// One newtype per id kind; ids of different kinds do not mix.
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new_v4() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(raw).map(Self)
            }
        }
    };
}

define_id!(ConversationId);
define_id!(MessageId);

/// A single message in a conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub content: String,
    pub role: ConversationRole,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(content: impl Into<String>, role: ConversationRole) -> Self {
        Self {
            id: MessageId::new_v4(),
            content: content.into(),
            role,
            created_at: Utc::now(),
        }
    }
}

/// A named, ordered collection of messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub id: ConversationId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation named after its creation time.
    pub fn new(name_format: &str) -> Self {
        let created_at = Utc::now();
        Self {
            id: ConversationId::new_v4(),
            name: default_name(created_at, name_format),
            created_at,
            messages: Vec::new(),
        }
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            id: ConversationId::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
            messages: Vec::new(),
        }
    }

    /// Messages in the order they were sent or received.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    // Append-only; no reorder or removal.
    pub(crate) fn push(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }
}

/// Whether `name_format` is a usable chrono format string.
pub fn is_valid_name_format(name_format: &str) -> bool {
    !StrftimeItems::new(name_format).any(|item| matches!(item, Item::Error))
}

/// Human-readable local timestamp used as a conversation's default name.
pub fn default_name(created_at: DateTime<Utc>, name_format: &str) -> String {
    created_at
        .with_timezone(&chrono::Local)
        .format(name_format)
        .to_string()
}
