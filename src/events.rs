use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Terminal events the TUI loop reacts to
#[derive(Debug, Clone)]
pub enum TuiEvent {
    /// Key press event
    Key(crossterm::event::KeyEvent),

    /// Paste event
    Paste(String),

    /// Terminal resize
    Resize(u16, u16),
}

/// Role in conversation
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ConversationRole {
    #[default]
    User,
    Assistant,
    System,
}

impl ConversationRole {
    pub fn display_name(&self) -> &'static str {
        match self {
            ConversationRole::User => "You",
            ConversationRole::Assistant => "Assistant",
            ConversationRole::System => "System",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ConversationRole::User => "👤",
            ConversationRole::Assistant => "🤖",
            ConversationRole::System => "⚙️",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!(ConversationRole::from_str("user").unwrap(), ConversationRole::User);
        assert_eq!(
            ConversationRole::from_str("Assistant").unwrap(),
            ConversationRole::Assistant
        );
        assert_eq!(ConversationRole::from_str("SYSTEM").unwrap(), ConversationRole::System);
        assert!(ConversationRole::from_str("robot").is_err());
    }

    #[test]
    fn role_displays_lowercase_keyword() {
        assert_eq!(ConversationRole::Assistant.to_string(), "assistant");
        let keyword: &'static str = ConversationRole::System.into();
        assert_eq!(keyword, "system");
    }
}
