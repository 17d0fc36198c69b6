//! Conversation UI components for the chat interface

pub mod commands;
pub mod composer;
pub mod history_sheet;
pub mod manager;
pub mod message_list;

pub use commands::{get_help_text, parse_slash_command, ParsedCommand, SlashCommand};
pub use composer::ConversationComposer;
pub use history_sheet::HistorySheet;
pub use manager::{ConversationAction, ConversationManager, HistoryEntry};
pub use message_list::MessageList;
