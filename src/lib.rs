//! OpenChat: a terminal chat client shell over an in-memory conversation store.

pub mod config;
pub mod conversation;
pub mod events;
pub mod store;
pub mod ui;

pub use config::Config;
pub use conversation::{Conversation, ConversationId, Message, MessageId};
pub use events::ConversationRole;
pub use store::{ConversationStore, SharedStore, StoreError, StoreResult};
