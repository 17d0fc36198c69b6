//! Conversation store: the single owner of chat state.
//!
//! The store holds exactly one current conversation plus the ordered list of
//! archived ones. The current conversation is never a member of the history.

use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tracing::{debug, warn};

use crate::conversation::{
    is_valid_name_format, Conversation, ConversationId, Message, DEFAULT_NAME_FORMAT,
};
use crate::events::ConversationRole;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Message content must not be empty")]
    Validation,

    #[error("Conversation '{id}' not found in history")]
    NotFound { id: String },

    #[error("Invalid conversation name format '{format}'")]
    InvalidNameFormat { format: String },

    #[error("Conversation store lock was poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// In-memory conversation state for the lifetime of the process
#[derive(Debug, Clone)]
pub struct ConversationStore {
    history: Vec<Conversation>,
    selected: Conversation,
    name_format: String,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self {
            history: Vec::new(),
            selected: Conversation::new(DEFAULT_NAME_FORMAT),
            name_format: DEFAULT_NAME_FORMAT.to_string(),
        }
    }
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose new conversations are named with `name_format`.
    pub fn with_name_format(name_format: impl Into<String>) -> StoreResult<Self> {
        let name_format = name_format.into();
        if !is_valid_name_format(&name_format) {
            return Err(StoreError::InvalidNameFormat {
                format: name_format,
            });
        }

        Ok(Self {
            history: Vec::new(),
            selected: Conversation::new(&name_format),
            name_format,
        })
    }

    /// The conversation currently being composed
    pub fn current(&self) -> &Conversation {
        &self.selected
    }

    /// Append a message to the current conversation
    pub fn append_message(
        &mut self,
        content: impl Into<String>,
        role: ConversationRole,
    ) -> StoreResult<&Message> {
        let content = content.into();
        if content.trim().is_empty() {
            warn!(conversation_id = %self.selected.id, "Rejected empty message");
            return Err(StoreError::Validation);
        }

        let message = Message::new(content, role);
        debug!(
            conversation_id = %self.selected.id,
            message_id = %message.id,
            role = %role,
            "Appended message"
        );
        Ok(self.selected.push(message))
    }

    /// Move the current conversation into history and start a new empty one.
    ///
    /// Archiving an empty conversation is allowed; it still lands in history
    /// under its own id. Returns the id of the archived conversation.
    pub fn archive_current_conversation(&mut self) -> ConversationId {
        let fresh = Conversation::new(&self.name_format);
        let archived = std::mem::replace(&mut self.selected, fresh);
        let archived_id = archived.id;

        debug!(
            conversation_id = %archived_id,
            messages = archived.len(),
            next_conversation_id = %self.selected.id,
            "Archived conversation"
        );
        self.history.push(archived);
        archived_id
    }

    /// Make an archived conversation current, moving it out of history.
    ///
    /// The previously current conversation is archived when it has messages
    /// and dropped when it is empty. An unknown id leaves the store untouched.
    pub fn select_conversation(&mut self, id: ConversationId) -> StoreResult<&Conversation> {
        let Some(index) = self.history.iter().position(|conversation| conversation.id == id) else {
            warn!(conversation_id = %id, "Selected conversation is not in history");
            return Err(StoreError::NotFound { id: id.to_string() });
        };

        let chosen = self.history.remove(index);
        let previous = std::mem::replace(&mut self.selected, chosen);
        if previous.is_empty() {
            debug!(conversation_id = %previous.id, "Dropped empty conversation on selection");
        } else {
            debug!(conversation_id = %previous.id, "Archived conversation on selection");
            self.history.push(previous);
        }

        debug!(conversation_id = %id, "Selected conversation");
        Ok(&self.selected)
    }

    /// Archived conversations in archival order
    pub fn list_history(&self) -> &[Conversation] {
        &self.history
    }

    /// Archived conversations whose name contains `query`, ignoring case.
    pub fn search_history(&self, query: &str) -> Vec<&Conversation> {
        let needle = query.trim().to_lowercase();
        self.history
            .iter()
            .filter(|conversation| {
                needle.is_empty() || conversation.name.to_lowercase().contains(&needle)
            })
            .collect()
    }
}

/// Cloneable handle to the one store shared by every presentation component
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<Mutex<ConversationStore>>,
}

impl SharedStore {
    pub fn new(store: ConversationStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Lock the store for the duration of one operation
    pub fn lock(&self) -> StoreResult<MutexGuard<'_, ConversationStore>> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Run `f` against the store while holding the lock
    pub fn with<T>(&self, f: impl FnOnce(&mut ConversationStore) -> T) -> StoreResult<T> {
        let mut guard = self.lock()?;
        Ok(f(&mut guard))
    }
}
