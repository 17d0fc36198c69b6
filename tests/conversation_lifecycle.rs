use chrono::Utc;
use openchat::{ConversationId, ConversationRole, ConversationStore, SharedStore, StoreError};

#[test]
fn hello_then_archive_leaves_one_history_entry() {
    let mut store = ConversationStore::new();

    store.append_message("Hello", ConversationRole::User).unwrap();
    store
        .append_message("Hi there", ConversationRole::Assistant)
        .unwrap();
    store.archive_current_conversation();

    let history = store.list_history();
    assert_eq!(history.len(), 1);
    let messages = history[0].messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "Hello");
    assert_eq!(messages[0].role, ConversationRole::User);
    assert_eq!(messages[1].content, "Hi there");
    assert_eq!(messages[1].role, ConversationRole::Assistant);
    assert!(store.current().is_empty());
}

#[test]
fn appended_message_is_stamped_after_the_call_started() {
    let mut store = ConversationStore::new();
    let before = Utc::now();

    let created_at = store
        .append_message("timed", ConversationRole::System)
        .unwrap()
        .created_at;

    assert!(created_at >= before);
    assert!(created_at <= Utc::now());
}

#[test]
fn select_missing_conversation_is_not_found() {
    let mut store = ConversationStore::new();
    store.append_message("draft", ConversationRole::User).unwrap();
    let current = store.current().clone();

    let err = store.select_conversation(ConversationId::new_v4()).unwrap_err();

    assert!(matches!(err, StoreError::NotFound { .. }));
    assert_eq!(store.current(), &current);
    assert!(store.list_history().is_empty());
}

#[test]
fn round_trip_through_history_via_shared_handle() {
    let shared = SharedStore::new(ConversationStore::new());
    let other_handle = shared.clone();

    let archived = shared
        .with(|store| {
            store
                .append_message("first chat", ConversationRole::User)
                .unwrap();
            store.archive_current_conversation()
        })
        .unwrap();

    other_handle
        .with(|store| {
            store
                .append_message("second chat", ConversationRole::User)
                .unwrap();
            store.select_conversation(archived).map(|c| c.id)
        })
        .unwrap()
        .unwrap();

    let store = shared.lock().unwrap();
    assert_eq!(store.current().id, archived);
    assert_eq!(store.list_history().len(), 1);
    assert_eq!(store.list_history()[0].messages()[0].content, "second chat");
    assert!(store.list_history().iter().all(|c| c.id != archived));
}
