use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;

use super::{FavoritesRegistry, MessageRef};
use crate::adapters::settings_store::JsonSettingsStore;
use crate::core::ports::store::SettingsStorePort;

fn temp_settings_path() -> PathBuf {
    std::env::temp_dir().join(format!("starmark-favorites-{}.json", uuid::Uuid::new_v4()))
}

fn open_registry(path: &Path) -> FavoritesRegistry {
    FavoritesRegistry::new(Arc::new(JsonSettingsStore::open(path, 25)))
}

fn message_ref(message_id: i64) -> MessageRef {
    MessageRef {
        message_id,
        is_user: false,
        sender: "Seren".to_string(),
        preview: format!("message {message_id}"),
    }
}

#[test]
fn lifecycle_survives_store_reload() {
    let path = temp_settings_path();
    let registry = open_registry(&path);
    let first = registry.add("chat-a", message_ref(3)).expect("first add");
    let second = registry.add("chat-a", message_ref(8)).expect("second add");
    assert!(registry.update_note("chat-a", first, "tower scene"));
    drop(registry);

    let reopened = open_registry(&path);
    let listed = reopened.list_sorted("chat-a");
    assert_eq!(listed.len(), 2);
    let noted = listed
        .iter()
        .find(|item| item.id == first)
        .expect("first favorite survives reload");
    assert_eq!(noted.note, "tower scene");
    assert!(reopened.is_favorited("chat-a", 8));

    // next_id persisted too, so new records keep extending the sequence.
    let third = reopened.add("chat-a", message_ref(11)).expect("third add");
    assert!(third > second);
    drop(reopened);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn preview_chat_record_is_flushed_to_disk() {
    let path = temp_settings_path();
    let registry = open_registry(&path);
    registry
        .record_preview_chat("char_C9", "preview-1")
        .expect("record preview chat");
    assert_eq!(
        registry.preview_chat_for("char_C9"),
        Some("preview-1".to_string())
    );
    assert_eq!(registry.preview_chat_for("group_G1"), None);

    // The index write is durable before record_preview_chat returns.
    let raw = std::fs::read_to_string(&path).expect("settings file exists");
    let parsed: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
    assert_eq!(
        parsed.pointer("/preview_chats/char_C9").and_then(|v| v.as_str()),
        Some("preview-1")
    );
    drop(registry);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn unreadable_conversation_state_resets_to_default() {
    let path = temp_settings_path();
    let store = Arc::new(JsonSettingsStore::open(&path, 25));
    store.set("chats", json!({ "chat-a": [1, 2, 3] }));
    let registry = FavoritesRegistry::new(store.clone());

    assert!(!registry.has_favorites("chat-a"));
    assert!(!registry.is_favorited("chat-a", 1));

    // Writes start over from the default state instead of failing.
    assert_eq!(registry.add("chat-a", message_ref(1)), Some(1));
    drop(registry);
    drop(store);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn clear_invalid_prunes_and_reports_count() {
    let path = temp_settings_path();
    let registry = open_registry(&path);
    for message_id in [0, 4, 9] {
        registry.add("chat-a", message_ref(message_id)).expect("add");
    }

    // Live list has five slots and slot 4 was deleted by the host.
    let removed = registry.clear_invalid("chat-a", 5, |id| id != 4);
    assert_eq!(removed, 2);
    assert_eq!(registry.favorited_message_ids("chat-a"), vec![0]);

    assert_eq!(registry.clear_invalid("chat-a", 5, |id| id != 4), 0);
    drop(registry);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn conversations_are_isolated_by_chat_id() {
    let path = temp_settings_path();
    let registry = open_registry(&path);
    let in_a = registry.add("chat-a", message_ref(2)).expect("add in a");
    let in_b = registry.add("chat-b", message_ref(2)).expect("add in b");
    assert_eq!(in_a, 1);
    assert_eq!(in_b, 1);

    assert!(registry.remove_by_id("chat-a", in_a));
    assert!(!registry.has_favorites("chat-a"));
    assert!(registry.is_favorited("chat-b", 2));
    drop(registry);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn remove_by_message_id_resolves_through_the_store() {
    let path = temp_settings_path();
    let registry = open_registry(&path);
    let id = registry.add("chat-a", message_ref(6)).expect("add");
    assert_eq!(registry.remove_by_message_id("chat-a", 6), Some(id));
    assert_eq!(registry.remove_by_message_id("chat-a", 6), None);
    drop(registry);

    let _ = std::fs::remove_file(&path);
}
