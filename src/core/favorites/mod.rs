use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use crate::core::ports::store::{SettingsStorePort, StoreError};

pub mod records;

pub use records::{ConversationFavorites, FavoriteRecord, MessageRef};

const CHATS_KEY: &str = "chats";
const PREVIEW_CHATS_KEY: &str = "preview_chats";

/// Store-backed favorites state for all conversations, plus the index of
/// preview conversations per character/group key.
///
/// Every operation is a full read-modify-write of the relevant settings
/// key; `write_lock` keeps those cycles from interleaving. Routine writes
/// go through the store's debounced save; recording a preview conversation
/// flushes immediately so the index can never lag behind a conversation
/// that already exists.
pub struct FavoritesRegistry {
    store: Arc<dyn SettingsStorePort>,
    write_lock: Mutex<()>,
}

impl FavoritesRegistry {
    pub fn new(store: Arc<dyn SettingsStorePort>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Adds a favorite for the captured message; returns the assigned id
    /// or None when the message is already favorited.
    pub fn add(&self, chat_id: &str, message: MessageRef) -> Option<i64> {
        let _guard = self.lock();
        let mut favorites = self.conversation(chat_id);
        let assigned = favorites.add(message, chrono::Utc::now().timestamp_millis());
        match assigned {
            Some(id) => {
                log::debug!("favorite {id} added in chat {chat_id}");
                self.save_conversation(chat_id, &favorites);
            }
            None => log::debug!("favorite add skipped in chat {chat_id}: already present"),
        }
        assigned
    }

    pub fn remove_by_id(&self, chat_id: &str, favorite_id: i64) -> bool {
        let _guard = self.lock();
        let mut favorites = self.conversation(chat_id);
        let removed = favorites.remove_by_id(favorite_id);
        if removed {
            self.save_conversation(chat_id, &favorites);
        } else {
            log::debug!("favorite {favorite_id} not found in chat {chat_id}, nothing removed");
        }
        removed
    }

    /// Removes the record referencing `message_id`, returning its favorite
    /// id when one existed.
    pub fn remove_by_message_id(&self, chat_id: &str, message_id: i64) -> Option<i64> {
        let _guard = self.lock();
        let mut favorites = self.conversation(chat_id);
        let removed = favorites.remove_by_message_id(message_id);
        if removed.is_some() {
            self.save_conversation(chat_id, &favorites);
        }
        removed
    }

    pub fn update_note(&self, chat_id: &str, favorite_id: i64, note: &str) -> bool {
        let _guard = self.lock();
        let mut favorites = self.conversation(chat_id);
        let updated = favorites.update_note(favorite_id, note);
        if updated {
            self.save_conversation(chat_id, &favorites);
        } else {
            log::debug!("note update skipped, favorite {favorite_id} not in chat {chat_id}");
        }
        updated
    }

    /// Display projection: newest first, insertion order on timestamp ties.
    pub fn list_sorted(&self, chat_id: &str) -> Vec<FavoriteRecord> {
        self.conversation(chat_id).sorted_for_display()
    }

    pub fn favorited_message_ids(&self, chat_id: &str) -> Vec<i64> {
        self.conversation(chat_id).favorited_message_ids()
    }

    pub fn is_favorited(&self, chat_id: &str, message_id: i64) -> bool {
        self.conversation(chat_id)
            .find_by_message_id(message_id)
            .is_some()
    }

    pub fn has_favorites(&self, chat_id: &str) -> bool {
        !self.conversation(chat_id).items.is_empty()
    }

    /// Drops every record whose message no longer resolves in the live
    /// list; returns how many were removed.
    pub fn clear_invalid(
        &self,
        chat_id: &str,
        live_count: usize,
        live_exists: impl Fn(i64) -> bool,
    ) -> usize {
        let _guard = self.lock();
        let mut favorites = self.conversation(chat_id);
        let removed = favorites.clear_invalid(live_count, live_exists);
        if !removed.is_empty() {
            log::warn!(
                "cleared {} dangling favorite(s) in chat {chat_id}: {removed:?}",
                removed.len()
            );
            self.save_conversation(chat_id, &favorites);
        }
        removed.len()
    }

    /// Full state for one conversation. Corrupt stored state decodes to
    /// the empty default rather than failing the operation.
    pub fn conversation(&self, chat_id: &str) -> ConversationFavorites {
        let Some(stored) = self
            .store
            .get(CHATS_KEY)
            .and_then(|chats| chats.get(chat_id).cloned())
        else {
            return ConversationFavorites::default();
        };
        match serde_json::from_value(stored) {
            Ok(favorites) => favorites,
            Err(err) => {
                log::warn!("stored favorites for chat {chat_id} are unreadable ({err}), resetting");
                ConversationFavorites::default()
            }
        }
    }

    pub fn preview_chat_for(&self, preview_key: &str) -> Option<String> {
        self.store
            .get(PREVIEW_CHATS_KEY)?
            .get(preview_key)?
            .as_str()
            .map(str::to_string)
    }

    /// Records the preview conversation for a key and flushes the store
    /// durably before returning.
    pub fn record_preview_chat(&self, preview_key: &str, chat_id: &str) -> Result<(), StoreError> {
        let _guard = self.lock();
        let mut index = match self.store.get(PREVIEW_CHATS_KEY) {
            Some(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        index.insert(preview_key.to_string(), json!(chat_id));
        self.store.set(PREVIEW_CHATS_KEY, Value::Object(index));
        self.store
            .flush()
            .map_err(|err| StoreError::Flush(err.to_string()))
    }

    fn save_conversation(&self, chat_id: &str, favorites: &ConversationFavorites) {
        let mut chats = match self.store.get(CHATS_KEY) {
            Some(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        chats.insert(chat_id.to_string(), json!(favorites));
        self.store.set(CHATS_KEY, Value::Object(chats));
        self.store.save_debounced();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.write_lock.lock().expect("favorites registry lock poisoned")
    }
}

#[cfg(test)]
mod tests;
