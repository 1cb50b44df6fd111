use serde::{Deserialize, Serialize};

use crate::core::ports::chat::ChatMessage;

/// Longest text snapshot stored on a favorite, in characters.
pub const PREVIEW_SNIPPET_CHARS: usize = 200;

/// One bookmark on a host message. `preview` and `sender` are frozen at
/// creation time; only `note` is mutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FavoriteRecord {
    pub id: i64,
    pub message_id: i64,
    pub is_user: bool,
    pub sender: String,
    pub preview: String,
    #[serde(default)]
    pub note: String,
    /// Creation time in epoch milliseconds; display ordering only.
    pub timestamp: i64,
}

/// Snapshot of a live message at the moment it is favorited.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRef {
    pub message_id: i64,
    pub is_user: bool,
    pub sender: String,
    pub preview: String,
}

impl MessageRef {
    pub fn capture(message: &ChatMessage) -> Self {
        Self {
            message_id: message.id,
            is_user: message.is_user,
            sender: message.sender.clone(),
            preview: preview_snippet(&message.text),
        }
    }
}

pub fn preview_snippet(text: &str) -> String {
    let mut snippet: String = text.chars().take(PREVIEW_SNIPPET_CHARS).collect();
    if text.chars().count() > PREVIEW_SNIPPET_CHARS {
        snippet.push_str("...");
    }
    snippet
}

fn default_next_id() -> i64 {
    1
}

/// All favorites of one conversation. Storage order is insertion order;
/// `sorted_for_display` is the read projection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationFavorites {
    #[serde(default)]
    pub items: Vec<FavoriteRecord>,
    /// Next id to assign. Never decreases, so ids are unique for the
    /// lifetime of the conversation even across removals.
    #[serde(default = "default_next_id")]
    pub next_id: i64,
}

impl Default for ConversationFavorites {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_id: 1,
        }
    }
}

impl ConversationFavorites {
    /// Returns the assigned id, or None when the message already has a
    /// record (idempotent by message id).
    pub fn add(&mut self, message: MessageRef, timestamp: i64) -> Option<i64> {
        if self.find_by_message_id(message.message_id).is_some() {
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.items.push(FavoriteRecord {
            id,
            message_id: message.message_id,
            is_user: message.is_user,
            sender: message.sender,
            preview: message.preview,
            note: String::new(),
            timestamp,
        });
        Some(id)
    }

    pub fn remove_by_id(&mut self, favorite_id: i64) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != favorite_id);
        self.items.len() != before
    }

    /// Resolves the record for `message_id` and removes it, returning the
    /// removed favorite id.
    pub fn remove_by_message_id(&mut self, message_id: i64) -> Option<i64> {
        let favorite_id = self.find_by_message_id(message_id)?.id;
        self.remove_by_id(favorite_id);
        Some(favorite_id)
    }

    pub fn update_note(&mut self, favorite_id: i64, note: &str) -> bool {
        match self.items.iter_mut().find(|item| item.id == favorite_id) {
            Some(item) => {
                item.note = note.to_string();
                true
            }
            None => false,
        }
    }

    pub fn find_by_message_id(&self, message_id: i64) -> Option<&FavoriteRecord> {
        self.items.iter().find(|item| item.message_id == message_id)
    }

    pub fn favorited_message_ids(&self) -> Vec<i64> {
        self.items.iter().map(|item| item.message_id).collect()
    }

    /// Newest first; the stable sort keeps insertion order for records
    /// stamped in the same millisecond.
    pub fn sorted_for_display(&self) -> Vec<FavoriteRecord> {
        let mut view = self.items.clone();
        view.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        view
    }

    /// Removes every record whose message is gone from the live list and
    /// returns the removed favorite ids. The invalid set is computed in
    /// full before any removal.
    pub fn clear_invalid(
        &mut self,
        live_count: usize,
        live_exists: impl Fn(i64) -> bool,
    ) -> Vec<i64> {
        let invalid: Vec<i64> = self
            .items
            .iter()
            .filter(|item| {
                item.message_id < 0
                    || item.message_id as usize >= live_count
                    || !live_exists(item.message_id)
            })
            .map(|item| item.id)
            .collect();
        self.items.retain(|item| !invalid.contains(&item.id));
        invalid
    }
}
