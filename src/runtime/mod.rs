#[cfg(feature = "desktop")]
pub mod tauri_api;

use std::sync::Arc;

use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::adapters::config::Settings;
use crate::core::favorites::{FavoriteRecord, FavoritesRegistry, MessageRef};
use crate::core::ports::chat::{ChatHostPort, DynError};
use crate::core::ports::emitter::EmitterPort;
use crate::core::ports::store::SettingsStorePort;
use crate::core::preview::{BuildError, BuildReport, PreviewBuilder};

#[derive(Debug, Clone, PartialEq)]
pub enum FavoriteToggle {
    Added { favorite_id: i64 },
    Removed { favorite_id: i64 },
}

/// Wires the ports together and exposes the operation surface embedders
/// call. All favorite operations act on the host's active conversation,
/// and every successful mutation republishes `favorites:changed` so the
/// frontend can refresh its list and message indicators.
pub struct ExtensionRuntime {
    host: Arc<dyn ChatHostPort>,
    registry: Arc<FavoritesRegistry>,
    emitter: Arc<dyn EmitterPort>,
    builder: PreviewBuilder,
}

impl ExtensionRuntime {
    pub fn new(
        host: Arc<dyn ChatHostPort>,
        store: Arc<dyn SettingsStorePort>,
        emitter: Arc<dyn EmitterPort>,
        settings: &Settings,
    ) -> Self {
        let registry = Arc::new(FavoritesRegistry::new(store));
        let builder = PreviewBuilder::new(
            Arc::clone(&host),
            Arc::clone(&registry),
            Arc::clone(&emitter),
            settings.pacing.clone(),
            settings.preview_chat_name(),
        );
        Self {
            host,
            registry,
            emitter,
            builder,
        }
    }

    pub fn registry(&self) -> &FavoritesRegistry {
        &self.registry
    }

    pub fn active_chat_id(&self) -> Option<String> {
        self.host.current_chat_id()
    }

    /// Favorites the live message, capturing its sender and a text
    /// snippet. Returns None when the message is already favorited.
    pub fn add_favorite(&self, message_id: i64) -> Result<Option<i64>, DynError> {
        let chat_id = self.require_active_chat()?;
        let message = self.capture_message(message_id)?;
        let assigned = self.registry.add(&chat_id, message);
        if assigned.is_some() {
            self.emit_changed(&chat_id);
        }
        Ok(assigned)
    }

    /// Adds when the message has no record, removes it otherwise.
    pub fn toggle_favorite(&self, message_id: i64) -> Result<FavoriteToggle, DynError> {
        let chat_id = self.require_active_chat()?;
        if let Some(favorite_id) = self.registry.remove_by_message_id(&chat_id, message_id) {
            self.emit_changed(&chat_id);
            return Ok(FavoriteToggle::Removed { favorite_id });
        }
        let message = self.capture_message(message_id)?;
        // The lookup above just missed, so this add cannot be a duplicate
        // on the single cooperative timeline.
        let favorite_id = self
            .registry
            .add(&chat_id, message)
            .ok_or_else(|| DynError::from("favorite appeared while toggling"))?;
        self.emit_changed(&chat_id);
        Ok(FavoriteToggle::Added { favorite_id })
    }

    pub fn remove_favorite(&self, favorite_id: i64) -> Result<bool, DynError> {
        let chat_id = self.require_active_chat()?;
        let removed = self.registry.remove_by_id(&chat_id, favorite_id);
        if removed {
            self.emit_changed(&chat_id);
        }
        Ok(removed)
    }

    pub fn remove_favorite_by_message(&self, message_id: i64) -> Result<bool, DynError> {
        let chat_id = self.require_active_chat()?;
        let removed = self.registry.remove_by_message_id(&chat_id, message_id);
        if removed.is_some() {
            self.emit_changed(&chat_id);
        }
        Ok(removed.is_some())
    }

    pub fn set_favorite_note(&self, favorite_id: i64, note: &str) -> Result<bool, DynError> {
        let chat_id = self.require_active_chat()?;
        let updated = self.registry.update_note(&chat_id, favorite_id, note);
        if updated {
            self.emit_changed(&chat_id);
        }
        Ok(updated)
    }

    /// Newest-first favorites of the active conversation.
    pub fn list_favorites(&self) -> Result<Vec<FavoriteRecord>, DynError> {
        let chat_id = self.require_active_chat()?;
        Ok(self.registry.list_sorted(&chat_id))
    }

    /// Drops favorites whose messages no longer exist in the active
    /// conversation; returns how many were removed.
    pub fn clear_invalid(&self) -> Result<usize, DynError> {
        let chat_id = self.require_active_chat()?;
        let live_count = self.host.message_count();
        let removed =
            self.registry
                .clear_invalid(&chat_id, live_count, |id| self.host.message_exists(id));
        if removed > 0 {
            self.emit_changed(&chat_id);
        }
        self.notice(
            "success",
            &format!("Removed {removed} invalid favorite(s)"),
        );
        Ok(removed)
    }

    pub async fn build_preview(&self) -> Result<BuildReport, BuildError> {
        self.builder.build().await
    }

    /// Recomputes the favorited message ids of the active conversation
    /// and republishes them.
    pub fn refresh_indicators(&self) {
        if let Some(chat_id) = self.host.current_chat_id() {
            self.emit_changed(&chat_id);
        }
    }

    /// Follows the host's event stream and re-synchronizes indicator
    /// state on every notification. Emits one refresh up front so a
    /// frontend attaching late still gets current state. Runs until the
    /// host drops its event channel.
    pub async fn pump_events(self: Arc<Self>) {
        let mut events = self.host.subscribe();
        self.refresh_indicators();
        loop {
            match events.recv().await {
                Ok(event) => {
                    log::debug!("host event {event:?}, refreshing favorite indicators");
                    self.refresh_indicators();
                }
                Err(RecvError::Lagged(missed)) => {
                    log::warn!("host event stream lagged, {missed} event(s) dropped");
                    self.refresh_indicators();
                }
                Err(RecvError::Closed) => break,
            }
        }
        log::debug!("host event stream closed, indicator pump exiting");
    }

    /// `pump_events` as a spawned task on the current tokio runtime.
    pub fn start_event_pump(self: &Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(Arc::clone(self).pump_events())
    }

    fn require_active_chat(&self) -> Result<String, DynError> {
        self.host
            .current_chat_id()
            .ok_or_else(|| DynError::from("no active conversation"))
    }

    fn capture_message(&self, message_id: i64) -> Result<MessageRef, DynError> {
        let snapshot = self.host.chat_snapshot();
        let message = snapshot
            .iter()
            .find(|message| message.id == message_id)
            .ok_or_else(|| {
                DynError::from(format!("message {message_id} is not in the live chat"))
            })?;
        Ok(MessageRef::capture(message))
    }

    fn emit_changed(&self, chat_id: &str) {
        let message_ids = self.registry.favorited_message_ids(chat_id);
        self.emitter.emit(
            "favorites:changed",
            &json!({
                "chat_id": chat_id,
                "count": message_ids.len(),
                "message_ids": message_ids,
                "ts": chrono::Utc::now().to_rfc3339(),
            }),
        );
    }

    fn notice(&self, level: &str, message: &str) {
        self.emitter.emit(
            "favorites:notice",
            &json!({
                "level": level,
                "message": message,
                "ts": chrono::Utc::now().to_rfc3339(),
            }),
        );
    }
}

#[cfg(test)]
mod tests;
