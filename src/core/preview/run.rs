use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::core::favorites::ConversationFavorites;
use crate::core::ports::chat::{AppendOptions, ChatMessage, ChatScope, SelectionState};

use super::events::{
    emit_build_done, emit_build_state, notify_error, notify_success, notify_warning,
};
use super::state::BuildPhase;
use super::{BuildError, PreviewBuilder};

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub build_id: String,
    pub preview_key: String,
    /// Id of the preview conversation that was populated.
    pub chat_id: String,
    pub appended: usize,
    /// Appends the host rejected; the rest of the batch still landed.
    pub skipped: usize,
    pub reused_existing: bool,
}

/// Preview key and scope for the current selection. Group selection
/// dominates character selection when both are present.
pub(crate) fn resolve_preview_target(selection: &SelectionState) -> Option<(ChatScope, String)> {
    if let Some(group_id) = &selection.group_id {
        return Some((
            ChatScope::Group(group_id.clone()),
            format!("group_{group_id}"),
        ));
    }
    selection.character_id.as_ref().map(|character_id| {
        (
            ChatScope::Character(character_id.clone()),
            format!("char_{character_id}"),
        )
    })
}

/// Copies of every favorited message that still resolves in the source
/// snapshot, stamped with a back-reference and sorted by original message
/// id ascending so the preview reads in narrative order.
pub(crate) fn collect_preview_messages(
    favorites: &ConversationFavorites,
    snapshot: &[ChatMessage],
) -> Vec<ChatMessage> {
    let by_id: HashMap<i64, &ChatMessage> =
        snapshot.iter().map(|message| (message.id, message)).collect();
    let mut selected: Vec<ChatMessage> = favorites
        .items
        .iter()
        .filter_map(|favorite| by_id.get(&favorite.message_id))
        .map(|message| {
            let mut copy = (*message).clone();
            copy.source_message_id = Some(copy.id);
            copy
        })
        .collect();
    selected.sort_by_key(|message| message.id);
    selected
}

impl PreviewBuilder {
    /// Rebuilds the preview conversation from scratch: precondition
    /// checks, target resolution (reuse or create), destructive reset,
    /// then strictly sequential appends with per-message skip on failure.
    pub async fn build(&self) -> Result<BuildReport, BuildError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            let err = BuildError::BuildInProgress;
            notify_warning(self.emitter.as_ref(), &err.to_string());
            return Err(err);
        }

        let build_id = uuid::Uuid::new_v4().to_string();
        let result = self.build_inner(&build_id).await;
        if let Err(err) = &result {
            emit_build_state(
                self.emitter.as_ref(),
                &build_id,
                BuildPhase::Failed,
                Some(&err.to_string()),
            );
            if err.is_precondition() {
                notify_warning(self.emitter.as_ref(), &err.to_string());
            } else {
                notify_error(self.emitter.as_ref(), &err.to_string());
            }
        }
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn build_inner(&self, build_id: &str) -> Result<BuildReport, BuildError> {
        let selection = self.host.selection();
        let Some((scope, preview_key)) = resolve_preview_target(&selection) else {
            return Err(BuildError::NoSelection);
        };
        if selection.generating || selection.group_generating {
            return Err(BuildError::GenerationInProgress);
        }
        if selection.saving {
            return Err(BuildError::SaveInProgress);
        }

        let source_chat_id = self
            .host
            .current_chat_id()
            .ok_or(BuildError::NoActiveChat)?;
        let favorites = self.registry.conversation(&source_chat_id);
        if favorites.items.is_empty() {
            return Err(BuildError::NothingToPreview);
        }

        // Snapshot before any switch; afterwards the live list belongs to
        // the preview conversation.
        let snapshot = self.host.chat_snapshot();
        let messages = collect_preview_messages(&favorites, &snapshot);
        let unresolved = favorites.items.len() - messages.len();
        if unresolved > 0 {
            log::warn!(
                "preview build {build_id}: {unresolved} favorite(s) no longer resolve in chat {source_chat_id}"
            );
        }

        emit_build_state(
            self.emitter.as_ref(),
            build_id,
            BuildPhase::Resolving,
            Some(&preview_key),
        );

        let mut reused_existing = false;
        let target_chat_id = match self.registry.preview_chat_for(&preview_key) {
            Some(existing) => {
                emit_build_state(
                    self.emitter.as_ref(),
                    build_id,
                    BuildPhase::Switching,
                    Some(&existing),
                );
                match self.host.open_chat(&scope, &existing).await {
                    Ok(()) => {
                        reused_existing = true;
                        existing
                    }
                    Err(err) => {
                        log::warn!(
                            "recorded preview chat {existing} failed to open ({err}), creating a fresh one"
                        );
                        self.create_preview_chat(build_id, &preview_key).await?
                    }
                }
            }
            None => self.create_preview_chat(build_id, &preview_key).await?,
        };
        let settle = if reused_existing {
            self.pacing.switch_settle_ms
        } else {
            self.pacing.create_settle_ms
        };
        settle_for(settle).await;

        emit_build_state(self.emitter.as_ref(), build_id, BuildPhase::Clearing, None);
        self.host
            .clear_chat()
            .await
            .map_err(|err| BuildError::Host {
                op: "clear",
                message: err.to_string(),
            })?;
        settle_for(self.pacing.clear_settle_ms).await;

        emit_build_state(self.emitter.as_ref(), build_id, BuildPhase::Appending, None);
        let mut appended = 0usize;
        let mut skipped = 0usize;
        for message in &messages {
            let options = AppendOptions {
                force_id: Some(message.id),
                scroll: true,
            };
            match self.host.append_message(message, options).await {
                Ok(()) => {
                    appended += 1;
                    settle_for(self.pacing.append_gap_ms).await;
                }
                Err(err) => {
                    skipped += 1;
                    log::warn!(
                        "preview build {build_id}: message {} skipped ({err})",
                        message.id
                    );
                    settle_for(self.pacing.append_failure_pause_ms).await;
                }
            }
        }

        emit_build_state(self.emitter.as_ref(), build_id, BuildPhase::Completed, None);
        emit_build_done(
            self.emitter.as_ref(),
            build_id,
            &preview_key,
            &target_chat_id,
            appended,
            skipped,
            reused_existing,
        );
        notify_success(
            self.emitter.as_ref(),
            &format!("Showing {appended} favorited message(s) in the preview chat"),
        );

        Ok(BuildReport {
            build_id: build_id.to_string(),
            preview_key,
            chat_id: target_chat_id,
            appended,
            skipped,
            reused_existing,
        })
    }

    async fn create_preview_chat(
        &self,
        build_id: &str,
        preview_key: &str,
    ) -> Result<String, BuildError> {
        emit_build_state(self.emitter.as_ref(), build_id, BuildPhase::Creating, None);
        let chat_id = self
            .host
            .create_chat()
            .await
            .map_err(|err| BuildError::Host {
                op: "create",
                message: err.to_string(),
            })?;
        // Cosmetic; the index entry is what reuse depends on.
        if let Err(err) = self.host.rename_chat(&self.chat_name).await {
            log::warn!("preview chat {chat_id} could not be renamed: {err}");
        }
        self.registry.record_preview_chat(preview_key, &chat_id)?;
        Ok(chat_id)
    }
}

async fn settle_for(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
