use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use futures::future::BoxFuture;
use tokio::sync::broadcast;

use crate::core::ports::chat::{
    AppendOptions, ChatHostPort, ChatMessage, ChatScope, DynError, HostEvent, SelectionState,
};

const EVENT_CHANNEL_CAPACITY: usize = 64;

struct MemoryChat {
    name: String,
    messages: Vec<ChatMessage>,
}

struct HostState {
    selection: SelectionState,
    chats: HashMap<String, MemoryChat>,
    active: Option<String>,
    append_failures: HashSet<i64>,
}

/// In-memory ChatHostPort: the reference host for tests, demos, and
/// embedders that have no live frontend. Conversations get uuid ids;
/// unforced appends take the next dense position like a real source chat.
pub struct MemoryChatHost {
    state: Mutex<HostState>,
    events: broadcast::Sender<HostEvent>,
}

impl Default for MemoryChatHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryChatHost {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(HostState {
                selection: SelectionState::default(),
                chats: HashMap::new(),
                active: None,
                append_failures: HashSet::new(),
            }),
            events,
        }
    }

    pub fn select_character(&self, character_id: &str) {
        self.lock().selection.character_id = Some(character_id.to_string());
    }

    pub fn select_group(&self, group_id: &str) {
        self.lock().selection.group_id = Some(group_id.to_string());
    }

    pub fn set_generating(&self, generating: bool) {
        self.lock().selection.generating = generating;
    }

    pub fn set_group_generating(&self, generating: bool) {
        self.lock().selection.group_generating = generating;
    }

    pub fn set_saving(&self, saving: bool) {
        self.lock().selection.saving = saving;
    }

    /// Installs a conversation and makes it active.
    pub fn seed_chat(&self, chat_id: &str, name: &str, messages: Vec<ChatMessage>) {
        let mut state = self.lock();
        state.chats.insert(
            chat_id.to_string(),
            MemoryChat {
                name: name.to_string(),
                messages,
            },
        );
        state.active = Some(chat_id.to_string());
    }

    /// Deletes a conversation behind the module's back, like a user
    /// removing the recorded preview chat externally.
    pub fn drop_chat(&self, chat_id: &str) {
        let mut state = self.lock();
        state.chats.remove(chat_id);
        if state.active.as_deref() == Some(chat_id) {
            state.active = None;
        }
    }

    /// Makes the next append of `message_id` fail once.
    pub fn inject_append_failure(&self, message_id: i64) {
        self.lock().append_failures.insert(message_id);
    }

    pub fn chat_name(&self, chat_id: &str) -> Option<String> {
        self.lock().chats.get(chat_id).map(|chat| chat.name.clone())
    }

    pub fn messages_of(&self, chat_id: &str) -> Vec<ChatMessage> {
        self.lock()
            .chats
            .get(chat_id)
            .map(|chat| chat.messages.clone())
            .unwrap_or_default()
    }

    pub fn emit_host_event(&self, event: HostEvent) {
        let _ = self.events.send(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HostState> {
        self.state.lock().expect("memory host lock poisoned")
    }
}

impl ChatHostPort for MemoryChatHost {
    fn current_chat_id(&self) -> Option<String> {
        self.lock().active.clone()
    }

    fn selection(&self) -> SelectionState {
        self.lock().selection.clone()
    }

    fn message_count(&self) -> usize {
        let state = self.lock();
        state
            .active
            .as_ref()
            .and_then(|id| state.chats.get(id))
            .map(|chat| chat.messages.len())
            .unwrap_or(0)
    }

    fn message_exists(&self, message_id: i64) -> bool {
        let state = self.lock();
        state
            .active
            .as_ref()
            .and_then(|id| state.chats.get(id))
            .map(|chat| chat.messages.iter().any(|m| m.id == message_id))
            .unwrap_or(false)
    }

    fn chat_snapshot(&self) -> Vec<ChatMessage> {
        let state = self.lock();
        state
            .active
            .as_ref()
            .and_then(|id| state.chats.get(id))
            .map(|chat| chat.messages.clone())
            .unwrap_or_default()
    }

    fn open_chat<'a>(
        &'a self,
        _scope: &'a ChatScope,
        chat_id: &'a str,
    ) -> BoxFuture<'a, Result<(), DynError>> {
        Box::pin(async move {
            {
                let mut state = self.lock();
                if !state.chats.contains_key(chat_id) {
                    return Err(format!("no conversation {chat_id}").into());
                }
                state.active = Some(chat_id.to_string());
            }
            self.emit_host_event(HostEvent::ChatChanged);
            Ok(())
        })
    }

    fn create_chat<'a>(&'a self) -> BoxFuture<'a, Result<String, DynError>> {
        Box::pin(async move {
            let chat_id = uuid::Uuid::new_v4().to_string();
            {
                let mut state = self.lock();
                state.chats.insert(
                    chat_id.clone(),
                    MemoryChat {
                        name: "new chat".to_string(),
                        messages: Vec::new(),
                    },
                );
                state.active = Some(chat_id.clone());
            }
            self.emit_host_event(HostEvent::ChatChanged);
            Ok(chat_id)
        })
    }

    fn rename_chat<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<(), DynError>> {
        Box::pin(async move {
            let mut state = self.lock();
            let Some(active) = state.active.clone() else {
                return Err("no active conversation to rename".into());
            };
            match state.chats.get_mut(&active) {
                Some(chat) => {
                    chat.name = name.to_string();
                    Ok(())
                }
                None => Err(format!("no conversation {active}").into()),
            }
        })
    }

    fn clear_chat<'a>(&'a self) -> BoxFuture<'a, Result<(), DynError>> {
        Box::pin(async move {
            let mut state = self.lock();
            let Some(active) = state.active.clone() else {
                return Err("no active conversation to clear".into());
            };
            match state.chats.get_mut(&active) {
                Some(chat) => {
                    chat.messages.clear();
                    Ok(())
                }
                None => Err(format!("no conversation {active}").into()),
            }
        })
    }

    fn append_message<'a>(
        &'a self,
        message: &'a ChatMessage,
        options: AppendOptions,
    ) -> BoxFuture<'a, Result<(), DynError>> {
        Box::pin(async move {
            let mut state = self.lock();
            if state.append_failures.remove(&message.id) {
                return Err(format!("injected append failure for message {}", message.id).into());
            }
            let Some(active) = state.active.clone() else {
                return Err("no active conversation to append to".into());
            };
            let Some(chat) = state.chats.get_mut(&active) else {
                return Err(format!("no conversation {active}").into());
            };
            let mut copy = message.clone();
            copy.id = options
                .force_id
                .unwrap_or(chat.messages.len() as i64);
            if copy.sent_at.is_empty() {
                copy.sent_at = chrono::Utc::now().to_rfc3339();
            }
            chat.messages.push(copy);
            Ok(())
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.events.subscribe()
    }
}
