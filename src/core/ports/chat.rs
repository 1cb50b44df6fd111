use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// One message as the chat host stores it. `id` is host-assigned; for
/// source conversations it is a dense position, for preview conversations
/// it is whatever was forced at append time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: i64,
    pub sender: String,
    pub is_user: bool,
    #[serde(default)]
    pub is_system: bool,
    pub text: String,
    #[serde(default)]
    pub sent_at: String,
    /// Back-reference to the message this one was copied from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_message_id: Option<i64>,
    /// Host-private fields carried along verbatim.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub extra: Value,
}

/// Point-in-time view of what the host has selected and whether it is busy.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    pub character_id: Option<String>,
    pub group_id: Option<String>,
    pub generating: bool,
    pub group_generating: bool,
    pub saving: bool,
}

/// Which character or group a conversation belongs to when opening it.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatScope {
    Character(String),
    Group(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AppendOptions {
    /// Host-assigned id to force onto the appended message instead of the
    /// next dense position.
    pub force_id: Option<i64>,
    pub scroll: bool,
}

/// Host lifecycle notifications the module re-synchronizes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    ChatChanged,
    MoreMessagesLoaded,
    MessageReceived,
    MessageSent,
    MessageEdited,
}

/// Everything the module needs from the surrounding chat application.
///
/// Snapshot getters are synchronous reads of current host state; the async
/// operations resolve when the host has accepted the request, which is not
/// the same as the UI having settled (see `BuildPacing`).
pub trait ChatHostPort: Send + Sync {
    fn current_chat_id(&self) -> Option<String>;
    fn selection(&self) -> SelectionState;
    fn message_count(&self) -> usize;
    fn message_exists(&self, message_id: i64) -> bool;
    fn chat_snapshot(&self) -> Vec<ChatMessage>;

    /// Switch the active conversation to an existing one under `scope`.
    fn open_chat<'a>(
        &'a self,
        scope: &'a ChatScope,
        chat_id: &'a str,
    ) -> BoxFuture<'a, Result<(), DynError>>;

    /// Create a fresh conversation in the current scope, make it active,
    /// and return its id.
    fn create_chat<'a>(&'a self) -> BoxFuture<'a, Result<String, DynError>>;

    /// Rename the active conversation.
    fn rename_chat<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<(), DynError>>;

    /// Remove every message from the active conversation.
    fn clear_chat<'a>(&'a self) -> BoxFuture<'a, Result<(), DynError>>;

    /// Append one message to the active conversation. Appends must stay
    /// strictly sequential; the host's list mutation is not reentrant.
    fn append_message<'a>(
        &'a self,
        message: &'a ChatMessage,
        options: AppendOptions,
    ) -> BoxFuture<'a, Result<(), DynError>>;

    fn subscribe(&self) -> broadcast::Receiver<HostEvent>;
}
