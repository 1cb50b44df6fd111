mod events;
pub mod pacing;
pub mod run;
pub mod state;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::core::favorites::FavoritesRegistry;
use crate::core::ports::{chat::ChatHostPort, emitter::EmitterPort, store::StoreError};

pub use pacing::BuildPacing;
pub use run::BuildReport;
pub use state::BuildPhase;

/// Rebuilds the preview conversation for the current character/group from
/// the favorites of the active conversation.
pub struct PreviewBuilder {
    pub(crate) host: Arc<dyn ChatHostPort>,
    pub(crate) registry: Arc<FavoritesRegistry>,
    pub(crate) emitter: Arc<dyn EmitterPort>,
    pub(crate) pacing: BuildPacing,
    pub(crate) chat_name: String,
    in_flight: AtomicBool,
}

impl PreviewBuilder {
    pub fn new(
        host: Arc<dyn ChatHostPort>,
        registry: Arc<FavoritesRegistry>,
        emitter: Arc<dyn EmitterPort>,
        pacing: BuildPacing,
        chat_name: String,
    ) -> Self {
        Self {
            host,
            registry,
            emitter,
            pacing,
            chat_name,
            in_flight: AtomicBool::new(false),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("select a character or group before building a preview")]
    NoSelection,
    #[error("a reply is being generated, wait for it to finish")]
    GenerationInProgress,
    #[error("the chat is being saved, try again in a moment")]
    SaveInProgress,
    #[error("a preview build is already running")]
    BuildInProgress,
    #[error("no active conversation to read favorites from")]
    NoActiveChat,
    #[error("no favorited messages to preview")]
    NothingToPreview,
    #[error("chat host failed during {op}: {message}")]
    Host { op: &'static str, message: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BuildError {
    /// Precondition rejections are user-correctable and surfaced as
    /// warnings; everything else is an error notice.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            BuildError::NoSelection
                | BuildError::GenerationInProgress
                | BuildError::SaveInProgress
                | BuildError::BuildInProgress
                | BuildError::NoActiveChat
                | BuildError::NothingToPreview
        )
    }
}
