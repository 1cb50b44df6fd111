use serde_json::Value;

use crate::core::ports::chat::DynError;

/// Key-value settings tree scoped to this module's namespace.
///
/// `set` only updates the in-memory tree; callers pick between
/// `save_debounced` for routine writes and `flush` when the write must be
/// durable before continuing.
pub trait SettingsStorePort: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value);
    fn save_debounced(&self);
    fn flush(&self) -> Result<(), DynError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("settings flush failed: {0}")]
    Flush(String),
}
