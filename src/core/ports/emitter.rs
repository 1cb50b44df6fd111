use serde_json::Value;

/// Outbound channel to the frontend. Channels in use: `favorites:changed`,
/// `favorites:notice`, `preview:state`, `preview:done`.
pub trait EmitterPort: Send + Sync {
    fn emit(&self, channel: &str, payload: &Value);
}
