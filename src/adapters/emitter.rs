use serde_json::Value;

use crate::core::ports::emitter::EmitterPort;

/// Fallback emitter for headless embedders: notices land in the log at
/// their level, other channels become debug traces.
pub struct LogEmitter;

impl EmitterPort for LogEmitter {
    fn emit(&self, channel: &str, payload: &Value) {
        if channel == "favorites:notice" {
            let message = payload
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default();
            match payload.get("level").and_then(Value::as_str) {
                Some("error") => log::error!("{message}"),
                Some("warning") => log::warn!("{message}"),
                _ => log::info!("{message}"),
            }
            return;
        }
        log::debug!("event {channel}: {payload}");
    }
}

/// Forwards every channel to the tauri event system, where the webview
/// side of the extension listens.
#[cfg(feature = "desktop")]
pub struct TauriEmitter<R: tauri::Runtime> {
    app: tauri::AppHandle<R>,
}

#[cfg(feature = "desktop")]
impl<R: tauri::Runtime> TauriEmitter<R> {
    pub fn new(app: tauri::AppHandle<R>) -> Self {
        Self { app }
    }
}

#[cfg(feature = "desktop")]
impl<R: tauri::Runtime> EmitterPort for TauriEmitter<R> {
    fn emit(&self, channel: &str, payload: &Value) {
        use tauri::Emitter;
        let _ = self.app.emit(channel, payload);
    }
}
