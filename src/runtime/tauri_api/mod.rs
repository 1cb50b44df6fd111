pub mod commands;

use std::sync::Arc;

use tauri::Manager;

use crate::adapters::config::Settings;
use crate::adapters::emitter::TauriEmitter;
use crate::adapters::host::MemoryChatHost;
use crate::adapters::settings_store::JsonSettingsStore;
use crate::core::ports::chat::ChatHostPort;

use super::ExtensionRuntime;

/// Builds the plugin with the in-memory reference host. Embedders with a
/// live chat frontend should pass their own port to [`init_with_host`].
pub fn init<R: tauri::Runtime>() -> tauri::plugin::TauriPlugin<R> {
    init_with_host(Arc::new(MemoryChatHost::new()))
}

/// Builds the plugin around the given chat host. Setup wires the shared
/// [`ExtensionRuntime`] into managed state and starts the indicator pump
/// on the tauri async runtime.
pub fn init_with_host<R: tauri::Runtime>(
    host: Arc<dyn ChatHostPort>,
) -> tauri::plugin::TauriPlugin<R> {
    tauri::plugin::Builder::new("starmark")
        .setup(move |app, _api| {
            let _ = env_logger::try_init();
            let settings = Settings::load_global();
            let store = Arc::new(JsonSettingsStore::open(
                settings.settings_store_path(),
                settings.save_debounce_ms,
            ));
            let emitter = Arc::new(TauriEmitter::new(app.clone()));
            let runtime = Arc::new(ExtensionRuntime::new(host, store, emitter, &settings));
            app.manage(runtime.clone());
            tauri::async_runtime::spawn(runtime.pump_events());
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Favorites
            commands::favorites::add_favorite,
            commands::favorites::toggle_favorite,
            commands::favorites::remove_favorite,
            commands::favorites::remove_favorite_by_message,
            commands::favorites::set_favorite_note,
            commands::favorites::list_favorites,
            commands::favorites::clear_invalid_favorites,
            commands::favorites::refresh_favorite_indicators,
            // Preview
            commands::preview::build_preview_chat,
            // Settings
            commands::settings::get_config,
            commands::settings::set_preview_chat_name,
        ])
        .build()
}
