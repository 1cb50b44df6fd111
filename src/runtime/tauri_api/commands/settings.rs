use crate::adapters::config::Settings;

#[tauri::command]
pub async fn get_config() -> Result<Settings, String> {
    Ok(Settings::load_global())
}

/// Applies to conversations created by later launches; a running builder
/// keeps the name it was constructed with.
#[tauri::command]
pub async fn set_preview_chat_name(name: String) -> Result<(), String> {
    let mut settings = Settings::load_global();
    settings.set_preview_chat_name(&name);
    settings.save().map_err(|e| e.to_string())
}
