use std::sync::Arc;

use tauri::State;

use crate::core::favorites::FavoriteRecord;
use crate::runtime::ExtensionRuntime;

use super::shared::ToggleResponse;

#[tauri::command]
pub async fn add_favorite(
    state: State<'_, Arc<ExtensionRuntime>>,
    message_id: i64,
) -> Result<Option<i64>, String> {
    state.add_favorite(message_id).map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn toggle_favorite(
    state: State<'_, Arc<ExtensionRuntime>>,
    message_id: i64,
) -> Result<ToggleResponse, String> {
    state
        .toggle_favorite(message_id)
        .map(ToggleResponse::from)
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn remove_favorite(
    state: State<'_, Arc<ExtensionRuntime>>,
    favorite_id: i64,
) -> Result<bool, String> {
    state.remove_favorite(favorite_id).map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn remove_favorite_by_message(
    state: State<'_, Arc<ExtensionRuntime>>,
    message_id: i64,
) -> Result<bool, String> {
    state
        .remove_favorite_by_message(message_id)
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn set_favorite_note(
    state: State<'_, Arc<ExtensionRuntime>>,
    favorite_id: i64,
    note: String,
) -> Result<bool, String> {
    state
        .set_favorite_note(favorite_id, &note)
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn list_favorites(
    state: State<'_, Arc<ExtensionRuntime>>,
) -> Result<Vec<FavoriteRecord>, String> {
    state.list_favorites().map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn clear_invalid_favorites(
    state: State<'_, Arc<ExtensionRuntime>>,
) -> Result<usize, String> {
    state.clear_invalid().map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn refresh_favorite_indicators(
    state: State<'_, Arc<ExtensionRuntime>>,
) -> Result<(), String> {
    state.refresh_indicators();
    Ok(())
}
