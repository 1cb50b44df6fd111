use std::sync::Arc;

use tauri::State;

use crate::runtime::ExtensionRuntime;

use super::shared::BuildResponse;

#[tauri::command]
pub async fn build_preview_chat(
    state: State<'_, Arc<ExtensionRuntime>>,
) -> Result<BuildResponse, String> {
    state
        .build_preview()
        .await
        .map(BuildResponse::from)
        .map_err(|e| e.to_string())
}
