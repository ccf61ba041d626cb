use std::time::Duration;

use serde_json::Value;
use tauri::State;

use crate::shared::settings_core::{
    get_config_core, merge_partial_config, save_config_core, ConfigChange,
};
use crate::state::AppState;
use crate::types::AppConfig;

#[tauri::command]
pub(crate) async fn get_config(state: State<'_, AppState>) -> Result<AppConfig, String> {
    Ok(get_config_core(&state.config).await)
}

#[tauri::command]
pub(crate) async fn save_config(config: AppConfig, state: State<'_, AppState>) -> Result<(), String> {
    apply_config(config, &state).await?;
    Ok(())
}

#[tauri::command]
pub(crate) async fn update_config(
    partial_config: Value,
    state: State<'_, AppState>,
) -> Result<AppConfig, String> {
    let current = get_config_core(&state.config).await;
    let merged = merge_partial_config(&current, &partial_config);
    apply_config(merged.clone(), &state).await?;
    Ok(merged)
}

async fn apply_config(config: AppConfig, state: &AppState) -> Result<ConfigChange, String> {
    // Outstanding edits belong to the directory they were loaded from.
    state.autosave.flush().await;
    let directory = config.memo_directory.clone();
    let delay = Duration::from_millis(u64::from(config.auto_save_delay));
    let change = save_config_core(config, &state.config, &state.config_path).await?;

    if change.delay {
        state.autosave.set_delay(delay).await;
    }
    if change.directory {
        log::info!("Memo directory changed to {directory}");
        if let Some(filename) = state.autosave.editing_filename().await {
            state.autosave.deselect(&filename).await;
        }
        state.store.clear_selection().await;
        state.backend.set_root(directory)?;
        state.store.refresh().await?;
    }
    Ok(change)
}
